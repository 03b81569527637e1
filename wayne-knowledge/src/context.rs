use std::collections::VecDeque;

use wayne_core::{ConversationMessage, MessageRole};

/// Bounded, ordered log of recent messages. Oldest messages are evicted
/// first once the bound is reached.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    messages: VecDeque<ConversationMessage>,
    bound: usize,
    /// Identifier fixed by the first message ever appended.
    conversation_id: Option<String>,
}

impl ConversationContext {
    /// A bound of zero is raised to one.
    pub fn new(bound: usize) -> Self {
        let bound = bound.max(1);
        Self {
            messages: VecDeque::with_capacity(bound),
            bound,
            conversation_id: None,
        }
    }

    pub fn append(&mut self, message: ConversationMessage) {
        if self.conversation_id.is_none() {
            self.conversation_id = Some(format!("conv-{}", message.timestamp.timestamp_millis()));
        }
        if self.messages.len() == self.bound {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// Messages oldest to newest.
    pub fn window(&self) -> Vec<ConversationMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ConversationMessage> {
        self.messages.iter()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.conversation_id = None;
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn bound(&self) -> usize {
        self.bound
    }

    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == MessageRole::User)
            .map(|message| message.text.as_str())
    }

    /// `conv-<millis>` of the first message, stable until `clear`.
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(10)
    }
}
