use std::sync::{Arc, Mutex};

use tracing::{debug, warn};
use wayne_core::ConversationMessage;

use crate::context::ConversationContext;
use crate::errors::KnowledgeError;
use crate::models::{CoreRequest, CoreResponse, ResponseContent};

use super::WayneEngine;

/// One chat session: an engine handle plus its bounded history.
#[derive(Debug)]
pub struct Conversation {
    engine: Arc<WayneEngine>,
    context: Mutex<ConversationContext>,
}

impl Conversation {
    pub fn new(engine: Arc<WayneEngine>, max_messages: usize) -> Self {
        Self {
            engine,
            context: Mutex::new(ConversationContext::new(max_messages)),
        }
    }

    pub fn engine(&self) -> &WayneEngine {
        &self.engine
    }

    /// Answer `text` and record the exchange. Failures come back as the
    /// error template; blank input is answered but not recorded.
    pub fn ask(&self, text: &str) -> CoreResponse {
        self.ask_with(CoreRequest::new(text))
    }

    /// Like [`Conversation::ask`], keeping the hint and secondary flag of
    /// `request`. Its `context` is replaced by the session history.
    pub fn ask_with(&self, mut request: CoreRequest) -> CoreResponse {
        let mut context = self.context.lock().unwrap_or_else(|e| e.into_inner());
        request.context = context.window();

        let response = match self.engine.process(&request) {
            Ok(response) => response,
            // Rejected input never enters the history window.
            Err(KnowledgeError::InvalidQuery(reason)) => {
                debug!("Rejected query: {}", reason);
                return self.error_response();
            }
            Err(err) => {
                warn!("Failed to answer query: {}", err);
                self.error_response()
            }
        };

        context.append(ConversationMessage::user(request.text));
        let reply = ConversationMessage::assistant(response.content.clone());
        let reply = match &response.attachment {
            ResponseContent::WithCode(block) => reply.with_code(block.clone()),
            ResponseContent::WithImage(image) => reply.with_image_ref(image.url.clone()),
            ResponseContent::TextOnly => reply,
        };
        context.append(reply);

        response
    }

    fn error_response(&self) -> CoreResponse {
        let fallback = self.engine.assembler().error();
        CoreResponse {
            content: fallback.content,
            attachment: fallback.attachment,
            matched_entries: Vec::new(),
            route: None,
        }
    }

    /// Messages oldest to newest.
    pub fn history(&self) -> Vec<ConversationMessage> {
        let context = self.context.lock().unwrap_or_else(|e| e.into_inner());
        context.window()
    }

    pub fn clear(&self) {
        let mut context = self.context.lock().unwrap_or_else(|e| e.into_inner());
        context.clear();
    }

    pub fn conversation_id(&self) -> Option<String> {
        let context = self.context.lock().unwrap_or_else(|e| e.into_inner());
        context.conversation_id().map(str::to_string)
    }
}
