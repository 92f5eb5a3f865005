//! In-memory gateway for exercising the stages without a model server.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::llm::{ChatGateway, ChatMessage, GatewayError};

/// Replays canned responses in order and records every request
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl ScriptedGateway {
    /// `Err` entries surface as a 503 from the server
    pub fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// (model, messages) for every request made so far
    pub fn calls(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ChatGateway for ScriptedGateway {
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), messages.to_vec()));
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(body)) => Err(GatewayError::Status { status: 503, body }),
            None => Err(GatewayError::MissingContent),
        }
    }
}
