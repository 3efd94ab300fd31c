use std::collections::VecDeque;

use tokio::sync::Mutex;

use crate::api::{Prompt, API};
use crate::error::ProviderError;

/// Replays queued replies in order and records every prompt it receives.
#[derive(Default)]
pub struct ScriptedPrompt {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, text: impl Into<String>) -> Self {
        self.replies.get_mut().push_back(Ok(text.into()));
        self
    }

    pub fn fail(mut self, err: ProviderError) -> Self {
        self.replies.get_mut().push_back(Err(err));
        self
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl Prompt for ScriptedPrompt {
    fn api(&self) -> Option<API> {
        None
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().await.push(prompt.to_string());

        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or(Err(ProviderError::MissingField("scripted reply")))
            .map(|text| text.trim().to_string())
    }
}
