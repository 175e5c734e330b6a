pub mod gemini;

use async_trait::async_trait;
use std::error::Error as StdError;
use std::sync::Arc;
use super::LlmConfig;
use self::gemini::GeminiChatClient;

/// Outcome of a completion call. `text` is `None` when the provider answered
/// with a well-formed body that carried no usable candidate text; transport
/// and status failures surface as `Err` from `complete` instead.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub text: Option<String>,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn ChatClient>, Box<dyn StdError + Send + Sync>> {
    let client = GeminiChatClient::from_config(config)?;
    Ok(Arc::new(client))
}
