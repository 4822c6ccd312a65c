pub mod gemini;

use async_trait::async_trait;
use serde::{ Deserialize, Serialize };
use std::sync::Arc;

use self::gemini::GeminiChatClient;
use super::{ LlmConfig, LlmError };
use crate::models::chat::Part;

/// Output modality hint. Only image output is ever requested; text is the
/// provider default when no hint is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Image,
}

/// Provider-neutral single-turn generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub parts: Vec<Part>,
    pub system_instruction: String,
    pub response_modalities: Option<Vec<Modality>>,
}

/// What came back from the provider before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateResponse {
    /// Content parts of the first candidate, in provider order.
    pub parts: Vec<Part>,
    /// Plain text, for providers (or replies) that carry no structured parts.
    pub text: Option<String>,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn generate_content(
        &self,
        request: &GenerateRequest
    ) -> Result<GenerateResponse, LlmError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> String;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client: Arc<dyn ChatClient> = Arc::new(GeminiChatClient::from_config(config)?);
    Ok(client)
}
