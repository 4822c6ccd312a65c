use log::{ debug, error };
use std::sync::Arc;

use crate::config::prompt::{ expects_image, PromptConfig, NO_CONTENT_FALLBACK };
use crate::llm::chat::{ ChatClient, GenerateRequest, GenerateResponse, Modality };
use crate::models::chat::{ InlineData, Part };

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("Prompt and image cannot both be empty.")]
    EmptyRequest,
    #[error("Failed to get response from the AI model.")]
    GenerationFailed,
}

/// Turns one user turn into model output parts. Holds no conversation state.
#[derive(Clone)]
pub struct ResponseGenerator {
    chat_client: Arc<dyn ChatClient>,
    prompt_config: PromptConfig,
}

impl ResponseGenerator {
    pub fn new(chat_client: Arc<dyn ChatClient>, prompt_config: PromptConfig) -> Self {
        Self { chat_client, prompt_config }
    }

    pub fn build_request(
        &self,
        prompt: &str,
        image: Option<&InlineData>
    ) -> Result<GenerateRequest, GenerateError> {
        // Request order: image first, then the instruction about it.
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = image {
            parts.push(Part::InlineData(image.clone()));
        }
        if !prompt.is_empty() {
            parts.push(Part::text(prompt));
        }
        if parts.is_empty() {
            return Err(GenerateError::EmptyRequest);
        }

        let response_modalities = if expects_image(prompt, image) {
            Some(vec![Modality::Image])
        } else {
            None
        };

        Ok(GenerateRequest {
            parts,
            system_instruction: self.prompt_config.system_instruction.clone(),
            response_modalities,
        })
    }

    pub async fn generate(
        &self,
        prompt: &str,
        image: Option<&InlineData>
    ) -> Result<Vec<Part>, GenerateError> {
        let request = self.build_request(prompt, image)?;
        debug!(
            "Generating with model={} base_url={} parts={} expects_image={}",
            self.chat_client.get_model(),
            self.chat_client.get_base_url(),
            request.parts.len(),
            request.response_modalities.is_some()
        );

        match self.chat_client.generate_content(&request).await {
            Ok(response) => Ok(normalize_response(response)),
            Err(e) => {
                error!("Error generating content: {}", e);
                Err(GenerateError::GenerationFailed)
            }
        }
    }
}

pub fn normalize_response(response: GenerateResponse) -> Vec<Part> {
    if !response.parts.is_empty() {
        return response.parts;
    }
    match response.text {
        Some(text) if !text.is_empty() => vec![Part::Text(text)],
        _ => vec![Part::text(NO_CONTENT_FALLBACK)],
    }
}
