use async_trait::async_trait;
use log::{ debug, info };
use serde::{ Deserialize, Serialize };

use super::{ ChatClient, GenerateRequest, GenerateResponse, Modality };
use crate::llm::{ LlmConfig, LlmError };
use crate::models::chat::{ InlineData, Part };

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent>,
    system_instruction: GeminiSystemInstruction<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig<'a>>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct GeminiSystemInstruction<'a> {
    parts: [GeminiTextPart<'a>; 1],
}

#[derive(Serialize)]
struct GeminiTextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig<'a> {
    response_modalities: &'a [Modality],
}

#[derive(Deserialize, Default)]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    #[serde(default)]
    content: Option<GoogleContent>,
}

#[derive(Deserialize)]
struct GoogleContent {
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GooglePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
    #[serde(default)]
    thought: bool,
}

fn build_payload(request: &GenerateRequest) -> GeminiRequest<'_> {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user",
            parts: request.parts.clone(),
        }],
        system_instruction: GeminiSystemInstruction {
            parts: [GeminiTextPart { text: &request.system_instruction }],
        },
        generation_config: request.response_modalities
            .as_deref()
            .map(|modalities| GeminiGenerationConfig { response_modalities: modalities }),
    }
}

fn parse_response(body: &str) -> Result<GenerateResponse, LlmError> {
    let parsed: GoogleResponse = serde_json
        ::from_str(body)
        .map_err(|e| LlmError::ApiParse(e.to_string()))?;

    let raw_parts = parsed.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    // Thought summaries and function calls are not user-facing content.
    let parts: Vec<Part> = raw_parts
        .into_iter()
        .filter(|p| !p.thought)
        .filter_map(|p| {
            match (p.text, p.inline_data) {
                (_, Some(data)) => Some(Part::InlineData(data)),
                (Some(text), None) => Some(Part::Text(text)),
                (None, None) => None,
            }
        })
        .collect();

    let text: String = parts
        .iter()
        .filter_map(Part::as_text)
        .collect();

    Ok(GenerateResponse {
        text: if text.is_empty() { None } else { Some(text) },
        parts,
    })
}

pub struct GeminiChatClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiChatClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        request_timeout: std::time::Duration,
        connect_timeout: std::time::Duration
    ) -> Result<Self, LlmError> {
        let http = reqwest::Client
            ::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| LlmError::HttpClientBuild(e.to_string()))?;

        Ok(Self { http, api_key, model, base_url })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(
            config.api_key.clone(),
            config.completion_model.clone(),
            config.base_url.clone(),
            config.request_timeout,
            config.connect_timeout
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url.trim_end_matches('/'), self.model)
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    async fn generate_content(
        &self,
        request: &GenerateRequest
    ) -> Result<GenerateResponse, LlmError> {
        let url = self.endpoint();
        info!(
            "GeminiChatClient::generate_content() → model={} parts={} modalities={:?}",
            self.model,
            request.parts.len(),
            request.response_modalities
        );

        let resp = self.http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_payload(request))
            .send().await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| LlmError::ApiRequest(e.to_string()))?;
        if !status.is_success() {
            return Err(LlmError::ApiResponse { status: status.as_u16(), body });
        }
        debug!("Gemini response body: {} bytes", body.len());

        parse_response(&body)
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> String {
        self.base_url.clone()
    }
}
