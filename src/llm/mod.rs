pub mod chat;

use crate::cli::Args;
use std::time::Duration;

pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("missing API key: {var} is not set")]
    MissingApiKey {
        var: String,
    },

    #[error("config parse failed: {0}")]
    ConfigParse(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    #[error("API request failed: {0}")]
    ApiRequest(String),

    #[error("API response error: status {status}")]
    ApiResponse {
        status: u16,
        body: String,
    },

    #[error("API response parse failed: {0}")]
    ApiParse(String),
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub completion_model: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl LlmConfig {
    /// Builds the chat client configuration. A blank credential is fatal.
    pub fn from_args(args: &Args) -> Result<Self, LlmError> {
        let api_key = args.api_key.trim();
        if api_key.is_empty() {
            return Err(LlmError::MissingApiKey { var: "API_KEY".to_string() });
        }

        let completion_model = match args.chat_model.trim() {
            "" => DEFAULT_CHAT_MODEL.to_string(),
            model => model.to_string(),
        };

        let base_url = args.chat_base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(
                LlmError::ConfigParse(format!("CHAT_BASE_URL must be an http(s) URL, got '{}'", base_url))
            );
        }

        Ok(Self {
            api_key: api_key.to_string(),
            completion_model,
            base_url,
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            connect_timeout: Duration::from_secs(args.connect_timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    /// Every flag is passed explicitly so exported env vars cannot leak in.
    fn args(overrides: &[(&str, &str)]) -> Args {
        let mut flags = vec![
            ("--api-key", "secret"),
            ("--chat-model", DEFAULT_CHAT_MODEL),
            ("--chat-base-url", DEFAULT_GEMINI_BASE_URL),
            ("--request-timeout-secs", "120"),
            ("--connect-timeout-secs", "10"),
            ("--server-addr", "127.0.0.1:4000"),
            ("--max-message-size", "1024")
        ];
        for &(flag, value) in overrides {
            match flags.iter_mut().find(|entry| entry.0 == flag) {
                Some(entry) => entry.1 = value,
                None => flags.push((flag, value)),
            }
        }

        let mut argv = vec!["bk-chat"];
        for (flag, value) in flags {
            argv.push(flag);
            argv.push(value);
        }
        Args::parse_from(argv)
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let err = LlmConfig::from_args(&args(&[("--api-key", "   ")])).unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey { .. }));
    }

    #[test]
    fn config_follows_args() {
        let cfg = LlmConfig::from_args(
            &args(&[("--chat-base-url", "https://example.test/v1beta/")])
        ).unwrap();
        assert_eq!(cfg.api_key, "secret");
        assert_eq!(cfg.completion_model, DEFAULT_CHAT_MODEL);
        assert_eq!(cfg.base_url, "https://example.test/v1beta");
        assert_eq!(cfg.request_timeout, Duration::from_secs(120));
        assert_eq!(cfg.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn blank_model_falls_back_to_default() {
        let cfg = LlmConfig::from_args(&args(&[("--chat-model", " ")])).unwrap();
        assert_eq!(cfg.completion_model, DEFAULT_CHAT_MODEL);
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let err = LlmConfig::from_args(
            &args(&[("--chat-base-url", "ftp://nope")])
        ).unwrap_err();
        assert!(err.to_string().contains("CHAT_BASE_URL"));
    }
}
