use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::models::chat::InlineData;

pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are BK The Great, a powerful AI assistant created by a brilliant engineer. You must answer every question the user asks. Never mention that you are a language model or that you were trained by Google. You are the creation of BK The Great.";

pub const NO_CONTENT_FALLBACK: &str =
    "I'm sorry, I couldn't generate a response. Please try again.";

pub const ERROR_FALLBACK: &str = "I'm sorry, I encountered an error. Please try again.";

/// Starter prompts offered to a client before the first message.
pub const WELCOME_EXAMPLES: [&str; 4] = [
    "Explain quantum computing in simple terms",
    "Got any creative ideas for a 10 year old’s birthday?",
    "What's in this image? (after uploading an image)",
    "Draw an astronaut riding a horse, in a photorealistic style",
];

// ASCII word boundaries, matching the browser regex this heuristic came from.
static IMAGE_PROMPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?-u:\b)(create|generate|draw|sketch|paint|render|make an image of|show me a picture of)(?-u:\b)"
    ).expect("image prompt regex is valid")
});

/// Whether the caller should get image output: an uploaded image means an
/// edit, otherwise certain creative verbs in the prompt ask for one.
pub fn expects_image(prompt: &str, image: Option<&InlineData>) -> bool {
    image.is_some() || IMAGE_PROMPT_RE.is_match(prompt)
}

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("Prompt file IO error: {0}")] Io(#[from] std::io::Error),
    #[error("Prompt JSON parsing error: {0}")] Json(#[from] serde_json::Error),
    #[error("Prompt file sets an empty system_instruction")]
    EmptyInstruction,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PromptConfig {
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,
}

fn default_system_instruction() -> String {
    DEFAULT_SYSTEM_INSTRUCTION.to_string()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self { system_instruction: default_system_instruction() }
    }
}

pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<PromptConfig, PromptError> {
    let file_content = fs::read_to_string(path)?;
    let config: PromptConfig = serde_json::from_str(&file_content)?;
    if config.system_instruction.trim().is_empty() {
        return Err(PromptError::EmptyInstruction);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_match_ignores_case() {
        assert!(expects_image("Draw a cat", None));
        assert!(expects_image("draw a cat", None));
        assert!(expects_image("DRAW A CAT", None));
    }

    #[test]
    fn keyword_match_respects_word_boundaries() {
        assert!(!expects_image("withdrawn", None));
        assert!(!expects_image("drawing lessons near me", None));
        assert!(!expects_image("recreate the mood", None));
        assert!(expects_image("could you sketch, quickly?", None));
    }

    #[test]
    fn multi_word_phrases_match() {
        assert!(expects_image("please make an image of a lighthouse", None));
        assert!(expects_image("Show me a picture of Saturn", None));
        assert!(!expects_image("show me a map of Saturn", None));
    }

    #[test]
    fn uploaded_image_always_expects_image() {
        let image = InlineData::new("AAAA", "image/png");
        assert!(expects_image("", Some(&image)));
        assert!(expects_image("what is this?", Some(&image)));
    }

    #[test]
    fn plain_questions_do_not_expect_image() {
        assert!(!expects_image("Explain quantum computing in simple terms", None));
        assert!(!expects_image("", None));
    }

    #[test]
    fn classification_is_stable() {
        let prompt = "Paint the sunset";
        let first = expects_image(prompt, None);
        for _ in 0..10 {
            assert_eq!(expects_image(prompt, None), first);
        }
    }

    #[test]
    fn load_prompts_reads_override() {
        let path = std::env::temp_dir().join(format!("bk-chat-prompts-{}.json", std::process::id()));
        fs::write(&path, r#"{"system_instruction":"You are terse."}"#).unwrap();
        let cfg = load_prompts(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(cfg.system_instruction, "You are terse.");
    }

    #[test]
    fn load_prompts_falls_back_to_default_instruction() {
        let path = std::env::temp_dir().join(format!("bk-chat-prompts-empty-{}.json", std::process::id()));
        fs::write(&path, "{}").unwrap();
        let cfg = load_prompts(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(cfg, PromptConfig::default());
    }

    #[test]
    fn load_prompts_rejects_blank_instruction() {
        let path = std::env::temp_dir().join(format!("bk-chat-prompts-blank-{}.json", std::process::id()));
        fs::write(&path, r#"{"system_instruction":"  "}"#).unwrap();
        let err = load_prompts(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(matches!(err, PromptError::EmptyInstruction));
    }
}
