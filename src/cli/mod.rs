use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// API Key for the Gemini API. Required; the server refuses to start without it.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Model name for content generation (e.g., gemini-2.5-flash-image)
    #[arg(long, env = "CHAT_MODEL", default_value = "gemini-2.5-flash-image")]
    pub chat_model: String,

    /// Base URL for the Gemini REST API
    #[arg(
        long,
        env = "CHAT_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com/v1beta"
    )]
    pub chat_base_url: String,

    /// Total timeout in seconds for a single generation request.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "120")]
    pub request_timeout_secs: u64,

    /// Connect timeout in seconds for the Gemini API.
    #[arg(long, env = "CONNECT_TIMEOUT_SECS", default_value = "10")]
    pub connect_timeout_secs: u64,

    // --- General App Args ---
    /// Optional path to a JSON file overriding the assistant's system instruction.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    // --- Server Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Optional API Key required for clients to connect to the WebSocket server. If set, clients must provide this key.
    #[arg(long, env = "SERVER_API_KEY")]
    pub server_api_key: Option<String>,

    /// Largest accepted WebSocket frame in bytes (images travel inline as base64).
    #[arg(long, env = "MAX_MESSAGE_SIZE", default_value = "10485760")]
    pub max_message_size: usize,
}
