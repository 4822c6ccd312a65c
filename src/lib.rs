pub mod cli;
pub mod config;
pub mod conversation;
pub mod generator;
pub mod llm;
pub mod models;
pub mod server;
pub mod websocket;

use cli::Args;
use config::prompt::{ load_prompts, PromptConfig };
use generator::ResponseGenerator;
use llm::LlmConfig;
use llm::chat::new_client as new_chat_client;
use log::info;
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let llm_config = LlmConfig::from_args(&args)?;

    let prompt_config = match &args.prompts_path {
        Some(path) => {
            let config = load_prompts(path).map_err(|e|
                format!("Failed to load prompts file '{}': {}", path, e)
            )?;
            info!("Loaded system instruction override from {}", path);
            config
        }
        None => PromptConfig::default(),
    };

    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat Model: {}", llm_config.completion_model);
    info!("Chat Base URL: {}", llm_config.base_url);
    info!("Request Timeout: {}s", args.request_timeout_secs);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("Max Message Size: {} bytes", args.max_message_size);
    info!("-------------------------");

    let chat_client = new_chat_client(&llm_config)?;
    let generator = ResponseGenerator::new(chat_client, prompt_config);

    info!("Starting server on: {}", args.server_addr);
    let server = Server::new(
        args.server_addr.clone(),
        generator,
        args.server_api_key.clone(),
        args.max_message_size
    );
    server.run().await?;

    Ok(())
}
