pub mod cli;
pub mod gateway;
pub mod llm;
pub mod models;
pub mod repl;
pub mod store;

use cli::Args;
use gateway::AssistantGateway;
use llm::LlmConfig;
use llm::chat::new_client;
use log::info;
use std::error::Error;
use std::sync::Arc;
use store::ConversationStore;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("client default"));
    info!("Chat Base URL: {}", args.chat_base_url.as_deref().unwrap_or("client default"));
    info!("Initial Conversation Title: {}", args.initial_conversation_title);
    info!("-------------------------");

    let chat_config = LlmConfig {
        api_key: Some(args.chat_api_key.clone()).filter(|k| !k.is_empty()),
        completion_model: args.chat_model.clone(),
        base_url: args.chat_base_url.clone(),
    };
    let chat_client = new_client(&chat_config)?;
    info!(
        "Chat client configured: Model={}, BaseURL={:?}",
        chat_client.get_model(),
        chat_client.get_base_url()
    );

    let store = ConversationStore::new().into_shared();
    // First-use guarantee: a conversation exists before the first send.
    store.lock().await.start_new_conversation(Some(&args.initial_conversation_title));

    let gateway = Arc::new(AssistantGateway::new(chat_client, store.clone()));
    repl::run_repl(gateway, store).await
}
