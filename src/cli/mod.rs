use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// API Key for the chat completion provider (Google generative language API)
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gemini-2.5-flash)
    #[arg(long, env = "CHAT_MODEL")] // No default, let the client pick its default
    pub chat_model: Option<String>,

    /// Base URL for the completion endpoint
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let the client pick its default
    pub chat_base_url: Option<String>,

    /// Title of the conversation auto-started on launch.
    #[arg(long, env = "INITIAL_CONVERSATION_TITLE", default_value = "Security Analysis Chat")]
    pub initial_conversation_title: String,
}
