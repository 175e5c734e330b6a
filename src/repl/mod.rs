use crate::gateway::{ AssistantGateway, SendOutcome, SendRejection };
use crate::store::{ SharedConversationStore, StoreError };
use log::debug;
use std::error::Error;
use std::sync::Arc;
use tokio::io::{ self, AsyncBufReadExt, BufReader };
use uuid::Uuid;

const HELP: &str = "\
Commands:
  /new [title]    start a new conversation
  /list           list conversations
  /switch <id>    select a conversation
  /delete <id>    delete a conversation
  /export <id>    export a conversation
  /quit           exit
Anything else is sent to the assistant.";

/// Console stand-in for the web presentation layer: subscribes to the store,
/// renders messages, and forwards user intent into the core.
pub async fn run_repl(
    gateway: Arc<AssistantGateway>,
    store: SharedConversationStore
) -> Result<(), Box<dyn Error + Send + Sync>> {
    {
        let store = store.lock().await;
        let mut events = store.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                debug!("Store event: {:?}", event);
            }
        });
    }

    {
        let mut pending = gateway.subscribe_pending();
        tokio::spawn(async move {
            while pending.changed().await.is_ok() {
                if *pending.borrow() {
                    println!("assistant is typing...");
                }
            }
        });
    }

    println!("Welcome to the SHERPA assistant. Ask about vulnerability");
    println!("prioritization, remediation strategies, or threat analysis.");
    println!("{}", HELP);

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('/') {
            let mut parts = rest.splitn(2, ' ');
            let command = parts.next().unwrap_or("");
            let argument = parts.next().map(str::trim);
            match command {
                "quit" | "exit" => break,
                "help" => println!("{}", HELP),
                "new" => {
                    store.lock().await.start_new_conversation(argument);
                    let store = store.lock().await;
                    let current = store.current().expect("conversation was just started");
                    println!("Started '{}' ({})", current.title, current.id);
                }
                "list" => {
                    let store = store.lock().await;
                    if store.conversations().is_empty() {
                        println!("No conversations yet. Use /new to start one.");
                    }
                    for conv in store.conversations() {
                        let marker = if store.current_id() == Some(conv.id) { "*" } else { " " };
                        println!(
                            "{} {}  {}  ({} messages, created {})",
                            marker,
                            conv.id,
                            conv.title,
                            conv.messages.len(),
                            conv.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
                "switch" => match parse_id(argument) {
                    Ok(id) => {
                        if let Err(e) = store.lock().await.set_current(id) {
                            println!("{}", e);
                        }
                    }
                    Err(e) => println!("{}", e),
                },
                "delete" => match parse_id(argument) {
                    Ok(id) => {
                        if let Err(e) = store.lock().await.delete_conversation(id) {
                            println!("{}", e);
                        }
                    }
                    Err(e) => println!("{}", e),
                },
                "export" => match parse_id(argument) {
                    Ok(id) => match store.lock().await.export_conversation(id) {
                        Ok(exported) => println!("{}", exported),
                        Err(StoreError::Unsupported(op)) => {
                            println!("'{}' is not available yet.", op);
                        }
                        Err(e) => println!("{}", e),
                    },
                    Err(e) => println!("{}", e),
                },
                other => println!("Unknown command '/{}'. Try /help.", other),
            }
            continue;
        }

        match gateway.send_user_message(line).await {
            SendOutcome::Completed { reply } => println!("assistant> {}", reply.content),
            SendOutcome::ConversationGone => {
                println!("(the conversation was deleted before the reply arrived)");
            }
            SendOutcome::Rejected(SendRejection::EmptyMessage) => {}
            SendOutcome::Rejected(SendRejection::NoConversation) => {
                println!("No conversation selected. Use /new to start one.");
            }
            SendOutcome::Rejected(SendRejection::SendInProgress) => {
                println!("Still waiting on the previous reply.");
            }
        }
    }

    Ok(())
}

fn parse_id(argument: Option<&str>) -> Result<Uuid, String> {
    let raw = argument.filter(|a| !a.is_empty()).ok_or("A conversation id is required.")?;
    Uuid::parse_str(raw).map_err(|_| format!("'{}' is not a valid conversation id.", raw))
}
