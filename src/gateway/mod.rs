use crate::llm::chat::ChatClient;
use crate::models::chat::{ Message, Sender };
use crate::store::SharedConversationStore;
use log::{ error, warn };
use std::sync::Arc;
use std::sync::atomic::{ AtomicBool, Ordering };
use tokio::sync::watch;

/// Shown when the service answered but carried no usable candidate text.
pub const FALLBACK_TEXT: &str = "No response available.";
/// Shown when the request itself failed (network, status, malformed body).
pub const ERROR_TEXT: &str = "❌ Assistant error: the completion service request failed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejection {
    EmptyMessage,
    NoConversation,
    SendInProgress,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// User and assistant messages were both appended.
    Completed {
        reply: Message,
    },
    /// The conversation was deleted while the request was in flight; the
    /// reply was discarded rather than re-homed.
    ConversationGone,
    /// Refused up front; no messages were appended.
    Rejected(SendRejection),
}

/// Translates one user message into one assistant message. Every failure is
/// absorbed here and rendered as ordinary conversation content, so callers
/// never need a separate error path to keep turn-taking intact.
pub struct AssistantGateway {
    chat_client: Arc<dyn ChatClient>,
    store: SharedConversationStore,
    in_flight: AtomicBool,
    pending_tx: watch::Sender<bool>,
}

impl AssistantGateway {
    pub fn new(chat_client: Arc<dyn ChatClient>, store: SharedConversationStore) -> Self {
        let (pending_tx, _) = watch::channel(false);
        Self {
            chat_client,
            store,
            in_flight: AtomicBool::new(false),
            pending_tx,
        }
    }

    /// Pending-state notification channel for the view layer (typing
    /// indicator, input disabling).
    pub fn subscribe_pending(&self) -> watch::Receiver<bool> {
        self.pending_tx.subscribe()
    }

    fn set_pending(&self, pending: bool) {
        self.in_flight.store(pending, Ordering::SeqCst);
        let _ = self.pending_tx.send(pending);
    }

    /// Sends one user message and appends exactly one assistant reply.
    /// Always resolves: refusals are reported in the outcome, and transport
    /// or shape failures become the reply's content.
    pub async fn send_user_message(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Rejected(SendRejection::EmptyMessage);
        }

        // The gateway serializes sends itself instead of trusting the view
        // layer to disable input while one is pending.
        if self.in_flight.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            return SendOutcome::Rejected(SendRejection::SendInProgress);
        }

        // Capture the conversation id now; the reply is appended to this
        // conversation even if the selection changes before it arrives.
        let conversation_id = {
            let mut store = self.store.lock().await;
            let Some(id) = store.current_id() else {
                self.set_pending(false);
                return SendOutcome::Rejected(SendRejection::NoConversation);
            };
            if let Err(e) = store.add_message_to(id, Sender::User, text) {
                error!("Failed to append user message: {}", e);
                self.set_pending(false);
                return SendOutcome::Rejected(SendRejection::NoConversation);
            }
            id
        };
        let _ = self.pending_tx.send(true);

        // Exactly one attempt: no retry, no timeout beyond the transport's.
        let content = match self.chat_client.complete(text).await {
            Ok(response) => response.text.unwrap_or_else(|| FALLBACK_TEXT.to_string()),
            Err(e) => {
                error!("Completion request failed: {}", e);
                ERROR_TEXT.to_string()
            }
        };

        let outcome = {
            let mut store = self.store.lock().await;
            match store.add_message_to(conversation_id, Sender::Assistant, &content) {
                Ok(reply) => SendOutcome::Completed { reply },
                Err(e) => {
                    warn!(
                        "Dropping assistant reply for conversation {}: {}",
                        conversation_id,
                        e
                    );
                    SendOutcome::ConversationGone
                }
            }
        };

        self.set_pending(false);
        outcome
    }
}
