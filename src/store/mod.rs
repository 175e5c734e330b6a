use crate::models::chat::{ Conversation, Message, Sender };
use log::info;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{ broadcast, Mutex };
use uuid::Uuid;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Shared handle passed into the gateway and the view layer. The store is
/// injected explicitly rather than living in a process-wide singleton.
pub type SharedConversationStore = Arc<Mutex<ConversationStore>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    ConversationSetChanged,
    CurrentConversationChanged,
    MessageAppended {
        conversation_id: Uuid,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no conversation is currently selected")]
    NoCurrentConversation,
    #[error("unknown conversation: {0}")]
    UnknownConversation(Uuid),
    #[error("operation not yet available: {0}")]
    Unsupported(&'static str),
}

/// Single source of truth for all conversations and the current selection.
/// Mutations are append/remove only; messages are never reordered or edited.
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    current: Option<Uuid>,
    events: broadcast::Sender<StoreEvent>,
}

impl ConversationStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            conversations: Vec::new(),
            current: None,
            events,
        }
    }

    pub fn into_shared(self) -> SharedConversationStore {
        Arc::new(Mutex::new(self))
    }

    /// Subscribes to change notifications. Subscribers that lag or drop
    /// their receiver never block a mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        let _ = self.events.send(event);
    }

    /// Creates a conversation with a fresh id and empty message list, makes
    /// it current, and appends it to the set. Title defaults to "Chat {n}".
    pub fn start_new_conversation(&mut self, title: Option<&str>) -> Uuid {
        let title = match title {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => format!("Chat {}", self.conversations.len() + 1),
        };
        let conversation = Conversation::new(title);
        let id = conversation.id;
        info!("Started conversation '{}' ({})", conversation.title, id);
        self.conversations.push(conversation);
        self.current = Some(id);
        self.emit(StoreEvent::ConversationSetChanged);
        self.emit(StoreEvent::CurrentConversationChanged);
        id
    }

    /// Appends a message to the current conversation. The store never
    /// auto-creates a conversation; a missing selection is a caller bug
    /// surfaced as `NoCurrentConversation`.
    pub fn add_message(
        &mut self,
        sender: Sender,
        content: &str
    ) -> Result<Message, StoreError> {
        let id = self.current.ok_or(StoreError::NoCurrentConversation)?;
        self.add_message_to(id, sender, content)
    }

    /// Appends a message to a specific conversation by id. The gateway uses
    /// this with the id it captured at send time, so a reply can never land
    /// in a conversation the user switched to afterwards.
    pub fn add_message_to(
        &mut self,
        conversation_id: Uuid,
        sender: Sender,
        content: &str
    ) -> Result<Message, StoreError> {
        let conversation = self.conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
            .ok_or(StoreError::UnknownConversation(conversation_id))?;
        let message = conversation.append(sender, content).clone();
        self.emit(StoreEvent::MessageAppended { conversation_id });
        Ok(message)
    }

    /// Removes the conversation with `id`. If it was current, the most
    /// recently created remaining conversation becomes current, or none.
    pub fn delete_conversation(&mut self, id: Uuid) -> Result<(), StoreError> {
        let position = self.conversations
            .iter()
            .position(|c| c.id == id)
            .ok_or(StoreError::UnknownConversation(id))?;
        self.conversations.remove(position);
        self.emit(StoreEvent::ConversationSetChanged);

        if self.current == Some(id) {
            self.current = self.conversations.last().map(|c| c.id);
            self.emit(StoreEvent::CurrentConversationChanged);
        }
        info!("Deleted conversation {}", id);
        Ok(())
    }

    /// Reserved operation: export is a recognized capability gap, reported
    /// as a typed error so callers and tests can see it.
    pub fn export_conversation(&self, id: Uuid) -> Result<String, StoreError> {
        self.conversations
            .iter()
            .find(|c| c.id == id)
            .ok_or(StoreError::UnknownConversation(id))?;
        Err(StoreError::Unsupported("export"))
    }

    pub fn set_current(&mut self, id: Uuid) -> Result<(), StoreError> {
        if !self.conversations.iter().any(|c| c.id == id) {
            return Err(StoreError::UnknownConversation(id));
        }
        if self.current != Some(id) {
            self.current = Some(id);
            self.emit(StoreEvent::CurrentConversationChanged);
        }
        Ok(())
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn current_id(&self) -> Option<Uuid> {
        self.current
    }

    pub fn current(&self) -> Option<&Conversation> {
        let id = self.current?;
        self.conversations.iter().find(|c| c.id == id)
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_add_message_preserves_insertion_order() {
        let mut store = ConversationStore::new();
        store.start_new_conversation(Some("T"));
        for i in 0..5 {
            store.add_message(Sender::User, &format!("msg {}", i)).unwrap();
        }

        let contents: Vec<&str> = store
            .current()
            .unwrap()
            .messages.iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["msg 0", "msg 1", "msg 2", "msg 3", "msg 4"]);
    }

    #[test]
    fn test_add_message_without_current_conversation_fails() {
        let mut store = ConversationStore::new();
        let result = store.add_message(Sender::User, "hello");
        assert_eq!(result.unwrap_err(), StoreError::NoCurrentConversation);
        assert!(store.conversations().is_empty());
    }

    #[test]
    fn test_new_conversations_are_isolated() {
        let mut store = ConversationStore::new();
        let first = store.start_new_conversation(Some("T"));
        let second = store.start_new_conversation(Some("T"));

        assert_ne!(first, second);
        assert_eq!(store.current_id(), Some(second));
        assert_eq!(store.conversations().len(), 2);
        assert!(store.conversations().iter().all(|c| c.messages.is_empty()));
    }

    #[test]
    fn test_default_title_numbers_by_set_size() {
        let mut store = ConversationStore::new();
        store.start_new_conversation(None);
        store.start_new_conversation(None);
        let titles: Vec<&str> = store
            .conversations()
            .iter()
            .map(|c| c.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Chat 1", "Chat 2"]);
    }

    #[test]
    fn test_delete_current_selects_most_recent_remaining() {
        let mut store = ConversationStore::new();
        let first = store.start_new_conversation(Some("a"));
        let second = store.start_new_conversation(Some("b"));
        let third = store.start_new_conversation(Some("c"));

        store.delete_conversation(third).unwrap();
        assert_eq!(store.current_id(), Some(second));

        store.delete_conversation(second).unwrap();
        store.delete_conversation(first).unwrap();
        assert_eq!(store.current_id(), None);
        assert!(store.conversations().is_empty());
    }

    #[test]
    fn test_delete_non_current_keeps_selection() {
        let mut store = ConversationStore::new();
        let first = store.start_new_conversation(Some("a"));
        let second = store.start_new_conversation(Some("b"));

        store.delete_conversation(first).unwrap();
        assert_eq!(store.current_id(), Some(second));
    }

    #[test]
    fn test_delete_unknown_conversation_fails() {
        let mut store = ConversationStore::new();
        let id = Uuid::new_v4();
        assert_eq!(
            store.delete_conversation(id).unwrap_err(),
            StoreError::UnknownConversation(id)
        );
    }

    #[test]
    fn test_export_is_unsupported() {
        let mut store = ConversationStore::new();
        let id = store.start_new_conversation(Some("T"));
        assert_eq!(
            store.export_conversation(id).unwrap_err(),
            StoreError::Unsupported("export")
        );
    }

    #[test]
    fn test_mutations_emit_events() {
        let mut store = ConversationStore::new();
        let mut events = store.subscribe();

        let id = store.start_new_conversation(Some("T"));
        assert_eq!(events.try_recv().unwrap(), StoreEvent::ConversationSetChanged);
        assert_eq!(events.try_recv().unwrap(), StoreEvent::CurrentConversationChanged);

        store.add_message(Sender::User, "hi").unwrap();
        assert_eq!(
            events.try_recv().unwrap(),
            StoreEvent::MessageAppended { conversation_id: id }
        );

        store.delete_conversation(id).unwrap();
        assert_eq!(events.try_recv().unwrap(), StoreEvent::ConversationSetChanged);
        assert_eq!(events.try_recv().unwrap(), StoreEvent::CurrentConversationChanged);
        assert_eq!(events.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[test]
    fn test_set_current_switches_selection() {
        let mut store = ConversationStore::new();
        let first = store.start_new_conversation(Some("a"));
        store.start_new_conversation(Some("b"));

        store.set_current(first).unwrap();
        assert_eq!(store.current_id(), Some(first));

        let unknown = Uuid::new_v4();
        assert_eq!(
            store.set_current(unknown).unwrap_err(),
            StoreError::UnknownConversation(unknown)
        );
    }
}
