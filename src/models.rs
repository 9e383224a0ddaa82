use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub name: String,
    pub participants: Vec<String>,
    pub last_message_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender: String,
    pub text: String,
    pub timestamp_ms: i64,
    pub is_from_me: bool,
    pub chat_id: i64,
}

/// One logical conversation: the representative chat shown in listings plus
/// every underlying chat id sharing its dedup key. Messages stay keyed by the
/// original ids and are never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatGroup {
    pub chat: Chat,
    pub chat_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportStats {
    pub contacts: i64,
    pub chats: i64,
    pub chat_groups: i64,
    pub messages: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub chats: i64,
    pub messages: i64,
    pub imports: i64,
}
