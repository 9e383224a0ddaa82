use rusqlite::{params, Connection, OptionalExtension};

use crate::chats::group_chats;
use crate::error::CoreError;
use crate::models::{Chat, ChatGroup, Message, StoreStats};

pub fn list_chats(conn: &Connection) -> Result<Vec<Chat>, CoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, participants_json, last_message_at \
         FROM chats \
         ORDER BY last_message_at DESC, id ASC;",
    )?;
    let rows = stmt.query_map([], |row| {
        let participants_json: String = row.get(2)?;
        Ok(Chat {
            id: row.get(0)?,
            name: row.get(1)?,
            participants: serde_json::from_str(&participants_json).unwrap_or_default(),
            last_message_at: row.get(3)?,
        })
    })?;
    Ok(rows.filter_map(Result::ok).collect())
}

/// One representative per logical conversation, most recent activity first,
/// with every member chat id retained for message lookups.
pub fn list_chat_groups(conn: &Connection) -> Result<Vec<ChatGroup>, CoreError> {
    let chats = list_chats(conn)?;
    Ok(group_chats(&chats))
}

/// All messages belonging to any of the given chat ids, ordered by timestamp
/// ascending. This is the lookup the conversation view runs with a selected
/// group's full id set.
pub fn list_messages_for_chats(
    conn: &Connection,
    chat_ids: &[i64],
) -> Result<Vec<Message>, CoreError> {
    if chat_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut placeholders = String::new();
    for idx in 0..chat_ids.len() {
        if idx > 0 {
            placeholders.push(',');
        }
        placeholders.push('?');
    }
    let sql = format!(
        "SELECT id, sender, body, timestamp_ms, is_from_me, chat_id \
         FROM messages \
         WHERE chat_id IN ({}) \
         ORDER BY timestamp_ms ASC, id ASC;",
        placeholders
    );
    let params_vec: Vec<rusqlite::types::Value> =
        chat_ids.iter().map(|id| (*id).into()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params_vec), |row| {
        Ok(Message {
            id: row.get(0)?,
            sender: row.get(1)?,
            text: row.get(2)?,
            timestamp_ms: row.get(3)?,
            is_from_me: row.get::<_, i64>(4)? != 0,
            chat_id: row.get(5)?,
        })
    })?;
    Ok(rows.filter_map(Result::ok).collect())
}

pub fn chat_exists(conn: &Connection, chat_id: i64) -> Result<bool, CoreError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM chats WHERE id = ?1 LIMIT 1;",
            params![chat_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn store_stats(conn: &Connection) -> Result<StoreStats, CoreError> {
    let chats: i64 = conn.query_row("SELECT COUNT(1) FROM chats;", [], |row| row.get(0))?;
    let messages: i64 = conn.query_row("SELECT COUNT(1) FROM messages;", [], |row| row.get(0))?;
    let imports: i64 = conn.query_row("SELECT COUNT(1) FROM imports;", [], |row| row.get(0))?;
    Ok(StoreStats {
        chats,
        messages,
        imports,
    })
}
