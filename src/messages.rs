use crate::attributed::extract_text;
use crate::contacts::IdentifierMap;
use crate::engine::{blob_at, i64_at, opt_text_at, QueryResult};
use crate::models::Message;
use crate::timestamp::to_unix_ms;

/// Sender shown for rows with no handle: service notices and messages sent
/// from this device.
pub const SYSTEM_SENDER: &str = "System";

#[derive(Debug, Clone)]
pub struct RawMessageRow {
    pub id: i64,
    pub from: Option<String>,
    pub subject: Option<String>,
    pub text: Option<String>,
    pub timestamp_epoch: i64,
    pub is_from_me: i64,
    pub chat_id: i64,
    pub payload: Option<Vec<u8>>,
}

pub fn decode_message_rows(result: &QueryResult) -> Vec<RawMessageRow> {
    result
        .rows
        .iter()
        .map(|row| RawMessageRow {
            id: i64_at(row, 0),
            from: opt_text_at(row, 1),
            subject: opt_text_at(row, 2),
            text: opt_text_at(row, 3),
            timestamp_epoch: i64_at(row, 4),
            is_from_me: i64_at(row, 5),
            chat_id: i64_at(row, 6),
            payload: blob_at(row, 7),
        })
        .collect()
}

/// Resolves raw message rows into canonical messages. Output keeps input
/// order; consumers sort by `timestamp_ms` ascending themselves.
pub fn assemble_messages(rows: &[RawMessageRow], contacts: &IdentifierMap) -> Vec<Message> {
    rows.iter().map(|row| assemble_message(row, contacts)).collect()
}

fn assemble_message(row: &RawMessageRow, contacts: &IdentifierMap) -> Message {
    let sender = match row.from.as_deref().filter(|from| !from.is_empty()) {
        Some(from) => contacts.display_name_for(from).unwrap_or(from).to_string(),
        None => SYSTEM_SENDER.to_string(),
    };

    let mut text = String::new();
    if let Some(subject) = row.subject.as_deref().filter(|s| !s.is_empty()) {
        text.push_str(subject);
        text.push('\n');
    }
    if let Some(body) = row.text.as_deref() {
        text.push_str(body);
    }
    if text.is_empty() {
        if let Some(payload) = row.payload.as_deref() {
            text = extract_text(payload);
        }
    }

    Message {
        id: row.id,
        sender,
        text,
        timestamp_ms: to_unix_ms(row.timestamp_epoch),
        is_from_me: row.is_from_me == 1,
        chat_id: row.chat_id,
    }
}
