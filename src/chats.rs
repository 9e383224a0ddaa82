use std::collections::HashMap;

use crate::contacts::IdentifierMap;
use crate::engine::{i64_at, opt_i64_at, text_at, QueryResult};
use crate::models::{Chat, ChatGroup};
use crate::timestamp::to_unix_ms;

/// Display name given to group conversations whose row carries no name and
/// whose identifier is a synthetic group handle.
pub const GROUP_CHAT_NAME: &str = "Group Chat";

const GROUP_IDENTIFIER_PREFIX: &str = "chat";

#[derive(Debug, Clone)]
pub struct RawChatRow {
    pub id: i64,
    pub identifier: String,
    pub name: String,
    pub participants_csv: String,
    pub last_message_epoch: Option<i64>,
}

pub fn decode_chat_rows(result: &QueryResult) -> Vec<RawChatRow> {
    result
        .rows
        .iter()
        .map(|row| RawChatRow {
            id: i64_at(row, 0),
            identifier: text_at(row, 1),
            name: text_at(row, 2),
            participants_csv: text_at(row, 3),
            last_message_epoch: opt_i64_at(row, 4),
        })
        .collect()
}

/// Resolves raw chat rows into canonical chats: participant handles become
/// display names (deduplicated, first-seen order) and the chat name follows
/// the precedence row name, resolved identifier, group fallback, identifier.
pub fn assemble_chats(rows: &[RawChatRow], contacts: &IdentifierMap) -> Vec<Chat> {
    rows.iter().map(|row| assemble_chat(row, contacts)).collect()
}

fn assemble_chat(row: &RawChatRow, contacts: &IdentifierMap) -> Chat {
    let mut participants: Vec<String> = Vec::new();
    for handle in row.participants_csv.split(',') {
        if handle.is_empty() {
            continue;
        }
        let resolved = contacts
            .display_name_for(handle)
            .unwrap_or(handle)
            .to_string();
        if !participants.contains(&resolved) {
            participants.push(resolved);
        }
    }

    let name = if !row.name.is_empty() {
        row.name.clone()
    } else if let Some(resolved) = contacts.display_name_for(&row.identifier) {
        resolved.to_string()
    } else if row.identifier.starts_with(GROUP_IDENTIFIER_PREFIX) {
        GROUP_CHAT_NAME.to_string()
    } else {
        row.identifier.clone()
    };

    Chat {
        id: row.id,
        name,
        participants,
        last_message_at: row.last_message_epoch.map(to_unix_ms).unwrap_or(0),
    }
}

/// Key under which chats representing the same real-world conversation fold
/// together: the participant set for generic group chats, the name otherwise.
pub fn group_key(chat: &Chat) -> String {
    if chat.name == GROUP_CHAT_NAME {
        chat.participants.join(",")
    } else {
        chat.name.clone()
    }
}

/// Stable, order-preserving fold of chats into logical conversations. The
/// first chat seen with a key becomes the representative; later chats with
/// the same key contribute only their id. This is a display-layer reduction:
/// messages stay attached to every original chat id.
pub fn group_chats(chats: &[Chat]) -> Vec<ChatGroup> {
    let mut groups: Vec<ChatGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for chat in chats {
        let key = group_key(chat);
        match index.get(&key) {
            Some(&at) => groups[at].chat_ids.push(chat.id),
            None => {
                index.insert(key, groups.len());
                groups.push(ChatGroup {
                    chat: chat.clone(),
                    chat_ids: vec![chat.id],
                });
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::{build_identifier_map, ContactValueType, RawContactRow};

    fn contact(first: &str, value: &str, value_type: ContactValueType) -> RawContactRow {
        RawContactRow {
            first_name: first.to_string(),
            last_name: String::new(),
            organization: String::new(),
            value_type,
            value: value.to_string(),
        }
    }

    fn row(id: i64, identifier: &str, name: &str, csv: &str) -> RawChatRow {
        RawChatRow {
            id,
            identifier: identifier.to_string(),
            name: name.to_string(),
            participants_csv: csv.to_string(),
            last_message_epoch: None,
        }
    }

    fn test_map() -> IdentifierMap {
        build_identifier_map(
            &[
                contact("Alice", "5551234567", ContactValueType::Phone),
                contact("Bob", "bob@example.com", ContactValueType::Email),
            ],
            "US",
        )
    }

    #[test]
    fn participants_resolve_and_dedupe_in_order() {
        let map = test_map();
        let chats = assemble_chats(
            &[row(
                1,
                "chat1",
                "",
                "+15551234567,bob@example.com,+15551234567,+15559990000",
            )],
            &map,
        );
        assert_eq!(
            chats[0].participants,
            vec!["Alice", "Bob", "+15559990000"]
        );
    }

    #[test]
    fn name_precedence() {
        let map = test_map();
        let chats = assemble_chats(
            &[
                row(1, "chat42", "Book Club", "+15551234567"),
                row(2, "+15551234567", "", "+15551234567"),
                row(3, "chat99", "", "+15551234567,bob@example.com"),
                row(4, "+15550000000", "", "+15550000000"),
            ],
            &map,
        );
        assert_eq!(chats[0].name, "Book Club");
        assert_eq!(chats[1].name, "Alice");
        assert_eq!(chats[2].name, GROUP_CHAT_NAME);
        assert_eq!(chats[3].name, "+15550000000");
    }

    #[test]
    fn last_message_timestamp_defaults_to_zero() {
        let map = IdentifierMap::default();
        let mut raw = row(1, "c", "Named", "");
        raw.last_message_epoch = Some(694_224_000_000_000_000);
        let chats = assemble_chats(&[raw, row(2, "d", "Other", "")], &map);
        assert_eq!(chats[0].last_message_at, 1_672_531_200_000);
        assert_eq!(chats[1].last_message_at, 0);
    }

    fn named_chat(id: i64, name: &str, participants: &[&str]) -> Chat {
        Chat {
            id,
            name: name.to_string(),
            participants: participants.iter().map(|p| p.to_string()).collect(),
            last_message_at: 0,
        }
    }

    #[test]
    fn equal_participant_sets_fold_into_one_group() {
        let chats = vec![
            named_chat(1, GROUP_CHAT_NAME, &["Alice", "Bob"]),
            named_chat(2, GROUP_CHAT_NAME, &["Alice", "Bob"]),
            named_chat(3, GROUP_CHAT_NAME, &["Alice", "Carol"]),
        ];
        let groups = group_chats(&chats);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].chat.id, 1);
        assert_eq!(groups[0].chat_ids, vec![1, 2]);
        assert_eq!(groups[1].chat_ids, vec![3]);
    }

    #[test]
    fn named_chats_fold_by_name_not_participants() {
        let chats = vec![
            named_chat(1, "Alice", &["Alice"]),
            named_chat(2, "Alice", &["Alice", "Bob"]),
        ];
        let groups = group_chats(&chats);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].chat_ids, vec![1, 2]);
    }

    #[test]
    fn grouping_is_idempotent() {
        let chats = vec![
            named_chat(1, GROUP_CHAT_NAME, &["Alice", "Bob"]),
            named_chat(2, GROUP_CHAT_NAME, &["Alice", "Bob"]),
            named_chat(3, "Carol", &["Carol"]),
        ];
        let once = group_chats(&chats);
        let representatives: Vec<Chat> = once.iter().map(|g| g.chat.clone()).collect();
        let twice = group_chats(&representatives);
        assert_eq!(twice.len(), once.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a.chat.id, b.chat.id);
        }
    }
}
