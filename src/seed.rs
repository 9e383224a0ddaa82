use std::fs;

use rusqlite::{params, Connection};
use tempfile::NamedTempFile;

use crate::error::CoreError;

/// 2023-01-01T00:00:00Z in the export's nanoseconds-since-2001 epoch.
pub const DEMO_BASE_EPOCH: i64 = 694_224_000_000_000_000;

const MINUTE_NS: i64 = 60_000_000_000;

/// Builds a rich-text payload in the archived shape the extractor expects.
/// Body length must stay in the printable byte range (32..=126) so the
/// length prefix decodes like real payloads do.
pub fn attributed_payload(text: &str) -> Vec<u8> {
    let mut payload =
        b"\x04\x0bstreamtyped\x81\xe8\x03\x84\x01@\x84\x84\x84\x12NSAttributedString\x00\x84\x84\x08NSObject\x00\x85\x92\x84\x84\x84".to_vec();
    payload.extend_from_slice(b"NSString\x01\x94\x84\x01+");
    payload.push(text.len() as u8);
    payload.extend_from_slice(text.as_bytes());
    payload.extend_from_slice(b"\x86\x84\x02iI\x01");
    payload
}

/// Populates a connection with the AddressBook export schema and demo rows.
pub fn seed_contacts_db(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE ABPerson (
          ROWID INTEGER PRIMARY KEY,
          First TEXT,
          Last TEXT,
          Organization TEXT
        );
        CREATE TABLE ABMultiValue (
          UID INTEGER PRIMARY KEY,
          record_id INTEGER,
          property INTEGER,
          value TEXT
        );
        "#,
    )?;
    conn.execute(
        "INSERT INTO ABPerson (ROWID, First, Last, Organization) VALUES (1, 'Alice', 'Smith', NULL);",
        [],
    )?;
    conn.execute(
        "INSERT INTO ABPerson (ROWID, First, Last, Organization) VALUES (2, 'Bob', NULL, NULL);",
        [],
    )?;
    conn.execute(
        "INSERT INTO ABPerson (ROWID, First, Last, Organization) VALUES (3, 'Carol', 'Jones', 'Acme');",
        [],
    )?;
    // property 3 = phone, 4 = email
    conn.execute(
        "INSERT INTO ABMultiValue (UID, record_id, property, value) VALUES (1, 1, 3, '555-123-4567');",
        [],
    )?;
    conn.execute(
        "INSERT INTO ABMultiValue (UID, record_id, property, value) VALUES (2, 2, 4, 'bob@example.com');",
        [],
    )?;
    conn.execute(
        "INSERT INTO ABMultiValue (UID, record_id, property, value) VALUES (3, 3, 3, '+1 (555) 987-6543');",
        [],
    )?;
    Ok(())
}

/// Populates a connection with the chat.db export schema and demo rows:
/// a direct chat, a pair of duplicate unnamed group chats, and a named group.
pub fn seed_messages_db(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE chat (
          ROWID INTEGER PRIMARY KEY,
          chat_identifier TEXT,
          display_name TEXT
        );
        CREATE TABLE handle (
          ROWID INTEGER PRIMARY KEY,
          id TEXT
        );
        CREATE TABLE chat_handle_join (
          chat_id INTEGER,
          handle_id INTEGER
        );
        CREATE TABLE message (
          ROWID INTEGER PRIMARY KEY,
          handle_id INTEGER,
          subject TEXT,
          text TEXT,
          date INTEGER,
          is_from_me INTEGER,
          attributedBody BLOB
        );
        CREATE TABLE chat_message_join (
          chat_id INTEGER,
          message_id INTEGER,
          message_date INTEGER
        );
        "#,
    )?;

    for (rowid, handle) in [
        (1, "+15551234567"),
        (2, "bob@example.com"),
        (3, "+15559876543"),
    ] {
        conn.execute(
            "INSERT INTO handle (ROWID, id) VALUES (?1, ?2);",
            params![rowid, handle],
        )?;
    }

    for (rowid, identifier, name) in [
        (1, "+15551234567", None::<&str>),
        (2, "chat100000001", None),
        (3, "chat100000002", None),
        (4, "chat200000003", Some("Ski Trip")),
    ] {
        conn.execute(
            "INSERT INTO chat (ROWID, chat_identifier, display_name) VALUES (?1, ?2, ?3);",
            params![rowid, identifier, name],
        )?;
    }

    for (chat_id, handle_id) in [(1, 1), (2, 1), (2, 2), (3, 1), (3, 2), (4, 1), (4, 2), (4, 3)] {
        conn.execute(
            "INSERT INTO chat_handle_join (chat_id, handle_id) VALUES (?1, ?2);",
            params![chat_id, handle_id],
        )?;
    }

    let payload = attributed_payload("Here is the plan for tomorrow, sound good?");
    let rows: Vec<(i64, Option<i64>, Option<&str>, Option<&str>, i64, i64, Option<Vec<u8>>, i64)> = vec![
        (1, Some(1), None, Some("Happy new year!"), DEMO_BASE_EPOCH, 0, None, 1),
        (2, None, None, Some("You too!"), DEMO_BASE_EPOCH + MINUTE_NS, 1, None, 1),
        (3, Some(2), None, None, DEMO_BASE_EPOCH + 2 * MINUTE_NS, 0, Some(payload), 2),
        (4, Some(1), None, Some("Did everyone see this?"), DEMO_BASE_EPOCH + 3 * MINUTE_NS, 0, None, 3),
        (5, Some(3), Some("Plans"), Some("Lift tickets are booked"), DEMO_BASE_EPOCH + 4 * MINUTE_NS, 0, None, 4),
        (6, None, None, None, DEMO_BASE_EPOCH + 5 * MINUTE_NS, 0, None, 1),
    ];
    for (rowid, handle_id, subject, text, date, is_from_me, body, chat_id) in rows {
        conn.execute(
            "INSERT INTO message (ROWID, handle_id, subject, text, date, is_from_me, attributedBody) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![rowid, handle_id, subject, text, date, is_from_me, body],
        )?;
        conn.execute(
            "INSERT INTO chat_message_join (chat_id, message_id, message_date) VALUES (?1, ?2, ?3);",
            params![chat_id, rowid, date],
        )?;
    }
    Ok(())
}

pub fn demo_contacts_bytes() -> Result<Vec<u8>, CoreError> {
    db_bytes(seed_contacts_db)
}

pub fn demo_messages_bytes() -> Result<Vec<u8>, CoreError> {
    db_bytes(seed_messages_db)
}

fn db_bytes(seed: fn(&Connection) -> Result<(), CoreError>) -> Result<Vec<u8>, CoreError> {
    let file = NamedTempFile::new()
        .map_err(|e| CoreError::InvalidArgument(format!("temp file failed: {}", e)))?;
    {
        let conn = Connection::open(file.path())?;
        seed(&conn)?;
    }
    fs::read(file.path()).map_err(|e| CoreError::InvalidArgument(format!("temp read failed: {}", e)))
}
