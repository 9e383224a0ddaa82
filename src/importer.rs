use chrono::Utc;
use rusqlite::params;
use rusqlite::types::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::chats::{assemble_chats, decode_chat_rows, group_chats};
use crate::contacts::{build_identifier_map, decode_contact_rows};
use crate::db::StoreDb;
use crate::diagnostics;
use crate::engine::QueryEngine;
use crate::error::CoreError;
use crate::messages::{assemble_messages, decode_message_rows};
use crate::models::{Chat, ImportStats, Message};

pub const CONTACTS_DB_NAME: &str = "contacts";
pub const MESSAGES_DB_NAME: &str = "messages";

const INSERT_BATCH_SIZE: usize = 100;

/// Fixed query over the AddressBook export. The column order is the schema
/// contract the contact decoder relies on.
pub const CONTACTS_QUERY: &str = "\
SELECT
  p.First AS first_name,
  p.Last AS last_name,
  p.Organization AS organization,
  CASE
    WHEN m.property = 3 THEN 'phone'
    WHEN m.property = 4 THEN 'email'
    ELSE 'other'
  END AS value_type,
  m.value AS value
FROM
  ABPerson p
JOIN
  ABMultiValue m ON p.ROWID = m.record_id
WHERE
  m.property IN (3, 4)
  AND m.value IS NOT NULL
ORDER BY
  p.ROWID;";

/// Fixed query over the messages export: one row per chat with its handles
/// comma-joined and its latest message date.
pub const CHATS_QUERY: &str = "\
SELECT
  c.ROWID AS id,
  c.chat_identifier AS identifier,
  c.display_name AS name,
  GROUP_CONCAT(h.id, ',') AS participants,
  MAX(cmj.message_date) AS last_message_date
FROM
  chat c
LEFT JOIN
  chat_handle_join chj ON chj.chat_id = c.ROWID
LEFT JOIN
  handle h ON h.ROWID = chj.handle_id
LEFT JOIN
  chat_message_join cmj ON cmj.chat_id = c.ROWID
GROUP BY
  c.ROWID
ORDER BY
  last_message_date DESC;";

/// Fixed query over the messages export, ordered by timestamp ascending at
/// the source.
pub const MESSAGES_QUERY: &str = "\
SELECT
  m.ROWID AS id,
  h.id AS \"from\",
  m.subject AS subject,
  m.text AS text,
  m.date AS timestamp,
  m.is_from_me AS isFromMe,
  cmj.chat_id AS chatId,
  m.attributedBody AS binary
FROM
  message m
LEFT JOIN handle h ON m.handle_id = h.ROWID
JOIN chat_message_join cmj ON cmj.message_id = m.ROWID
ORDER BY
  timestamp ASC;";

pub fn import_export(
    engine: &QueryEngine,
    store: &mut StoreDb,
    contacts_db: &[u8],
    messages_db: &[u8],
    region: &str,
) -> Result<ImportStats, CoreError> {
    import_export_with_progress(engine, store, contacts_db, messages_db, region, |_| {})
}

/// Runs the full import: loads both exports into the query engine, builds the
/// identifier map, assembles chats and messages, and replaces the store
/// contents in a single transaction. Every run is recorded in the imports
/// ledger with content hashes of the source blobs.
pub fn import_export_with_progress<F>(
    engine: &QueryEngine,
    store: &mut StoreDb,
    contacts_db: &[u8],
    messages_db: &[u8],
    region: &str,
    progress: F,
) -> Result<ImportStats, CoreError>
where
    F: Fn(&str),
{
    let import_id = Uuid::new_v4().to_string();
    let started_at = Utc::now().timestamp_millis();
    store.conn.execute(
        "INSERT INTO imports (id, imported_at, contacts_hash, messages_hash, status, stats_json) \
         VALUES (?1, ?2, ?3, ?4, 'running', NULL);",
        params![
            import_id,
            started_at,
            hash_bytes(contacts_db),
            hash_bytes(messages_db)
        ],
    )?;

    match run_import(engine, store, contacts_db, messages_db, region, &progress) {
        Ok(stats) => {
            let stats_json =
                serde_json::to_string(&stats).unwrap_or_else(|_| "null".to_string());
            store.conn.execute(
                "UPDATE imports SET status = 'success', stats_json = ?2 WHERE id = ?1;",
                params![import_id, stats_json],
            )?;
            let _ = diagnostics::log_event(
                &store.log_dir(),
                "import",
                &format!(
                    "imported {} messages across {} chats ({} conversations)",
                    stats.messages, stats.chats, stats.chat_groups
                ),
            );
            Ok(stats)
        }
        Err(err) => {
            let message = err.to_string();
            let _ = store.conn.execute(
                "UPDATE imports SET status = 'failed', stats_json = ?2 WHERE id = ?1;",
                params![
                    import_id,
                    format!(
                        r#"{{"error":{}}}"#,
                        serde_json::to_string(&message).unwrap_or_else(|_| "null".to_string())
                    )
                ],
            );
            let _ = diagnostics::log_event(&store.log_dir(), "import_error", &message);
            Err(err)
        }
    }
}

fn run_import<F>(
    engine: &QueryEngine,
    store: &mut StoreDb,
    contacts_db: &[u8],
    messages_db: &[u8],
    region: &str,
    progress: &F,
) -> Result<ImportStats, CoreError>
where
    F: Fn(&str),
{
    progress("Loading databases...");
    engine.init(CONTACTS_DB_NAME, contacts_db.to_vec())?;
    engine.init(MESSAGES_DB_NAME, messages_db.to_vec())?;

    progress("Resolving contacts...");
    let contact_results = engine.query(CONTACTS_DB_NAME, CONTACTS_QUERY)?;
    let contact_rows = contact_results
        .first()
        .map(decode_contact_rows)
        .unwrap_or_default();
    let identifier_map = build_identifier_map(&contact_rows, region);

    progress("Assembling chats...");
    let chat_results = engine.query(MESSAGES_DB_NAME, CHATS_QUERY)?;
    let chat_rows = chat_results.first().map(decode_chat_rows).unwrap_or_default();
    let chats = assemble_chats(&chat_rows, &identifier_map);
    let chat_groups = group_chats(&chats);

    progress("Assembling messages...");
    let message_results = engine.query(MESSAGES_DB_NAME, MESSAGES_QUERY)?;
    let message_rows = message_results
        .first()
        .map(decode_message_rows)
        .unwrap_or_default();
    let messages = assemble_messages(&message_rows, &identifier_map);

    progress("Writing store...");
    let inserted = replace_store(store, &chats, &messages)?;

    engine.delete(CONTACTS_DB_NAME)?;
    engine.delete(MESSAGES_DB_NAME)?;

    Ok(ImportStats {
        contacts: contact_rows.len() as i64,
        chats: chats.len() as i64,
        chat_groups: chat_groups.len() as i64,
        messages: inserted,
    })
}

/// Clear-and-replace as one critical section: a reader never observes a
/// partially replaced store mixing old and new rows.
fn replace_store(store: &mut StoreDb, chats: &[Chat], messages: &[Message]) -> Result<i64, CoreError> {
    let tx = store.conn.transaction()?;
    tx.execute("DELETE FROM messages;", [])?;
    tx.execute("DELETE FROM chats;", [])?;
    for batch in chats.chunks(INSERT_BATCH_SIZE) {
        insert_chat_batch(&tx, batch)?;
    }
    let mut inserted: i64 = 0;
    for batch in messages.chunks(INSERT_BATCH_SIZE) {
        inserted += insert_message_batch(&tx, batch)?;
    }
    tx.commit()?;
    Ok(inserted)
}

fn insert_chat_batch(tx: &rusqlite::Transaction, batch: &[Chat]) -> Result<(), CoreError> {
    if batch.is_empty() {
        return Ok(());
    }
    let mut sql = String::from(
        "INSERT OR IGNORE INTO chats (id, name, participants_json, last_message_at) VALUES ",
    );
    let mut params_vec: Vec<Value> = Vec::with_capacity(batch.len() * 4);
    for (idx, chat) in batch.iter().enumerate() {
        if idx > 0 {
            sql.push(',');
        }
        sql.push_str("(?, ?, ?, ?)");
        params_vec.push(Value::from(chat.id));
        params_vec.push(Value::from(chat.name.clone()));
        params_vec.push(Value::from(
            serde_json::to_string(&chat.participants).unwrap_or_else(|_| "[]".to_string()),
        ));
        params_vec.push(Value::from(chat.last_message_at));
    }
    tx.execute(&sql, rusqlite::params_from_iter(params_vec))?;
    Ok(())
}

fn insert_message_batch(tx: &rusqlite::Transaction, batch: &[Message]) -> Result<i64, CoreError> {
    if batch.is_empty() {
        return Ok(0);
    }
    let mut sql = String::from(
        "INSERT OR IGNORE INTO messages (id, sender, body, timestamp_ms, is_from_me, chat_id) VALUES ",
    );
    let mut params_vec: Vec<Value> = Vec::with_capacity(batch.len() * 6);
    for (idx, message) in batch.iter().enumerate() {
        if idx > 0 {
            sql.push(',');
        }
        sql.push_str("(?, ?, ?, ?, ?, ?)");
        params_vec.push(Value::from(message.id));
        params_vec.push(Value::from(message.sender.clone()));
        params_vec.push(Value::from(message.text.clone()));
        params_vec.push(Value::from(message.timestamp_ms));
        params_vec.push(Value::from(if message.is_from_me { 1_i64 } else { 0 }));
        params_vec.push(Value::from(message.chat_id));
    }
    let changes = tx.execute(&sql, rusqlite::params_from_iter(params_vec))?;
    Ok(changes as i64)
}

fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
