pub const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS imports (
      id TEXT PRIMARY KEY,
      imported_at INTEGER NOT NULL,
      contacts_hash TEXT NOT NULL,
      messages_hash TEXT NOT NULL,
      status TEXT NOT NULL,
      stats_json TEXT
    );

    CREATE TABLE IF NOT EXISTS chats (
      id INTEGER PRIMARY KEY,
      name TEXT NOT NULL,
      participants_json TEXT NOT NULL,
      last_message_at INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS messages (
      id INTEGER PRIMARY KEY,
      sender TEXT NOT NULL,
      body TEXT NOT NULL,
      timestamp_ms INTEGER NOT NULL DEFAULT 0,
      is_from_me INTEGER NOT NULL DEFAULT 0,
      chat_id INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_messages_chat_id ON messages(chat_id);
    CREATE INDEX IF NOT EXISTS idx_messages_chat_ts ON messages(chat_id, timestamp_ms);
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_chats_last_message_at ON chats(last_message_at DESC);
    "#,
];
