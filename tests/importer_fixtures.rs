use keepsake_core::importer::import_export;
use keepsake_core::phone::DEFAULT_REGION;
use keepsake_core::seed::{demo_contacts_bytes, demo_messages_bytes};
use keepsake_core::{open_store, CoreError, QueryEngine};
use tempfile::tempdir;

#[test]
fn import_populates_store_from_fixture_exports() {
    let tmp = tempdir().expect("temp");
    let mut store = open_store(tmp.path().join("keepsake.sqlite")).expect("open store");
    let engine = QueryEngine::spawn();
    let contacts = demo_contacts_bytes().expect("contacts db");
    let messages = demo_messages_bytes().expect("messages db");

    let stats =
        import_export(&engine, &mut store, &contacts, &messages, DEFAULT_REGION).expect("import");
    assert_eq!(stats.contacts, 3);
    assert_eq!(stats.chats, 4);
    assert_eq!(stats.chat_groups, 3);
    assert_eq!(stats.messages, 6);

    let direct_sender: String = store
        .conn
        .query_row("SELECT sender FROM messages WHERE id = 1;", [], |row| row.get(0))
        .expect("sender");
    assert_eq!(direct_sender, "Alice Smith");

    let own_sender: String = store
        .conn
        .query_row("SELECT sender FROM messages WHERE id = 2;", [], |row| row.get(0))
        .expect("own sender");
    assert_eq!(own_sender, "System");

    // text missing in the row, recovered from the archived payload
    let recovered: String = store
        .conn
        .query_row("SELECT body FROM messages WHERE id = 3;", [], |row| row.get(0))
        .expect("body");
    assert_eq!(recovered, "Here is the plan for tomorrow, sound good?");

    let subject_body: String = store
        .conn
        .query_row("SELECT body FROM messages WHERE id = 5;", [], |row| row.get(0))
        .expect("subject body");
    assert_eq!(subject_body, "Plans\nLift tickets are booked");

    let named_chat: String = store
        .conn
        .query_row("SELECT name FROM chats WHERE id = 4;", [], |row| row.get(0))
        .expect("chat name");
    assert_eq!(named_chat, "Ski Trip");

    let status: String = store
        .conn
        .query_row("SELECT status FROM imports;", [], |row| row.get(0))
        .expect("import status");
    assert_eq!(status, "success");
}

#[test]
fn reimport_replaces_instead_of_accumulating() {
    let tmp = tempdir().expect("temp");
    let mut store = open_store(tmp.path().join("keepsake.sqlite")).expect("open store");
    let engine = QueryEngine::spawn();
    let contacts = demo_contacts_bytes().expect("contacts db");
    let messages = demo_messages_bytes().expect("messages db");

    import_export(&engine, &mut store, &contacts, &messages, DEFAULT_REGION).expect("first");
    import_export(&engine, &mut store, &contacts, &messages, DEFAULT_REGION).expect("second");

    let message_count: i64 = store
        .conn
        .query_row("SELECT COUNT(1) FROM messages;", [], |row| row.get(0))
        .expect("count");
    assert_eq!(message_count, 6);
    let chat_count: i64 = store
        .conn
        .query_row("SELECT COUNT(1) FROM chats;", [], |row| row.get(0))
        .expect("chats");
    assert_eq!(chat_count, 4);

    let ledger: i64 = store
        .conn
        .query_row(
            "SELECT COUNT(1) FROM imports WHERE status = 'success';",
            [],
            |row| row.get(0),
        )
        .expect("ledger");
    assert_eq!(ledger, 2);
}

#[test]
fn malformed_export_fails_and_is_recorded() {
    let tmp = tempdir().expect("temp");
    let mut store = open_store(tmp.path().join("keepsake.sqlite")).expect("open store");
    let engine = QueryEngine::spawn();
    let messages = demo_messages_bytes().expect("messages db");

    let err = import_export(
        &engine,
        &mut store,
        b"definitely not a database",
        &messages,
        DEFAULT_REGION,
    )
    .expect_err("import should fail");
    assert!(matches!(err, CoreError::Engine(_)));

    let status: String = store
        .conn
        .query_row("SELECT status FROM imports;", [], |row| row.get(0))
        .expect("status");
    assert_eq!(status, "failed");
    let message_count: i64 = store
        .conn
        .query_row("SELECT COUNT(1) FROM messages;", [], |row| row.get(0))
        .expect("count");
    assert_eq!(message_count, 0);
}
