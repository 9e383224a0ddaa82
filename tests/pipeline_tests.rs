use keepsake_core::chats::GROUP_CHAT_NAME;
use keepsake_core::importer::import_export;
use keepsake_core::phone::DEFAULT_REGION;
use keepsake_core::query::{list_chat_groups, list_messages_for_chats, store_stats};
use keepsake_core::seed::{demo_contacts_bytes, demo_messages_bytes};
use keepsake_core::{open_store, QueryEngine, StoreDb};
use tempfile::TempDir;

fn imported_store() -> (TempDir, StoreDb) {
    let tmp = TempDir::new().expect("temp");
    let mut store = open_store(tmp.path().join("keepsake.sqlite")).expect("open store");
    let engine = QueryEngine::spawn();
    let contacts = demo_contacts_bytes().expect("contacts db");
    let messages = demo_messages_bytes().expect("messages db");
    import_export(&engine, &mut store, &contacts, &messages, DEFAULT_REGION).expect("import");
    (tmp, store)
}

#[test]
fn duplicate_group_chats_fold_but_keep_their_ids() {
    let (_tmp, store) = imported_store();
    let groups = list_chat_groups(&store.conn).expect("groups");
    assert_eq!(groups.len(), 3);

    let group = groups
        .iter()
        .find(|g| g.chat.name == GROUP_CHAT_NAME)
        .expect("generic group chat");
    assert_eq!(group.chat_ids.len(), 2);
    assert_eq!(group.chat.participants, vec!["Alice Smith", "Bob"]);
}

#[test]
fn selecting_a_group_reads_messages_across_all_member_chats() {
    let (_tmp, store) = imported_store();
    let groups = list_chat_groups(&store.conn).expect("groups");
    let group = groups
        .iter()
        .find(|g| g.chat.name == GROUP_CHAT_NAME)
        .expect("generic group chat");

    let messages = list_messages_for_chats(&store.conn, &group.chat_ids).expect("messages");
    assert_eq!(messages.len(), 2);
    // ascending timestamps across both underlying chats
    assert!(messages[0].timestamp_ms <= messages[1].timestamp_ms);
    let chat_ids: Vec<i64> = messages.iter().map(|m| m.chat_id).collect();
    assert!(chat_ids.contains(&2));
    assert!(chat_ids.contains(&3));
}

#[test]
fn chat_listing_orders_by_recent_activity() {
    let (_tmp, store) = imported_store();
    let groups = list_chat_groups(&store.conn).expect("groups");
    let names: Vec<&str> = groups.iter().map(|g| g.chat.name.as_str()).collect();
    assert_eq!(names, vec!["Alice Smith", "Ski Trip", GROUP_CHAT_NAME]);
}

#[test]
fn stats_reflect_the_imported_model() {
    let (_tmp, store) = imported_store();
    let stats = store_stats(&store.conn).expect("stats");
    assert_eq!(stats.chats, 4);
    assert_eq!(stats.messages, 6);
    assert_eq!(stats.imports, 1);
}
