//! Shared fixtures for the end-to-end tests: a [`MemoryStore`] wired into a
//! [`FeedService`] the same way the binary wires it.

use std::sync::Arc;

use domains::{BoardConfig, PostRow, Status, Uid};
use services::{EngineConfig, FeedService, ListQuery, Ports};
use storage_adapters::MemoryStore;

pub fn service(store: &Arc<MemoryStore>) -> FeedService {
    service_with(store, EngineConfig::default())
}

pub fn service_with(store: &Arc<MemoryStore>, config: EngineConfig) -> FeedService {
    let ports = Ports {
        boards: store.clone(),
        users: store.clone(),
        posts: store.clone(),
        comments: store.clone(),
        access: store.clone(),
        files: store.clone(),
    };
    FeedService::new(ports, config)
}

/// A board with an explicit uid, so the first post uid is 1.
pub fn board(store: &MemoryStore, uid: Uid, slug: &str) -> Uid {
    store.insert_board(BoardConfig {
        uid,
        id: slug.to_string(),
        name: slug.to_string(),
        row_count: 20,
        ..Default::default()
    })
}

pub fn post(store: &MemoryStore, board_uid: Uid, writer_uid: Uid, title: &str) -> Uid {
    store.insert_post(PostRow {
        board_uid,
        writer_uid,
        title: title.to_string(),
        content: format!("{title} body"),
        ..Default::default()
    })
}

pub fn post_with_status(
    store: &MemoryStore,
    board_uid: Uid,
    writer_uid: Uid,
    status: Status,
) -> Uid {
    let uid = post(store, board_uid, writer_uid, "post");
    store.set_post_status(uid, status);
    uid
}

pub fn list(board_uid: Uid, bunch: u32) -> ListQuery {
    ListQuery { board_uid, bunch, ..Default::default() }
}

pub fn uids<T>(items: &[T], uid: impl Fn(&T) -> Uid) -> Vec<Uid> {
    items.iter().map(uid).collect()
}
