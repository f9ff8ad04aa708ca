//! Demo content for the in-memory store.

use domains::{BoardConfig, BoardType, CommentRow, PostRow, Status, Thumbnail};
use storage_adapters::{MemoryStore, NewImage};

pub fn seed() -> MemoryStore {
    let store = MemoryStore::new();
    let admin = store.insert_user("admin", 9, 1000);
    store.set_site_admin(admin);
    let alice = store.insert_user("alice", 1, 100);
    let bob = store.insert_user("bob", 1, 20);

    let free = store.insert_board(BoardConfig {
        id: "free".into(),
        name: "Free board".into(),
        row_count: 10,
        ..Default::default()
    });
    let photo = store.insert_board(BoardConfig {
        id: "photo".into(),
        name: "Photos".into(),
        board_type: BoardType::Gallery,
        row_count: 12,
        ..Default::default()
    });
    let chatter = store.insert_category(free, "chatter");

    let notice = store.insert_post(PostRow {
        board_uid: free,
        writer_uid: admin,
        title: "Welcome".into(),
        content: "House rules".into(),
        status: Status::Notice,
        ..Default::default()
    });
    store.tag_post(notice, "rules");

    for n in 1..=25 {
        let writer_uid = if n % 2 == 0 { alice } else { bob };
        let post = store.insert_post(PostRow {
            board_uid: free,
            writer_uid,
            category_uid: if n % 3 == 0 { chatter } else { 0 },
            title: format!("Post number {n}"),
            content: format!("Body of post {n}"),
            ..Default::default()
        });
        if n % 5 == 0 {
            store.tag_post(post, "rust");
            store.like_post(post, alice, true);
        }
        if n == 25 {
            let first = store.insert_comment(CommentRow {
                post_uid: post,
                writer_uid: alice,
                content: "First!".into(),
                ..Default::default()
            });
            store.insert_comment(CommentRow {
                reply_uid: first,
                post_uid: post,
                writer_uid: bob,
                content: "Second".into(),
                ..Default::default()
            });
            store.like_comment(first, bob, true);
        }
    }

    let sunset = store.insert_post(PostRow {
        board_uid: photo,
        writer_uid: alice,
        title: "Sunset".into(),
        ..Default::default()
    });
    store.attach_image(
        sunset,
        NewImage {
            path: "/image/sunset.jpg".into(),
            thumbnail: Some(Thumbnail {
                small: "/thumb/sunset.s.jpg".into(),
                large: "/thumb/sunset.l.jpg".into(),
            }),
            description: Some("orange sky over the harbour".into()),
            ..Default::default()
        },
    );
    store.attach_file(sunset, "raw.zip", "/attach/raw.zip", 2048);
    store
}
