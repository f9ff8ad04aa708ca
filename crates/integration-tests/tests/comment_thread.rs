use std::sync::Arc;

use domains::{CommentItem, CommentRow, Direction, Status, Uid};
use integration_tests::{board, post, post_with_status, service, uids};
use services::CommentQuery;
use storage_adapters::MemoryStore;

fn comment(store: &MemoryStore, post_uid: Uid, reply_uid: Uid, writer_uid: Uid) -> Uid {
    store.insert_comment(CommentRow {
        post_uid,
        reply_uid,
        writer_uid,
        content: format!("reply to {reply_uid}"),
        ..Default::default()
    })
}

fn thread(board_uid: Uid, post_uid: Uid) -> CommentQuery {
    CommentQuery { board_uid, post_uid, bunch: 50, ..Default::default() }
}

fn comment_uids(items: &[CommentItem]) -> Vec<Uid> {
    uids(items, |item| item.uid)
}

#[tokio::test]
async fn top_level_comments_lead_and_replies_follow() {
    let store = Arc::new(MemoryStore::new());
    let board_uid = board(&store, 100, "free");
    let post_uid = post(&store, board_uid, 0, "discussion");
    let a = comment(&store, post_uid, 0, 0);
    let b = comment(&store, post_uid, 0, 0);
    let a1 = comment(&store, post_uid, a, 0);
    let b1 = comment(&store, post_uid, b, 0);
    let a2 = comment(&store, post_uid, a, 0);
    let service = service(&store);

    let result = service.list_comments(&thread(board_uid, post_uid)).await.unwrap();
    assert_eq!(comment_uids(&result.comments), vec![b, a, a2, a1, b1]);
    assert_eq!(result.total_comment_count, 5);
    assert_eq!(result.since_uid, a2 + 1);
    assert_eq!(result.board_uid, board_uid);
}

#[tokio::test]
async fn thread_pages_by_cursor() {
    let store = Arc::new(MemoryStore::new());
    let board_uid = board(&store, 100, "free");
    let post_uid = post(&store, board_uid, 0, "busy");
    let all: Vec<Uid> = (0..5).map(|_| comment(&store, post_uid, 0, 0)).collect();
    let service = service(&store);

    let first = CommentQuery { bunch: 2, ..thread(board_uid, post_uid) };
    let page = service.list_comments(&first).await.unwrap();
    assert_eq!(comment_uids(&page.comments), vec![all[4], all[3]]);

    let next = CommentQuery { since_uid: all[3], ..first.clone() };
    let page = service.list_comments(&next).await.unwrap();
    assert_eq!(comment_uids(&page.comments), vec![all[2], all[1]]);

    let back = CommentQuery { since_uid: all[1], direction: Direction::Prev, ..first };
    let page = service.list_comments(&back).await.unwrap();
    assert_eq!(comment_uids(&page.comments), vec![all[2], all[3]]);
}

#[tokio::test]
async fn removed_comments_are_hidden_and_uncounted() {
    let store = Arc::new(MemoryStore::new());
    let board_uid = board(&store, 100, "free");
    let post_uid = post(&store, board_uid, 0, "moderated");
    let kept = comment(&store, post_uid, 0, 0);
    let gone = comment(&store, post_uid, 0, 0);
    store.set_comment_status(gone, Status::Removed);
    let service = service(&store);

    let result = service.list_comments(&thread(board_uid, post_uid)).await.unwrap();
    assert_eq!(comment_uids(&result.comments), vec![kept]);
    assert_eq!(result.total_comment_count, 1);
}

#[tokio::test]
async fn secret_post_threads_follow_the_post() {
    let store = Arc::new(MemoryStore::new());
    let board_uid = board(&store, 100, "free");
    let writer = store.insert_user("writer", 1, 0);
    let stranger = store.insert_user("stranger", 1, 0);
    let secret = post_with_status(&store, board_uid, writer, Status::Secret);
    comment(&store, secret, 0, writer);
    let service = service(&store);

    let own = CommentQuery { viewer_uid: writer, ..thread(board_uid, secret) };
    assert_eq!(service.list_comments(&own).await.unwrap().comments.len(), 1);

    let other = CommentQuery { viewer_uid: stranger, ..thread(board_uid, secret) };
    assert_eq!(service.list_comments(&other).await.unwrap_err().kind(), "forbidden");
}

#[tokio::test]
async fn removed_post_has_no_thread() {
    let store = Arc::new(MemoryStore::new());
    let board_uid = board(&store, 100, "free");
    let removed = post_with_status(&store, board_uid, 0, Status::Removed);
    let service = service(&store);

    let err = service.list_comments(&thread(board_uid, removed)).await.unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[tokio::test]
async fn comment_likes_and_writers_are_attached() {
    let store = Arc::new(MemoryStore::new());
    let board_uid = board(&store, 100, "free");
    let author = store.insert_user("author", 1, 0);
    let fan = store.insert_user("fan", 1, 0);
    let post_uid = post(&store, board_uid, author, "liked thread");
    let liked = comment(&store, post_uid, 0, author);
    store.like_comment(liked, fan, true);
    let unliked = comment(&store, post_uid, 0, 0);
    store.like_comment(unliked, fan, true);
    store.like_comment(unliked, fan, false);
    let service = service(&store);

    let query = CommentQuery { viewer_uid: fan, ..thread(board_uid, post_uid) };
    let result = service.list_comments(&query).await.unwrap();
    let by_uid = |uid| result.comments.iter().find(|c| c.uid == uid).unwrap();
    assert_eq!(by_uid(liked).like, 1);
    assert!(by_uid(liked).liked);
    assert_eq!(by_uid(liked).writer.name, "author");
    assert_eq!(by_uid(unliked).like, 0);
    assert!(!by_uid(unliked).liked);
    assert_eq!(by_uid(unliked).writer.uid, 0);

    let anonymous = service.list_comments(&thread(board_uid, post_uid)).await.unwrap();
    assert!(anonymous.comments.iter().all(|c| !c.liked));
}
