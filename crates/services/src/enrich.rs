//! # Row Enrichment
//!
//! Attaches writer, category, cover, counts and the viewer's like state to
//! raw rows. Lookups are batched per page (one `IN (...)` style call per
//! attribute) and run concurrently; each output row is then assembled from
//! the maps, so the outer order is exactly the input order.
//!
//! Enrichment never fails the operation: a failed lookup is logged and the
//! attribute degrades to its zero value.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use domains::{
    BoardRepo, CategoryRef, CommentItem, CommentRepo, CommentRow, PostItem, PostRepo, PostRow, Uid,
    UserRepo, Writer,
};

use crate::Ports;

#[derive(Clone)]
pub struct Enricher {
    boards: Arc<dyn BoardRepo>,
    users: Arc<dyn UserRepo>,
    posts: Arc<dyn PostRepo>,
    comments: Arc<dyn CommentRepo>,
}

/// Swallows a failed scalar lookup into its zero value.
pub(crate) fn degrade<T: Default>(what: &'static str, result: anyhow::Result<T>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(lookup = what, error = %e, "enrichment lookup failed, using zero value");
        T::default()
    })
}

/// Distinct non-zero uids, first-seen order.
pub(crate) fn distinct(uids: impl IntoIterator<Item = Uid>) -> Vec<Uid> {
    let mut seen = HashSet::new();
    uids.into_iter().filter(|uid| *uid != 0 && seen.insert(*uid)).collect()
}

impl Enricher {
    pub fn new(ports: &Ports) -> Self {
        Self {
            boards: ports.boards.clone(),
            users: ports.users.clone(),
            posts: ports.posts.clone(),
            comments: ports.comments.clone(),
        }
    }

    async fn writers(&self, writer_uids: &[Uid]) -> HashMap<Uid, Writer> {
        if writer_uids.is_empty() {
            return HashMap::new();
        }
        degrade("writers", self.users.writers(writer_uids).await)
    }

    async fn categories(&self, category_uids: &[Uid]) -> HashMap<Uid, String> {
        if category_uids.is_empty() {
            return HashMap::new();
        }
        degrade("categories", self.boards.category_names(category_uids).await)
    }

    async fn post_likes(&self, post_uids: &[Uid], viewer_uid: Uid) -> HashSet<Uid> {
        // anonymous viewers never like anything
        if viewer_uid == 0 {
            return HashSet::new();
        }
        degrade("post liked", self.posts.liked_by(post_uids, viewer_uid).await)
    }

    async fn comment_likes(&self, comment_uids: &[Uid], viewer_uid: Uid) -> HashSet<Uid> {
        if viewer_uid == 0 {
            return HashSet::new();
        }
        degrade("comment liked", self.comments.liked_by(comment_uids, viewer_uid).await)
    }

    pub async fn posts(&self, rows: Vec<PostRow>, viewer_uid: Uid) -> Vec<PostItem> {
        if rows.is_empty() {
            return Vec::new();
        }
        let post_uids: Vec<Uid> = rows.iter().map(|row| row.uid).collect();
        let writer_uids = distinct(rows.iter().map(|row| row.writer_uid));
        let category_uids = distinct(rows.iter().map(|row| row.category_uid));

        let (writers, categories, covers, comment_counts, like_counts, liked) = tokio::join!(
            self.writers(&writer_uids),
            self.categories(&category_uids),
            self.posts.cover_paths(&post_uids),
            self.posts.comment_counts(&post_uids),
            self.posts.like_counts(&post_uids),
            self.post_likes(&post_uids, viewer_uid),
        );
        let covers = degrade("covers", covers);
        let comment_counts = degrade("comment counts", comment_counts);
        let like_counts = degrade("post likes", like_counts);

        rows.into_iter()
            .map(|row| {
                let category = categories
                    .get(&row.category_uid)
                    .map(|name| CategoryRef { uid: row.category_uid, name: name.clone() })
                    .unwrap_or_default();
                PostItem {
                    category,
                    cover: covers.get(&row.uid).cloned().unwrap_or_default(),
                    comment: comment_counts.get(&row.uid).copied().unwrap_or_default(),
                    like: like_counts.get(&row.uid).copied().unwrap_or_default(),
                    liked: liked.contains(&row.uid),
                    writer: writers.get(&row.writer_uid).cloned().unwrap_or_default(),
                    uid: row.uid,
                    board_uid: row.board_uid,
                    title: row.title,
                    content: row.content,
                    submitted: row.submitted,
                    modified: row.modified,
                    hit: row.hit,
                    status: row.status,
                }
            })
            .collect()
    }

    pub async fn post(&self, row: PostRow, viewer_uid: Uid) -> PostItem {
        self.posts(vec![row], viewer_uid).await.pop().unwrap_or_default()
    }

    pub async fn comments(&self, rows: Vec<CommentRow>, viewer_uid: Uid) -> Vec<CommentItem> {
        if rows.is_empty() {
            return Vec::new();
        }
        let comment_uids: Vec<Uid> = rows.iter().map(|row| row.uid).collect();
        let writer_uids = distinct(rows.iter().map(|row| row.writer_uid));

        let (writers, like_counts, liked) = tokio::join!(
            self.writers(&writer_uids),
            self.comments.like_counts(&comment_uids),
            self.comment_likes(&comment_uids, viewer_uid),
        );
        let like_counts = degrade("comment likes", like_counts);

        rows.into_iter()
            .map(|row| CommentItem {
                like: like_counts.get(&row.uid).copied().unwrap_or_default(),
                liked: liked.contains(&row.uid),
                writer: writers.get(&row.writer_uid).cloned().unwrap_or_default(),
                uid: row.uid,
                reply_uid: row.reply_uid,
                post_uid: row.post_uid,
                content: row.content,
                submitted: row.submitted,
                modified: row.modified,
                status: row.status,
            })
            .collect()
    }
}
