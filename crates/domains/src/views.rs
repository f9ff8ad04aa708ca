//! Enriched rows and composed results handed to the handler layer.

use serde::Serialize;

use crate::models::{
    BoardBasic, BoardConfig, CategoryRef, Exif, Hashtag, Status, Thumbnail, Uid, Writer,
};

/// A post with its display attributes attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PostItem {
    pub uid: Uid,
    pub board_uid: Uid,
    pub title: String,
    pub content: String,
    pub submitted: u64,
    pub modified: u64,
    pub hit: u64,
    pub status: Status,
    pub category: CategoryRef,
    /// Empty when the post has no cover image
    pub cover: String,
    pub comment: u64,
    pub like: u64,
    pub liked: bool,
    pub writer: Writer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommentItem {
    pub uid: Uid,
    pub reply_uid: Uid,
    pub post_uid: Uid,
    pub content: String,
    pub submitted: u64,
    pub modified: u64,
    pub status: Status,
    pub like: u64,
    pub liked: bool,
    pub writer: Writer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Attachment {
    pub uid: Uid,
    pub name: String,
    pub path: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct AttachedImage {
    pub uid: Uid,
    pub path: String,
    pub thumbnail: Thumbnail,
    pub exif: Exif,
    pub description: String,
}

/// One entry of an author's recent-post digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WriterPost {
    pub board: BoardBasic,
    pub post_uid: Uid,
    pub title: String,
    pub submitted: u64,
    pub comment: u64,
    pub like: u64,
}

/// One entry of an author's recent-comment digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WriterComment {
    pub board: BoardBasic,
    pub post_uid: Uid,
    pub comment_uid: Uid,
    pub content: String,
    pub submitted: u64,
    pub like: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BoardListResult {
    pub total_post_count: u64,
    pub config: BoardConfig,
    pub notices: Vec<PostItem>,
    pub posts: Vec<PostItem>,
    pub black_list: Vec<Uid>,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PostViewResult {
    pub config: BoardConfig,
    pub post: PostItem,
    pub images: Vec<AttachedImage>,
    pub files: Vec<Attachment>,
    pub tags: Vec<Hashtag>,
    pub prev_post_uid: Uid,
    pub next_post_uid: Uid,
    pub writer_posts: Vec<WriterPost>,
    pub writer_comments: Vec<WriterComment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommentListResult {
    pub board_uid: Uid,
    /// The resolved boundary the page was read from
    pub since_uid: Uid,
    pub total_comment_count: u64,
    pub comments: Vec<CommentItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct HomeItem {
    pub board: BoardBasic,
    #[serde(flatten)]
    pub post: PostItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct HomeFeedResult {
    pub items: Vec<HomeItem>,
}
