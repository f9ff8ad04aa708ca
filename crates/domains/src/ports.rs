//! # Ports
//!
//! Collaborators the engine consumes but does not implement. Storage
//! adapters implement the repo traits; identity and file services implement
//! [`AccessOracle`] and [`FileResolver`].
//!
//! Row-set methods return rows in the order the caller will present them.
//! Batched `*_by`/`*_counts` lookups return maps keyed by the requested
//! uid; a uid missing from the map means "absent", never an error.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::models::{
    BoardBasic, BoardConfig, CommentRow, Exif, FileRow, Hashtag, ImageRow, PostRow, Status,
    Thumbnail, Uid, Writer,
};
use crate::pagination::PageWindow;

/// Column a text search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Content,
}

/// The predicate half of a post listing; the window supplies the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    /// Normal and secret posts, no text predicate.
    Window,
    /// Substring match; case rules follow the store's collation.
    Text(TextField, String),
    Writer(Uid),
    /// Posts carrying any of the hashtags. An empty list matches nothing.
    Tags(Vec<Uid>),
    /// Posts with an attached image whose description contains the keyword.
    ImageDescription(String),
}

/// Which secret posts a content or image-description search may look inside.
/// Titles are listed publicly, so title searches ignore the scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecretScope {
    #[default]
    None,
    /// The viewer's own secret posts.
    Writer(Uid),
    All,
}

impl SecretScope {
    pub fn admits(self, status: Status, writer_uid: Uid) -> bool {
        match self {
            _ if status != Status::Secret => true,
            Self::None => false,
            Self::Writer(uid) => uid > 0 && uid == writer_uid,
            Self::All => true,
        }
    }
}

/// Board configuration and category lookups.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BoardRepo: Send + Sync {
    async fn board_uid_by_id(&self, id: &str) -> anyhow::Result<Option<Uid>>;
    /// Full config including the category list.
    async fn board_config(&self, board_uid: Uid) -> anyhow::Result<Option<BoardConfig>>;
    async fn board_basics(&self, board_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, BoardBasic>>;
    async fn category_names(&self, category_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, String>>;
}

/// Writer projections and per-viewer user data.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn writers(&self, user_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, Writer>>;
    /// Prefix/substring name match; the most recently registered user wins.
    async fn writer_uid_by_name(&self, name: &str) -> anyhow::Result<Option<Uid>>;
    /// Users the viewer has blocked.
    async fn black_list(&self, user_uid: Uid) -> anyhow::Result<Vec<Uid>>;
}

/// Post reads. Removed posts are never returned by any method.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    async fn max_uid(&self) -> anyhow::Result<Uid>;
    async fn total_count(&self, board_uid: Uid) -> anyhow::Result<u64>;
    /// Every notice of the board, newest first. Not paginated.
    async fn notices(&self, board_uid: Uid) -> anyhow::Result<Vec<PostRow>>;
    /// `scope` only narrows content and image-description searches.
    async fn find(
        &self,
        board_uid: Uid,
        filter: &PostFilter,
        scope: SecretScope,
        window: PageWindow,
    ) -> anyhow::Result<Vec<PostRow>>;
    /// Normal posts across boards, or one board when `board_uid` is non-zero.
    async fn latest(&self, board_uid: Uid, window: PageWindow) -> anyhow::Result<Vec<PostRow>>;
    async fn hashtag_uid(&self, name: &str) -> anyhow::Result<Option<Uid>>;

    /// Any post with the uid, including removed ones so callers can tell
    /// "removed" from "missing".
    async fn post(&self, post_uid: Uid) -> anyhow::Result<Option<PostRow>>;
    /// Largest uid below `post_uid` on the same board, 0 if none.
    async fn prev_uid(&self, board_uid: Uid, post_uid: Uid) -> anyhow::Result<Uid>;
    /// Smallest uid above `post_uid` on the same board, 0 if none.
    async fn next_uid(&self, board_uid: Uid, post_uid: Uid) -> anyhow::Result<Uid>;
    async fn increment_hit(&self, post_uid: Uid) -> anyhow::Result<()>;

    async fn attachments(&self, post_uid: Uid) -> anyhow::Result<Vec<FileRow>>;
    async fn images(&self, post_uid: Uid) -> anyhow::Result<Vec<ImageRow>>;
    async fn thumbnail(&self, file_uid: Uid) -> anyhow::Result<Option<Thumbnail>>;
    async fn exif(&self, file_uid: Uid) -> anyhow::Result<Option<Exif>>;
    async fn image_description(&self, file_uid: Uid) -> anyhow::Result<Option<String>>;
    async fn tags(&self, post_uid: Uid) -> anyhow::Result<Vec<Hashtag>>;
    /// Newest first.
    async fn latest_by_writer(&self, writer_uid: Uid, limit: u64) -> anyhow::Result<Vec<PostRow>>;

    async fn cover_paths(&self, post_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, String>>;
    /// Live (non-removed) comments per post.
    async fn comment_counts(&self, post_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, u64>>;
    async fn like_counts(&self, post_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, u64>>;
    async fn liked_by(&self, post_uids: &[Uid], user_uid: Uid) -> anyhow::Result<HashSet<Uid>>;
}

/// Comment reads. Removed comments are never returned.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn max_uid(&self) -> anyhow::Result<Uid>;
    async fn total_count(&self, post_uid: Uid) -> anyhow::Result<u64>;
    /// Ordered by `reply_uid` ascending, then by the window's uid order.
    async fn thread(&self, post_uid: Uid, window: PageWindow) -> anyhow::Result<Vec<CommentRow>>;
    /// Newest first.
    async fn latest_by_writer(
        &self,
        writer_uid: Uid,
        limit: u64,
    ) -> anyhow::Result<Vec<CommentRow>>;
    async fn like_counts(&self, comment_uids: &[Uid]) -> anyhow::Result<HashMap<Uid, u64>>;
    async fn liked_by(&self, comment_uids: &[Uid], user_uid: Uid) -> anyhow::Result<HashSet<Uid>>;
}

/// Identity and permission contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AccessOracle: Send + Sync {
    async fn is_site_admin(&self, user_uid: Uid) -> anyhow::Result<bool>;
    async fn is_group_admin(&self, group_uid: Uid, user_uid: Uid) -> anyhow::Result<bool>;
    /// `(level, point)` of a registered user.
    async fn level_and_point(&self, user_uid: Uid) -> anyhow::Result<(u32, i64)>;
}

/// Resolves stored file paths to on-disk sizes.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FileResolver: Send + Sync {
    /// Size in bytes; 0 when the file is missing or unreadable.
    async fn file_size(&self, path: &str) -> u64;
}
