//! # Domain Models
//!
//! Raw rows as the storage layer hands them over, plus the board
//! configuration every listing is attached to. All ids are unsigned and
//! all timestamps are milliseconds since the Unix epoch.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Storage-assigned identifier, monotonic per table.
pub type Uid = u64;

/// Lifecycle state shared by posts and comments.
///
/// Nothing is ever physically deleted: removal is a transition to
/// [`Status::Removed`], and removed rows are invisible to every read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    Removed,
    #[default]
    Normal,
    /// Pinned post, shown on every page of its board.
    Notice,
    /// Readable only by the writer and admins.
    Secret,
}

impl Status {
    pub fn code(self) -> i8 {
        match self {
            Self::Removed => -1,
            Self::Normal => 0,
            Self::Notice => 1,
            Self::Secret => 2,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(Self::Removed),
            0 => Some(Self::Normal),
            1 => Some(Self::Notice),
            2 => Some(Self::Secret),
            _ => None,
        }
    }

    pub fn is_removed(self) -> bool {
        self == Self::Removed
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.code())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i8::deserialize(deserializer)?;
        Self::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown status code {code}")))
    }
}

/// A post exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PostRow {
    pub uid: Uid,
    pub board_uid: Uid,
    pub writer_uid: Uid,
    /// 0 when the board does not use categories
    pub category_uid: Uid,
    pub title: String,
    pub content: String,
    pub submitted: u64,
    pub modified: u64,
    pub hit: u64,
    pub status: Status,
}

/// A comment exactly as stored.
///
/// `reply_uid` is 0 for top-level comments, otherwise the uid of the
/// comment being replied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommentRow {
    pub uid: Uid,
    pub reply_uid: Uid,
    pub post_uid: Uid,
    pub board_uid: Uid,
    pub writer_uid: Uid,
    pub content: String,
    pub submitted: u64,
    pub modified: u64,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub uid: Uid,
    pub board_uid: Uid,
    pub name: String,
}

/// `{uid, name}` projection of a category. Uid 0 with an empty name stands
/// for "no category".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CategoryRef {
    pub uid: Uid,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardType {
    #[default]
    Board,
    Gallery,
    Blog,
    Shop,
}

impl BoardType {
    pub fn code(self) -> u8 {
        match self {
            Self::Board => 0,
            Self::Gallery => 1,
            Self::Blog => 2,
            Self::Shop => 3,
        }
    }

    /// Unknown codes fall back to a plain board.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Gallery,
            2 => Self::Blog,
            3 => Self::Shop,
            _ => Self::Board,
        }
    }
}

impl Serialize for BoardType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for BoardType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u8::deserialize(deserializer).map(Self::from_code)
    }
}

/// Minimum user level per action. Write, comment and download are never
/// below 1; that is enforced when a board is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LevelThresholds {
    pub list: u32,
    pub view: u32,
    pub write: u32,
    pub comment: u32,
    pub download: u32,
}

/// Point cost per action. Negative values are charges, positive rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PointCosts {
    pub view: i64,
    pub write: i64,
    pub comment: i64,
    pub download: i64,
}

/// Board-level actions subject to level and point gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardAction {
    List,
    View,
    Write,
    Comment,
    Download,
}

/// Per-board settings, attached to list and view results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BoardConfig {
    pub uid: Uid,
    /// URL slug
    pub id: String,
    pub group_uid: Uid,
    pub admin_uid: Uid,
    #[serde(rename = "type")]
    pub board_type: BoardType,
    pub name: String,
    pub info: String,
    /// Default page size
    pub row_count: u32,
    pub width: u32,
    pub use_category: bool,
    pub categories: Vec<CategoryRef>,
    pub level: LevelThresholds,
    pub point: PointCosts,
}

impl BoardConfig {
    pub fn level_for(&self, action: BoardAction) -> u32 {
        match action {
            BoardAction::List => self.level.list,
            BoardAction::View => self.level.view,
            BoardAction::Write => self.level.write,
            BoardAction::Comment => self.level.comment,
            BoardAction::Download => self.level.download,
        }
    }

    /// Listing carries no point cost.
    pub fn point_for(&self, action: BoardAction) -> i64 {
        match action {
            BoardAction::List => 0,
            BoardAction::View => self.point.view,
            BoardAction::Write => self.point.write,
            BoardAction::Comment => self.point.comment,
            BoardAction::Download => self.point.download,
        }
    }

    pub fn basic(&self) -> BoardBasic {
        BoardBasic {
            uid: self.uid,
            id: self.id.clone(),
            name: self.name.clone(),
            board_type: self.board_type,
        }
    }
}

/// The slice of a board's config carried by cross-board items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BoardBasic {
    pub uid: Uid,
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub board_type: BoardType,
}

/// Read-only writer projection joined into every enriched row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Writer {
    pub uid: Uid,
    pub name: String,
    pub profile: String,
    pub signature: String,
}

/// One like row per `(board, target, user)`. Unliking flips `liked`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LikeRecord {
    pub board_uid: Uid,
    pub target_uid: Uid,
    pub user_uid: Uid,
    pub liked: bool,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Hashtag {
    pub uid: Uid,
    pub name: String,
}

/// A file row attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FileRow {
    pub uid: Uid,
    pub post_uid: Uid,
    pub name: String,
    pub path: String,
}

/// An image row attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageRow {
    pub uid: Uid,
    pub file_uid: Uid,
    pub post_uid: Uid,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Thumbnail {
    pub small: String,
    pub large: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Exif {
    pub make: String,
    pub model: String,
    pub aperture: u32,
    pub iso: u32,
    pub focal_length: u32,
    pub exposure: u32,
    pub width: u32,
    pub height: u32,
    pub date: u64,
}
