//! # Keyset Pagination
//!
//! Every listing is addressed by a boundary uid and a direction rather than
//! a numeric offset, so inserts above the cursor never shift a page.
//!
//! | Direction | Predicate          | Order      |
//! |-----------|--------------------|------------|
//! | `Next`    | `uid < since_uid`  | descending |
//! | `Prev`    | `uid > since_uid`  | ascending  |

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Uid;

/// Browse direction relative to uid ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward newer items.
    Prev,
    /// Toward older items; the default browsing direction.
    #[default]
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Less,
    Greater,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl Direction {
    pub fn comparator(self) -> Comparator {
        match self {
            Self::Next => Comparator::Less,
            Self::Prev => Comparator::Greater,
        }
    }

    pub fn order(self) -> SortOrder {
        match self {
            Self::Next => SortOrder::Descending,
            Self::Prev => SortOrder::Ascending,
        }
    }
}

impl FromStr for Direction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "next" | "" => Ok(Self::Next),
            "prev" => Ok(Self::Prev),
            other => Err(AppError::InvalidInput(format!("unknown direction '{other}'"))),
        }
    }
}

/// Boundary of the last-seen page. Not persisted; derived per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    pub since_uid: Uid,
    pub direction: Direction,
}

impl Cursor {
    pub fn new(since_uid: Uid, direction: Direction) -> Self {
        Self { since_uid, direction }
    }

    /// Replaces a zero boundary with `max_uid + 1` so the first page starts
    /// at the newest item.
    pub fn resolve(self, max_uid: Uid) -> Self {
        if self.since_uid == 0 {
            Self { since_uid: max_uid.saturating_add(1), ..self }
        } else {
            self
        }
    }

    pub fn admits(&self, uid: Uid) -> bool {
        match self.direction.comparator() {
            Comparator::Less => uid < self.since_uid,
            Comparator::Greater => uid > self.since_uid,
        }
    }

    /// Orders uids the way this cursor's direction reads them.
    pub fn compare(&self, a: Uid, b: Uid) -> std::cmp::Ordering {
        match self.direction.order() {
            SortOrder::Ascending => a.cmp(&b),
            SortOrder::Descending => b.cmp(&a),
        }
    }
}

/// A resolved cursor plus the offset/limit slice applied after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageWindow {
    pub cursor: Cursor,
    pub offset: u64,
    pub limit: u64,
}

impl PageWindow {
    pub fn new(cursor: Cursor, offset: u64, limit: u64) -> Self {
        Self { cursor, offset, limit }
    }

    /// A window that can never yield rows.
    pub fn is_empty(&self) -> bool {
        self.limit == 0
    }

    /// Applies offset and limit to rows already filtered by the cursor and
    /// sorted in its order. For stores without native paging.
    pub fn slice<T>(&self, rows: Vec<T>) -> Vec<T> {
        rows.into_iter()
            .skip(usize::try_from(self.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_boundary_starts_at_the_newest_item() {
        let cursor = Cursor::new(0, Direction::Next).resolve(5);
        assert_eq!(cursor.since_uid, 6);
        assert!(cursor.admits(5));
        assert!(!cursor.admits(6));
    }

    #[test]
    fn explicit_boundary_is_kept() {
        let cursor = Cursor::new(4, Direction::Next).resolve(10);
        assert_eq!(cursor.since_uid, 4);
        assert!(cursor.admits(3));
        assert!(!cursor.admits(4));
    }

    #[test]
    fn prev_reads_forward_in_time() {
        let cursor = Cursor::new(3, Direction::Prev);
        assert!(cursor.admits(4));
        assert!(!cursor.admits(3));
        let mut uids = vec![9, 4, 7];
        uids.sort_by(|a, b| cursor.compare(*a, *b));
        assert_eq!(uids, vec![4, 7, 9]);
    }

    #[test]
    fn next_sorts_descending() {
        let cursor = Cursor::new(10, Direction::Next);
        let mut uids = vec![1, 8, 3];
        uids.sort_by(|a, b| cursor.compare(*a, *b));
        assert_eq!(uids, vec![8, 3, 1]);
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("PREV".parse::<Direction>().unwrap(), Direction::Prev);
        assert_eq!("".parse::<Direction>().unwrap(), Direction::Next);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn window_slices_offset_then_limit() {
        let window = PageWindow::new(Cursor::default(), 2, 2);
        assert_eq!(window.slice(vec![1, 2, 3, 4, 5]), vec![3, 4]);
        assert!(PageWindow::new(Cursor::default(), 0, 0).is_empty());
    }
}
