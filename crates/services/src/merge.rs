//! # Notice/Normal Merge
//!
//! Notices are read in full for the board before anything else and appear
//! on every page of every search. The normal window then gets only what
//! is left of the bunch.

use domains::{Cursor, PostRow, SecretScope, Uid};

use crate::search::{normal_window, SearchDispatcher, SearchOption};

/// One page of a board listing, before enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergedPage {
    pub notices: Vec<PostRow>,
    pub posts: Vec<PostRow>,
}

impl MergedPage {
    /// Notices first in their own order, then the normal rows.
    pub fn into_rows(self) -> (usize, Vec<PostRow>) {
        let notice_count = self.notices.len();
        let mut rows = self.notices;
        rows.extend(self.posts);
        (notice_count, rows)
    }
}

pub struct PageRequest<'a> {
    pub board_uid: Uid,
    pub keyword: &'a str,
    pub option: SearchOption,
    pub page: u32,
    pub bunch: u64,
    /// Already resolved against the current max uid
    pub cursor: Cursor,
    pub scope: SecretScope,
}

impl SearchDispatcher {
    /// Every notice of the board; not paginated.
    pub async fn notices(&self, board_uid: Uid) -> domains::Result<Vec<PostRow>> {
        Ok(self.posts.notices(board_uid).await?)
    }

    pub async fn merged_page(&self, request: PageRequest<'_>) -> domains::Result<MergedPage> {
        let notices = self.notices(request.board_uid).await?;
        let notice_count = u64::try_from(notices.len()).unwrap_or(u64::MAX);
        let window = normal_window(request.cursor, request.page, request.bunch, notice_count);
        let posts = self
            .search(request.board_uid, request.keyword, request.option, request.scope, window)
            .await?;
        Ok(MergedPage { notices, posts })
    }
}
