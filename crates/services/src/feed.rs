//! # Feed Assembler
//!
//! Board listings (notices + searched/normal window) and the cross-board
//! home feed.

use std::collections::HashSet;

use serde::Deserialize;

use domains::{
    BoardAction, BoardListResult, Cursor, Direction, HomeFeedResult, HomeItem, PageWindow, Uid,
};

use crate::enrich::{degrade, distinct};
use crate::merge::PageRequest;
use crate::search::SearchOption;
use crate::FeedService;

/// A board list or search request. `since_uid = 0` starts at the newest post.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListQuery {
    pub board_uid: Uid,
    pub keyword: String,
    pub option: SearchOption,
    /// 1-based; offsets the normal window within the cursor range
    pub page: u32,
    /// 0 uses the board's row count
    pub bunch: u32,
    pub since_uid: Uid,
    pub direction: Direction,
    pub viewer_uid: Uid,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HomeQuery {
    /// 0 reads every board
    pub board_uid: Uid,
    pub bunch: u32,
    pub since_uid: Uid,
    pub direction: Direction,
    pub viewer_uid: Uid,
}

impl FeedService {
    async fn black_list(&self, viewer_uid: Uid) -> anyhow::Result<Vec<Uid>> {
        if viewer_uid == 0 {
            return Ok(Vec::new());
        }
        self.ports.users.black_list(viewer_uid).await
    }

    #[tracing::instrument(
        skip_all,
        fields(board_uid = query.board_uid, viewer_uid = query.viewer_uid, option = ?query.option)
    )]
    pub async fn list_board(&self, query: &ListQuery) -> domains::Result<BoardListResult> {
        let config = self.board_config(query.board_uid).await?;
        let clearance = self
            .policy
            .authorize(query.viewer_uid, &config, BoardAction::List)
            .await?;

        let bunch = self.config.bunch(query.bunch, config.row_count);
        let max_uid = self.ports.posts.max_uid().await?;
        let cursor = Cursor::new(query.since_uid, query.direction).resolve(max_uid);

        let page = self
            .dispatcher
            .merged_page(PageRequest {
                board_uid: query.board_uid,
                keyword: &query.keyword,
                option: query.option,
                page: query.page,
                bunch,
                cursor,
                scope: clearance.secret_scope(),
            })
            .await?;
        let (total_post_count, black_list) = tokio::try_join!(
            self.ports.posts.total_count(query.board_uid),
            self.black_list(query.viewer_uid),
        )?;

        let (notice_count, rows) = page.into_rows();
        let sealed: HashSet<Uid> = rows
            .iter()
            .filter(|row| !clearance.can_read(row.status, row.writer_uid))
            .map(|row| row.uid)
            .collect();
        let mut notices = self.enricher.posts(rows, query.viewer_uid).await;
        let mut posts = notices.split_off(notice_count);
        // secret posts keep their title in lists; the body stays with the post view
        for item in posts.iter_mut().filter(|item| sealed.contains(&item.uid)) {
            item.content.clear();
            item.cover.clear();
        }
        tracing::debug!(notices = notices.len(), posts = posts.len(), "board page assembled");

        Ok(BoardListResult {
            total_post_count,
            config,
            notices,
            posts,
            black_list,
            is_admin: clearance.is_admin,
        })
    }

    /// Latest normal posts, each tagged with its board.
    #[tracing::instrument(skip_all, fields(board_uid = query.board_uid))]
    pub async fn home_feed(&self, query: &HomeQuery) -> domains::Result<HomeFeedResult> {
        let mut row_count = 0;
        if query.board_uid > 0 {
            let config = self.board_config(query.board_uid).await?;
            self.policy
                .authorize(query.viewer_uid, &config, BoardAction::List)
                .await?;
            row_count = config.row_count;
        }

        let bunch = self.config.bunch(query.bunch, row_count);
        let max_uid = self.ports.posts.max_uid().await?;
        let cursor = Cursor::new(query.since_uid, query.direction).resolve(max_uid);
        let rows = self
            .ports
            .posts
            .latest(query.board_uid, PageWindow::new(cursor, 0, bunch))
            .await?;

        let board_uids = distinct(rows.iter().map(|row| row.board_uid));
        let (posts, boards) = tokio::join!(
            self.enricher.posts(rows, query.viewer_uid),
            self.ports.boards.board_basics(&board_uids),
        );
        let boards = degrade("board basics", boards);

        let items = posts
            .into_iter()
            .map(|post| HomeItem {
                board: boards.get(&post.board_uid).cloned().unwrap_or_default(),
                post,
            })
            .collect();
        Ok(HomeFeedResult { items })
    }
}
