//! # Comment Thread Assembler

use serde::Deserialize;

use domains::{BoardAction, CommentListResult, Cursor, Direction, PageWindow, Uid};

use crate::FeedService;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommentQuery {
    pub board_uid: Uid,
    pub post_uid: Uid,
    pub since_uid: Uid,
    pub direction: Direction,
    pub bunch: u32,
    pub viewer_uid: Uid,
}

impl FeedService {
    /// One page of a post's comments, replies grouped after ascending
    /// `reply_uid` and siblings ordered by the cursor.
    #[tracing::instrument(
        skip_all,
        fields(board_uid = query.board_uid, post_uid = query.post_uid, since_uid = query.since_uid)
    )]
    pub async fn list_comments(&self, query: &CommentQuery) -> domains::Result<CommentListResult> {
        let config = self.board_config(query.board_uid).await?;
        let clearance = self
            .policy
            .authorize(query.viewer_uid, &config, BoardAction::View)
            .await?;
        self.readable_post(query.board_uid, query.post_uid, &clearance)
            .await?;

        let bunch = self.config.bunch(query.bunch, config.row_count);
        let max_uid = self.ports.comments.max_uid().await?;
        let cursor = Cursor::new(query.since_uid, query.direction).resolve(max_uid);
        let (rows, total_comment_count) = tokio::try_join!(
            self.ports
                .comments
                .thread(query.post_uid, PageWindow::new(cursor, 0, bunch)),
            self.ports.comments.total_count(query.post_uid),
        )?;
        let comments = self.enricher.comments(rows, query.viewer_uid).await;

        Ok(CommentListResult {
            board_uid: query.board_uid,
            since_uid: cursor.since_uid,
            total_comment_count,
            comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use domains::{BoardConfig, CommentRow, PostRow, Status};

    use crate::testing::MockPorts;
    use crate::EngineConfig;

    fn board() -> BoardConfig {
        BoardConfig { uid: 1, row_count: 20, ..Default::default() }
    }

    #[tokio::test]
    async fn zero_since_resolves_to_max_plus_one() {
        let mut mocks = MockPorts::default();
        mocks.boards.expect_board_config().returning(|_| Ok(Some(board())));
        mocks.posts.expect_post().returning(|_| {
            Ok(Some(PostRow { uid: 3, board_uid: 1, ..Default::default() }))
        });
        mocks.comments.expect_max_uid().returning(|| Ok(50));
        mocks
            .comments
            .expect_thread()
            .withf(|post_uid, window| {
                *post_uid == 3 && window.cursor.since_uid == 51 && window.limit == 20
            })
            .returning(|_, _| {
                Ok(vec![
                    CommentRow { uid: 50, post_uid: 3, writer_uid: 8, ..Default::default() },
                    CommentRow { uid: 49, reply_uid: 2, post_uid: 3, ..Default::default() },
                ])
            });
        mocks.comments.expect_total_count().returning(|_| Ok(2));
        mocks.users.expect_writers().returning(|_| Ok(HashMap::new()));
        mocks.comments.expect_like_counts().returning(|_| Ok(HashMap::new()));
        mocks.comments.expect_liked_by().never();
        let service = FeedService::new(mocks.into_ports(), EngineConfig::default());

        let query = CommentQuery { board_uid: 1, post_uid: 3, ..Default::default() };
        let result = service.list_comments(&query).await.unwrap();
        assert_eq!(result.since_uid, 51);
        assert_eq!(result.total_comment_count, 2);
        assert_eq!(result.comments.iter().map(|c| c.uid).collect::<Vec<_>>(), vec![50, 49]);
    }

    #[tokio::test]
    async fn removed_post_has_no_thread() {
        let mut mocks = MockPorts::default();
        mocks.boards.expect_board_config().returning(|_| Ok(Some(board())));
        mocks.posts.expect_post().returning(|_| {
            Ok(Some(PostRow {
                uid: 3,
                board_uid: 1,
                status: Status::Removed,
                ..Default::default()
            }))
        });
        mocks.comments.expect_thread().never();
        let service = FeedService::new(mocks.into_ports(), EngineConfig::default());

        let query = CommentQuery { board_uid: 1, post_uid: 3, ..Default::default() };
        assert_eq!(service.list_comments(&query).await.unwrap_err().kind(), "not_found");
    }

    #[tokio::test]
    async fn secret_thread_is_gated() {
        let mut mocks = MockPorts::default();
        mocks.boards.expect_board_config().returning(|_| Ok(Some(board())));
        mocks.access.expect_is_site_admin().returning(|_| Ok(false));
        mocks.posts.expect_post().returning(|_| {
            Ok(Some(PostRow {
                uid: 3,
                board_uid: 1,
                writer_uid: 42,
                status: Status::Secret,
                ..Default::default()
            }))
        });
        mocks.comments.expect_max_uid().returning(|| Ok(0));
        mocks.comments.expect_thread().returning(|_, _| Ok(Vec::new()));
        mocks.comments.expect_total_count().returning(|_| Ok(0));
        let service = FeedService::new(mocks.into_ports(), EngineConfig::default());

        let stranger =
            CommentQuery { board_uid: 1, post_uid: 3, viewer_uid: 7, ..Default::default() };
        let err = service.list_comments(&stranger).await.unwrap_err();
        assert_eq!(err.kind(), "forbidden");

        let writer = CommentQuery { viewer_uid: 42, ..stranger };
        let result = service.list_comments(&writer).await.unwrap();
        assert!(result.comments.is_empty());
    }
}
