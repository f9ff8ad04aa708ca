//! # services
//!
//! The feed engine: resolves list and search requests into cursor-paginated
//! pages, merges notices, enriches rows and composes post and comment views.
//! It holds no cross-request mutable state; everything it reads goes through
//! the injected [`Ports`].

use std::sync::Arc;

use domains::{
    AccessOracle, AppError, BoardConfig, BoardRepo, CommentRepo, FileResolver, PostRepo, Uid,
    UserRepo,
};

pub mod comments;
pub mod config;
pub mod enrich;
pub mod feed;
pub mod merge;
pub mod policy;
pub mod search;
pub mod view;

#[cfg(test)]
mod testing;

pub use comments::CommentQuery;
pub use config::EngineConfig;
pub use feed::{HomeQuery, ListQuery};
pub use search::SearchOption;
pub use view::ViewQuery;

use enrich::Enricher;
use policy::AccessPolicy;
use search::SearchDispatcher;

/// The collaborators the engine reads through.
#[derive(Clone)]
pub struct Ports {
    pub boards: Arc<dyn BoardRepo>,
    pub users: Arc<dyn UserRepo>,
    pub posts: Arc<dyn PostRepo>,
    pub comments: Arc<dyn CommentRepo>,
    pub access: Arc<dyn AccessOracle>,
    pub files: Arc<dyn FileResolver>,
}

#[derive(Clone)]
pub struct FeedService {
    ports: Ports,
    config: EngineConfig,
    policy: AccessPolicy,
    enricher: Enricher,
    dispatcher: SearchDispatcher,
}

impl FeedService {
    pub fn new(ports: Ports, config: EngineConfig) -> Self {
        let policy = AccessPolicy::new(ports.access.clone());
        let enricher = Enricher::new(&ports);
        let dispatcher = SearchDispatcher::new(
            ports.posts.clone(),
            ports.users.clone(),
            config.min_keyword_length,
        );
        Self { ports, config, policy, enricher, dispatcher }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolves a board slug to its uid.
    pub async fn board_uid(&self, id: &str) -> domains::Result<Uid> {
        match self.ports.boards.board_uid_by_id(id).await? {
            Some(uid) if uid > 0 => Ok(uid),
            _ => Err(AppError::not_found("board", id)),
        }
    }

    async fn board_config(&self, board_uid: Uid) -> domains::Result<BoardConfig> {
        self.ports
            .boards
            .board_config(board_uid)
            .await?
            .ok_or_else(|| AppError::not_found("board", board_uid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPorts;

    #[tokio::test]
    async fn unknown_slug_is_not_found() {
        let mut mocks = MockPorts::default();
        mocks.boards.expect_board_uid_by_id().returning(|_| Ok(None));
        let service = FeedService::new(mocks.into_ports(), EngineConfig::default());
        let err = service.board_uid("nope").await.unwrap_err();
        assert_eq!(err.to_string(), "board not found with uid nope");
    }

    #[tokio::test]
    async fn slug_resolves() {
        let mut mocks = MockPorts::default();
        mocks.boards.expect_board_uid_by_id().returning(|_| Ok(Some(4)));
        let service = FeedService::new(mocks.into_ports(), EngineConfig::default());
        assert_eq!(service.board_uid("free").await.unwrap(), 4);
    }
}
