use std::sync::Arc;

use domains::{
    MockAccessOracle, MockBoardRepo, MockCommentRepo, MockFileResolver, MockPostRepo,
    MockUserRepo,
};

use crate::Ports;

/// One mock per port; set expectations, then freeze into [`Ports`].
#[derive(Default)]
pub struct MockPorts {
    pub boards: MockBoardRepo,
    pub users: MockUserRepo,
    pub posts: MockPostRepo,
    pub comments: MockCommentRepo,
    pub access: MockAccessOracle,
    pub files: MockFileResolver,
}

impl MockPorts {
    pub fn into_ports(self) -> Ports {
        Ports {
            boards: Arc::new(self.boards),
            users: Arc::new(self.users),
            posts: Arc::new(self.posts),
            comments: Arc::new(self.comments),
            access: Arc::new(self.access),
            files: Arc::new(self.files),
        }
    }
}
