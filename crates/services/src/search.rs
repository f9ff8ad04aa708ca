//! # Search Strategy Dispatch
//!
//! Turns `(keyword, option)` into a [`PostFilter`] and sizes the normal
//! window around the notices already on the page.

use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use domains::{
    AppError, Cursor, PageWindow, PostFilter, PostRepo, PostRow, SecretScope, TextField, Uid,
    UserRepo,
};

/// Accepts the numeric code (`4`), its string form (`"4"`) or the name (`"tag"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "OptionCode")]
pub enum SearchOption {
    #[default]
    Title,
    Content,
    Writer,
    Category,
    Tag,
    ImageDescription,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OptionCode {
    Code(u8),
    Name(String),
}

impl TryFrom<OptionCode> for SearchOption {
    type Error = AppError;

    fn try_from(code: OptionCode) -> Result<Self, Self::Error> {
        match code {
            OptionCode::Code(code) => Self::try_from(code),
            OptionCode::Name(name) => name.parse(),
        }
    }
}

impl TryFrom<u8> for SearchOption {
    type Error = AppError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Title),
            1 => Ok(Self::Content),
            2 => Ok(Self::Writer),
            3 => Ok(Self::Category),
            4 => Ok(Self::Tag),
            5 => Ok(Self::ImageDescription),
            other => Err(AppError::InvalidInput(format!("unknown search option {other}"))),
        }
    }
}

impl FromStr for SearchOption {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<u8>() {
            return Self::try_from(code);
        }
        match s.to_ascii_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "content" => Ok(Self::Content),
            "writer" => Ok(Self::Writer),
            "category" => Ok(Self::Category),
            "tag" => Ok(Self::Tag),
            "image" => Ok(Self::ImageDescription),
            other => Err(AppError::InvalidInput(format!("unknown search option '{other}'"))),
        }
    }
}

/// What the dispatcher decided to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    Query(PostFilter),
    /// Decided without a query: the result is empty.
    Nothing,
}

/// Normal rows per page once the notices are placed. Never negative: when
/// notices fill the bunch, no normal row is read.
pub fn normal_limit(bunch: u64, notice_count: u64) -> u64 {
    bunch.saturating_sub(notice_count)
}

/// `page` is 1-based; 0 is read as 1.
pub fn normal_window(cursor: Cursor, page: u32, bunch: u64, notice_count: u64) -> PageWindow {
    let limit = normal_limit(bunch, notice_count);
    let offset = u64::from(page.max(1) - 1) * limit;
    PageWindow::new(cursor, offset, limit)
}

#[derive(Clone)]
pub struct SearchDispatcher {
    pub(crate) posts: Arc<dyn PostRepo>,
    users: Arc<dyn UserRepo>,
    min_keyword_length: usize,
}

impl SearchDispatcher {
    pub fn new(
        posts: Arc<dyn PostRepo>,
        users: Arc<dyn UserRepo>,
        min_keyword_length: usize,
    ) -> Self {
        Self { posts, users, min_keyword_length }
    }

    pub async fn plan(&self, keyword: &str, option: SearchOption) -> domains::Result<Strategy> {
        let keyword = keyword.trim();
        if keyword.chars().count() < self.min_keyword_length {
            return Ok(Strategy::Query(PostFilter::Window));
        }

        let strategy = match option {
            SearchOption::Tag => {
                let mut tag_uids: Vec<Uid> = Vec::new();
                for token in keyword.split_whitespace() {
                    let name = token.trim_start_matches('#');
                    if name.is_empty() {
                        continue;
                    }
                    if let Some(uid) = self.posts.hashtag_uid(name).await? {
                        if !tag_uids.contains(&uid) {
                            tag_uids.push(uid);
                        }
                    }
                }
                Strategy::Query(PostFilter::Tags(tag_uids))
            }
            SearchOption::Writer => match self.users.writer_uid_by_name(keyword).await? {
                Some(writer_uid) => Strategy::Query(PostFilter::Writer(writer_uid)),
                None => Strategy::Nothing,
            },
            // no matching semantics are defined for category search
            SearchOption::Category => Strategy::Nothing,
            SearchOption::ImageDescription => {
                Strategy::Query(PostFilter::ImageDescription(keyword.to_string()))
            }
            SearchOption::Title => {
                Strategy::Query(PostFilter::Text(TextField::Title, keyword.to_string()))
            }
            SearchOption::Content => {
                Strategy::Query(PostFilter::Text(TextField::Content, keyword.to_string()))
            }
        };
        tracing::debug!(?option, ?strategy, "search strategy chosen");
        Ok(strategy)
    }

    pub async fn run(
        &self,
        board_uid: Uid,
        strategy: &Strategy,
        scope: SecretScope,
        window: PageWindow,
    ) -> domains::Result<Vec<PostRow>> {
        match strategy {
            Strategy::Nothing => Ok(Vec::new()),
            Strategy::Query(PostFilter::Tags(tag_uids)) if tag_uids.is_empty() => Ok(Vec::new()),
            _ if window.is_empty() => Ok(Vec::new()),
            Strategy::Query(filter) => {
                Ok(self.posts.find(board_uid, filter, scope, window).await?)
            }
        }
    }

    pub async fn search(
        &self,
        board_uid: Uid,
        keyword: &str,
        option: SearchOption,
        scope: SecretScope,
        window: PageWindow,
    ) -> domains::Result<Vec<PostRow>> {
        let strategy = self.plan(keyword, option).await?;
        self.run(board_uid, &strategy, scope, window).await
    }
}
