//! Read-mostly engine settings, built once and handed to [`crate::FeedService::new`].

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Page size when neither the request nor the board names one
    pub default_bunch: u32,
    pub max_bunch: u32,
    /// Keywords shorter than this (in chars) fall back to the plain window
    pub min_keyword_length: usize,
    /// Upper bound for the author digest on the post view
    pub writer_latest_limit: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_bunch: 20,
            max_bunch: 100,
            min_keyword_length: 2,
            writer_latest_limit: 10,
        }
    }
}

impl EngineConfig {
    /// Effective page size: the request's, else the board's row count, else
    /// the default; always clamped to `1..=max_bunch`.
    pub fn bunch(&self, requested: u32, board_row_count: u32) -> u64 {
        let bunch = [requested, board_row_count, self.default_bunch]
            .into_iter()
            .find(|n| *n > 0)
            .unwrap_or(1);
        u64::from(bunch.clamp(1, self.max_bunch.max(1)))
    }

    pub fn latest_limit(&self, requested: u64) -> u64 {
        requested.min(self.writer_latest_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bunch_prefers_request_then_board_then_default() {
        let config = EngineConfig::default();
        assert_eq!(config.bunch(5, 15), 5);
        assert_eq!(config.bunch(0, 15), 15);
        assert_eq!(config.bunch(0, 0), 20);
    }

    #[test]
    fn bunch_is_clamped() {
        let config = EngineConfig { max_bunch: 50, ..Default::default() };
        assert_eq!(config.bunch(500, 0), 50);
    }

    #[test]
    fn latest_limit_never_exceeds_the_cap() {
        let config = EngineConfig::default();
        assert_eq!(config.latest_limit(3), 3);
        assert_eq!(config.latest_limit(99), 10);
    }
}
