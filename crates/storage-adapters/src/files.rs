//! # Local file resolver
//! Resolves attachment paths against the upload root on the local disk.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use domains::FileResolver;
use tokio::fs;

pub struct LocalFileResolver {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root_path: PathBuf,
}

impl LocalFileResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root_path: root.into() }
    }

    /// Stored paths are absolute URL paths ("/attach/a.zip"); they are
    /// re-rooted under the upload root. Parent components are rejected.
    fn resolve(&self, stored: &str) -> Option<PathBuf> {
        let relative = Path::new(stored.trim_start_matches('/'));
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root_path.join(relative))
    }
}

#[async_trait]
impl FileResolver for LocalFileResolver {
    async fn file_size(&self, path: &str) -> u64 {
        let Some(full_path) = self.resolve(path) else {
            tracing::warn!(path, "rejected attachment path");
            return 0;
        };
        match fs::metadata(&full_path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => 0,
            Err(err) => {
                tracing::debug!(path, error = %err, "attachment missing on disk");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("boardfeed-{name}-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("attach")).unwrap();
        dir
    }

    #[tokio::test]
    async fn reports_size_of_existing_file() {
        let root = scratch_dir("size");
        std::fs::write(root.join("attach/a.txt"), b"hello").unwrap();
        let resolver = LocalFileResolver::new(&root);
        assert_eq!(resolver.file_size("/attach/a.txt").await, 5);
        assert_eq!(resolver.file_size("/attach/missing.txt").await, 0);
        std::fs::remove_dir_all(root).unwrap();
    }

    #[tokio::test]
    async fn refuses_to_leave_the_root() {
        let root = scratch_dir("escape");
        let resolver = LocalFileResolver::new(&root);
        assert_eq!(resolver.file_size("/../etc/passwd").await, 0);
        assert_eq!(resolver.file_size("/attach").await, 0);
        std::fs::remove_dir_all(root).unwrap();
    }
}
