//! Output directory layout
//!
//! ```text
//! <root>/html/<bucket>/<name>.html
//! <root>/pdf/<bucket>/<name>.pdf
//! ```
//!
//! The root bucket is the empty name, so its files sit directly under
//! `html/` and `pdf/`.

use std::path::PathBuf;

use tokio::fs;
use tracing::debug;

use crate::config::ArchiveConfig;
use crate::error::Result;

const HTML_DIR: &str = "html";
const PDF_DIR: &str = "pdf";

/// Owns the output tree; every directory is created up front by `ensure`
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
    buckets: Vec<String>,
}

impl StorageLayout {
    /// Layout rooted at `root` with one subdirectory per bucket
    pub fn new(root: impl Into<PathBuf>, buckets: Vec<String>) -> Self {
        Self {
            root: root.into(),
            buckets,
        }
    }

    /// Layout for the configured output root and catalog buckets
    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(
            config.save_dir_root.clone(),
            config.buckets().into_iter().map(String::from).collect(),
        )
    }

    /// Every directory the archive writes into
    pub fn directories(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::with_capacity(2 * (self.buckets.len() + 1));
        for kind in [HTML_DIR, PDF_DIR] {
            let base = self.root.join(kind);
            dirs.push(base.clone());
            dirs.extend(self.buckets.iter().map(|bucket| base.join(bucket)));
        }
        dirs
    }

    /// Create the whole tree; existing directories are left untouched
    pub async fn ensure(&self) -> Result<()> {
        for dir in self.directories() {
            debug!("Ensuring directory {}", dir.display());
            fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }

    /// Destination of a page's cleaned HTML
    pub fn html_path(&self, bucket: &str, name: &str) -> PathBuf {
        self.root
            .join(HTML_DIR)
            .join(bucket)
            .join(format!("{}.html", name))
    }

    /// Destination of a page's PDF snapshot
    pub fn pdf_path(&self, bucket: &str, name: &str) -> PathBuf {
        self.root
            .join(PDF_DIR)
            .join(bucket)
            .join(format!("{}.pdf", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn buckets(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_paths_with_bucket() {
        let layout = StorageLayout::new("/archive", buckets(&["blog"]));
        assert_eq!(
            layout.html_path("blog", "post"),
            Path::new("/archive/html/blog/post.html")
        );
        assert_eq!(
            layout.pdf_path("blog", "post"),
            Path::new("/archive/pdf/blog/post.pdf")
        );
    }

    #[test]
    fn test_root_bucket_collapses() {
        let layout = StorageLayout::new("/archive", Vec::new());
        assert_eq!(layout.html_path("", "index"), Path::new("/archive/html/index.html"));
        assert_eq!(layout.pdf_path("", "index"), Path::new("/archive/pdf/index.pdf"));
    }

    #[test]
    fn test_directories() {
        let layout = StorageLayout::new("/archive", buckets(&["blog", "docs"]));
        let dirs = layout.directories();
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/archive/html"),
                PathBuf::from("/archive/html/blog"),
                PathBuf::from("/archive/html/docs"),
                PathBuf::from("/archive/pdf"),
                PathBuf::from("/archive/pdf/blog"),
                PathBuf::from("/archive/pdf/docs"),
            ]
        );
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path(), buckets(&["blog"]));

        layout.ensure().await.unwrap();
        let existing = layout.html_path("blog", "kept");
        fs::write(&existing, "<p>kept</p>").await.unwrap();

        layout.ensure().await.unwrap();

        for path in layout.directories() {
            assert!(path.is_dir(), "{} missing", path.display());
        }
        assert_eq!(fs::read_to_string(&existing).await.unwrap(), "<p>kept</p>");
    }

    #[tokio::test]
    async fn test_ensure_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path().join("nested/out"), Vec::new());
        layout.ensure().await.unwrap();
        assert!(dir.path().join("nested/out/html").is_dir());
        assert!(dir.path().join("nested/out/pdf").is_dir());
    }
}
