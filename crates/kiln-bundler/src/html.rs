//! HTML stage: publish the template `index.html` into an output directory.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// File name of the entry document.
pub const INDEX_HTML_NAME: &str = "index.html";

/// Copy `public_dir/index.html` to `out_dir/index.html`.
///
/// Creates `out_dir` when it does not exist yet. Returns the written path.
pub async fn copy_index_html(public_dir: &Path, out_dir: &Path) -> Result<PathBuf> {
    let source = public_dir.join(INDEX_HTML_NAME);
    if !tokio::fs::try_exists(&source).await? {
        return Err(Error::MissingInput(source));
    }

    tokio::fs::create_dir_all(out_dir).await?;
    let target = out_dir.join(INDEX_HTML_NAME);
    tokio::fs::copy(&source, &target).await?;

    tracing::debug!(from = %source.display(), to = %target.display(), "Copied index.html");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_copy_creates_out_dir() {
        let temp = TempDir::new().unwrap();
        let public = temp.path().join("public");
        std::fs::create_dir_all(&public).unwrap();
        std::fs::write(public.join("index.html"), "<html><body></body></html>").unwrap();

        let out = temp.path().join("build");
        let written = copy_index_html(&public, &out).await.unwrap();

        assert_eq!(written, out.join("index.html"));
        assert_eq!(
            std::fs::read_to_string(written).unwrap(),
            "<html><body></body></html>"
        );
    }

    #[tokio::test]
    async fn test_copy_missing_template() {
        let temp = TempDir::new().unwrap();

        let err = copy_index_html(temp.path(), &temp.path().join("build"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }
}
