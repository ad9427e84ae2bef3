use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::api::Backend;

const FALLBACK_NAME: &str = "track.wav";

/// Ensure the download directory exists.
pub async fn ensure_download_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("failed to create download directory {}", path.display()))
}

/// Fetch a backend link and store it under a sanitized name inside `dir`.
pub async fn save_download<B>(backend: &B, url: &str, filename: &str, dir: &Path) -> Result<PathBuf>
where
    B: Backend + ?Sized,
{
    let bytes = backend
        .download(url)
        .await
        .with_context(|| format!("failed to download {url}"))?;

    ensure_download_dir(dir).await?;

    let mut name = sanitize_filename::sanitize(filename);
    if name.trim().is_empty() {
        name = FALLBACK_NAME.to_string();
    }
    let target = dir.join(name);

    tokio::fs::write(&target, &bytes)
        .await
        .with_context(|| format!("failed to write {}", target.display()))?;

    info!(file = %target.display(), bytes = bytes.len(), "track saved");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeBackend};
    use tempfile::tempdir;

    #[tokio::test]
    async fn saves_under_sanitized_name() {
        let dir = tempdir().unwrap();
        let backend = FakeBackend::default().with_download(Ok(b"RIFF".to_vec()));

        let path = save_download(
            &backend,
            "/download/master.wav",
            "../master:pop.wav",
            &dir.path().join("out"),
        )
        .await
        .unwrap();

        assert!(path.starts_with(dir.path().join("out")));
        assert_eq!(std::fs::read(&path).unwrap(), b"RIFF");
        assert_eq!(
            backend.calls(),
            vec![Call::Download("/download/master.wav".to_string())]
        );
    }

    #[tokio::test]
    async fn failed_fetch_writes_nothing() {
        let dir = tempdir().unwrap();
        let backend = FakeBackend::default().with_download(Err("404"));

        let result = save_download(&backend, "/download/x.wav", "x.wav", dir.path()).await;

        assert!(result.is_err());
        assert!(!dir.path().join("x.wav").exists());
    }
}
