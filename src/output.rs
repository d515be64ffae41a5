//! Output file placement.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Resolve the directory recordings land in: the configured root if any,
/// otherwise the platform Videos directory, otherwise `~/Videos`.
pub fn output_root(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(root) = configured {
        return Ok(root.to_path_buf());
    }
    dirs::video_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Videos")))
        .context("No usable output directory; pass --output-root")
}

/// Create the session's output path under `root`, named after the wall
/// clock so successive sessions never collide.
pub fn session_path(root: &Path, extension: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(root)
        .with_context(|| format!("Failed to create output directory: {}", root.display()))?;
    let name = format!(
        "{}.{extension}",
        chrono::Local::now().format("Capture_%Y-%m-%d_%H-%M-%S")
    );
    Ok(root.join(name))
}
