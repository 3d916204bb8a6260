use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// Per-render scratch directory under the configured work root. Removed on
/// drop; cleanup is best-effort (a failed removal is ignored, not an error).
pub struct ScratchDir {
    _dir: TempDir,
    path: PathBuf,
}

impl ScratchDir {
    pub fn create(root: &Path, render_id: &str) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create work root '{}'", root.display()))?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("{render_id}_"))
            .tempdir_in(root)
            .with_context(|| {
                format!("Failed to create scratch directory under '{}'", root.display())
            })?;
        let path = dir.path().to_path_buf();
        Ok(Self { _dir: dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_is_keyed_by_render_id_and_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create(root.path(), "video_1").unwrap();
        let path = scratch.path().to_path_buf();
        assert!(path.exists());
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("video_1_")
        );
        fs::write(scratch.file("video_1_audio.mp3"), b"x").unwrap();
        drop(scratch);
        assert!(!path.exists());
    }
}
