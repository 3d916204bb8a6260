use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_VIDEO_SEARCH_ENDPOINT: &str = "https://pixabay.com/api/videos/";
const DEFAULT_IMAGE_SEARCH_ENDPOINT: &str = "https://pixabay.com/api/";
const DEFAULT_TTS_ENDPOINT: &str = "https://murf.ai/Prod/anonymous-tts/audio";

/// Collaborator endpoints, credentials and working directories.
///
/// Everything is env-driven; there is no on-disk config persistence.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the stock media search service.
    pub media_api_key: Option<String>,
    pub video_search_endpoint: String,
    pub image_search_endpoint: String,
    /// Speech synthesis endpoint (text + voice id + style -> audio bytes).
    pub tts_endpoint: String,
    /// Code-snippet rendering endpoint. When unset, code overlays are skipped.
    pub code_renderer_endpoint: Option<String>,
    /// Root for per-render scratch directories.
    pub work_dir: PathBuf,
    /// Directory receiving finished artifacts.
    pub output_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            media_api_key: env::var("PIXABAY_API_KEY").ok().filter(|k| !k.is_empty()),
            video_search_endpoint: env_or("CLIPSMITH_VIDEO_SEARCH", DEFAULT_VIDEO_SEARCH_ENDPOINT),
            image_search_endpoint: env_or("CLIPSMITH_IMAGE_SEARCH", DEFAULT_IMAGE_SEARCH_ENDPOINT),
            tts_endpoint: env_or("CLIPSMITH_TTS_ENDPOINT", DEFAULT_TTS_ENDPOINT),
            code_renderer_endpoint: env::var("CLIPSMITH_CODE_RENDERER")
                .ok()
                .filter(|u| !u.is_empty()),
            work_dir: PathBuf::from(env_or("CLIPSMITH_WORK_DIR", "temp")),
            output_dir: PathBuf::from(env_or("CLIPSMITH_OUTPUT_DIR", "generated")),
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.work_dir).with_context(|| {
            format!(
                "Failed to create scratch directory at {}",
                self.work_dir.display()
            )
        })?;
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "Failed to create output directory at {}",
                self.output_dir.display()
            )
        })?;
        Ok(())
    }

    /// Deterministic artifact path for a render id.
    pub fn output_path(&self, render_id: &str) -> PathBuf {
        self.output_dir.join(format!("{render_id}.mp4"))
    }

    pub fn subtitle_sidecar_path(&self, render_id: &str) -> PathBuf {
        self.output_dir.join(format!("{render_id}.srt"))
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_paths_are_keyed_by_render_id() {
        let config = Config {
            media_api_key: None,
            video_search_endpoint: DEFAULT_VIDEO_SEARCH_ENDPOINT.to_string(),
            image_search_endpoint: DEFAULT_IMAGE_SEARCH_ENDPOINT.to_string(),
            tts_endpoint: DEFAULT_TTS_ENDPOINT.to_string(),
            code_renderer_endpoint: None,
            work_dir: PathBuf::from("temp"),
            output_dir: PathBuf::from("generated"),
        };
        assert_eq!(
            config.output_path("video_1"),
            PathBuf::from("generated/video_1.mp4")
        );
        assert_eq!(
            config.subtitle_sidecar_path("video_1"),
            PathBuf::from("generated/video_1.srt")
        );
    }
}
