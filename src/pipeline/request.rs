use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{RenderError, RenderResult};
use crate::fetch::BackgroundAsset;
use crate::speech::{StyleProfile, VoiceProfile};

/// Kind tag for the resolved background visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundKind {
    Video,
    Image,
}

/// Immutable input bundle for one render.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Unique per render; keys scratch files and the output artifact.
    pub id: String,
    /// Burned-in overlay and display label.
    pub title: String,
    pub narration: String,
    pub source_code: Option<String>,
    pub duration_seconds: f64,
    /// Search query for the background visual.
    pub visual_category: String,
    pub voice: VoiceProfile,
    pub style: StyleProfile,
}

impl RenderRequest {
    pub fn new(
        title: impl Into<String>,
        narration: impl Into<String>,
        duration_seconds: f64,
        visual_category: impl Into<String>,
    ) -> RenderResult<Self> {
        let request = Self {
            id: generate_render_id(),
            title: title.into(),
            narration: narration.into(),
            source_code: None,
            duration_seconds,
            visual_category: visual_category.into(),
            voice: VoiceProfile::default(),
            style: StyleProfile::default(),
        };
        request.validate()?;
        Ok(request)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_source_code(mut self, code: impl Into<String>) -> Self {
        self.source_code = Some(code.into());
        self
    }

    pub fn with_voice(mut self, voice: VoiceProfile, style: StyleProfile) -> Self {
        self.voice = voice;
        self.style = style;
        self
    }

    pub fn validate(&self) -> RenderResult<()> {
        if self.title.trim().is_empty() {
            return Err(RenderError::invalid_request("title must not be empty"));
        }
        if self.narration.trim().is_empty() {
            return Err(RenderError::invalid_request("narration must not be empty"));
        }
        if !(self.duration_seconds > 0.0) {
            return Err(RenderError::invalid_request(
                "duration must be a positive number of seconds",
            ));
        }
        Ok(())
    }
}

/// `video_<millis>_<hex>` ids, unique enough for scratch and output naming.
pub fn generate_render_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("video_{millis}_{:04x}", rand::random::<u16>())
}

/// Scratch assets accumulated while one render is in flight. Owned by
/// exactly one render; dropped with the scratch directory afterwards.
#[derive(Debug, Default)]
pub struct AssetSet {
    pub background: Option<BackgroundAsset>,
    pub code_image: Option<PathBuf>,
    pub audio: Option<PathBuf>,
    pub subtitles: Option<PathBuf>,
    /// Recoverable degradations, surfaced on the render outcome.
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_rejects_non_positive_duration() {
        assert!(RenderRequest::new("T", "hello world", 0.0, "technology").is_err());
        assert!(RenderRequest::new("T", "hello world", -3.0, "technology").is_err());
        assert!(RenderRequest::new("T", "hello world", f64::NAN, "technology").is_err());
        assert!(RenderRequest::new("T", "hello world", 10.0, "technology").is_ok());
    }

    #[test]
    fn request_rejects_blank_title_or_narration() {
        assert!(RenderRequest::new(" ", "hello", 10.0, "technology").is_err());
        assert!(RenderRequest::new("T", "", 10.0, "technology").is_err());
    }

    #[test]
    fn generated_ids_carry_the_video_prefix_and_differ() {
        let a = generate_render_id();
        let b = generate_render_id();
        assert!(a.starts_with("video_"));
        // Millisecond clock plus entropy suffix; collisions would need the
        // same instant and the same random draw.
        assert_ne!(a, b);
    }
}
