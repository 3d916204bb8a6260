//! Stock media search collaborators (Pixabay-shaped API).

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// One resolution variant of a video candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoVariant {
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// Resolution-tagged renditions of a video hit. Mid-resolution is preferred
/// for download size; `small` is the fallback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoRenditions {
    pub medium: Option<VideoVariant>,
    pub small: Option<VideoVariant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoCandidate {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub videos: VideoRenditions,
}

impl VideoCandidate {
    /// Preferred downloadable variant: medium, then small.
    pub fn best_url(&self) -> Option<&str> {
        self.videos
            .medium
            .as_ref()
            .or(self.videos.small.as_ref())
            .map(|v| v.url.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageCandidate {
    #[serde(default)]
    pub id: u64,
    #[serde(rename = "largeImageURL")]
    pub large_image_url: Option<String>,
    #[serde(rename = "webformatURL")]
    pub webformat_url: Option<String>,
}

impl ImageCandidate {
    /// Preferred downloadable variant: large, then web resolution.
    pub fn best_url(&self) -> Option<&str> {
        self.large_image_url
            .as_deref()
            .or(self.webformat_url.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct VideoSearchResponse {
    #[serde(default)]
    hits: Vec<VideoCandidate>,
}

#[derive(Debug, Deserialize)]
struct ImageSearchResponse {
    #[serde(default)]
    hits: Vec<ImageCandidate>,
}

/// Ranked video search. Results come back collaborator-ranked, best first.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<VideoCandidate>>;
}

#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<ImageCandidate>>;
}

pub struct PixabayVideoSearch {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl PixabayVideoSearch {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl VideoSearch for PixabayVideoSearch {
    async fn search(&self, query: &str) -> Result<Vec<VideoCandidate>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query),
                ("video_type", "all"),
                ("orientation", "vertical"),
                ("safesearch", "true"),
                ("per_page", "10"),
                ("order", "popular"),
            ])
            .send()
            .await
            .context("Video search request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Video search returned {status}: {body}");
        }

        let parsed: VideoSearchResponse = resp
            .json()
            .await
            .context("Failed to parse video search response")?;
        Ok(parsed.hits)
    }
}

pub struct PixabayImageSearch {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl PixabayImageSearch {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ImageSearch for PixabayImageSearch {
    async fn search(&self, query: &str) -> Result<Vec<ImageCandidate>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query),
                ("image_type", "photo"),
                ("orientation", "vertical"),
                ("safesearch", "true"),
                ("per_page", "10"),
                ("min_width", "1080"),
            ])
            .send()
            .await
            .context("Image search request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Image search returned {status}: {body}");
        }

        let parsed: ImageSearchResponse = resp
            .json()
            .await
            .context("Failed to parse image search response")?;
        Ok(parsed.hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_candidate_prefers_medium_over_small() {
        let candidate: VideoCandidate = serde_json::from_str(
            r#"{"id":1,"videos":{"medium":{"url":"m.mp4","width":960,"height":540},
                "small":{"url":"s.mp4","width":640,"height":360}}}"#,
        )
        .unwrap();
        assert_eq!(candidate.best_url(), Some("m.mp4"));
    }

    #[test]
    fn video_candidate_falls_back_to_small() {
        let candidate: VideoCandidate = serde_json::from_str(
            r#"{"id":1,"videos":{"small":{"url":"s.mp4","width":640,"height":360}}}"#,
        )
        .unwrap();
        assert_eq!(candidate.best_url(), Some("s.mp4"));
    }

    #[test]
    fn image_candidate_prefers_large_over_webformat() {
        let candidate: ImageCandidate = serde_json::from_str(
            r#"{"id":2,"largeImageURL":"l.jpg","webformatURL":"w.jpg"}"#,
        )
        .unwrap();
        assert_eq!(candidate.best_url(), Some("l.jpg"));

        let web_only: ImageCandidate =
            serde_json::from_str(r#"{"id":3,"webformatURL":"w.jpg"}"#).unwrap();
        assert_eq!(web_only.best_url(), Some("w.jpg"));
    }

    #[test]
    fn candidate_without_variants_has_no_url() {
        let candidate: VideoCandidate = serde_json::from_str(r#"{"id":1}"#).unwrap();
        assert_eq!(candidate.best_url(), None);
    }
}
