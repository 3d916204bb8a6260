//! Background and code-image acquisition with ordered fallback.

pub mod code_image;
pub mod download;
pub mod search;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::pipeline::request::BackgroundKind;

pub use download::{HttpDownloader, MediaDownloader};
pub use search::{ImageSearch, VideoSearch};

/// How many ranked candidates to attempt per tier: the top hit plus one
/// retry with the next-ranked candidate on download failure.
const DOWNLOAD_ATTEMPTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundAsset {
    pub path: PathBuf,
    pub kind: BackgroundKind,
}

/// Resolves one background visual per render: video search first, image
/// search second, none as the last resort. Search failures are absorbed as
/// empty result lists; download failures fall through to the next candidate,
/// then the next tier. Every degradation is recorded as a warning.
pub struct AssetFetcher {
    videos: Arc<dyn VideoSearch>,
    images: Arc<dyn ImageSearch>,
    downloader: Arc<dyn MediaDownloader>,
}

impl AssetFetcher {
    pub fn new(
        videos: Arc<dyn VideoSearch>,
        images: Arc<dyn ImageSearch>,
        downloader: Arc<dyn MediaDownloader>,
    ) -> Self {
        Self {
            videos,
            images,
            downloader,
        }
    }

    pub async fn fetch_background(
        &self,
        category: &str,
        scratch: &Path,
        render_id: &str,
        warnings: &mut Vec<String>,
    ) -> Option<BackgroundAsset> {
        if let Some(asset) = self
            .fetch_video_background(category, scratch, render_id, warnings)
            .await
        {
            return Some(asset);
        }

        if let Some(asset) = self
            .fetch_image_background(category, scratch, render_id, warnings)
            .await
        {
            warnings.push(format!(
                "no video background for '{category}', using a still image"
            ));
            return Some(asset);
        }

        warnings.push(format!(
            "no background media found for '{category}', rendering on a blank canvas"
        ));
        None
    }

    async fn fetch_video_background(
        &self,
        category: &str,
        scratch: &Path,
        render_id: &str,
        warnings: &mut Vec<String>,
    ) -> Option<BackgroundAsset> {
        let hits = match self.videos.search(category).await {
            Ok(hits) => hits,
            Err(err) => {
                warnings.push(format!("video search failed: {err}"));
                Vec::new()
            }
        };

        let dest = scratch.join(format!("{render_id}_background.mp4"));
        for candidate in hits.iter().take(DOWNLOAD_ATTEMPTS) {
            let Some(url) = candidate.best_url() else {
                continue;
            };
            match self.downloader.download(url, &dest).await {
                Ok(()) => {
                    return Some(BackgroundAsset {
                        path: dest,
                        kind: BackgroundKind::Video,
                    });
                }
                Err(err) => {
                    warnings.push(format!("background video download failed: {err}"));
                }
            }
        }
        None
    }

    async fn fetch_image_background(
        &self,
        category: &str,
        scratch: &Path,
        render_id: &str,
        warnings: &mut Vec<String>,
    ) -> Option<BackgroundAsset> {
        let hits = match self.images.search(category).await {
            Ok(hits) => hits,
            Err(err) => {
                warnings.push(format!("image search failed: {err}"));
                Vec::new()
            }
        };

        let dest = scratch.join(format!("{render_id}_background.jpg"));
        for candidate in hits.iter().take(DOWNLOAD_ATTEMPTS) {
            let Some(url) = candidate.best_url() else {
                continue;
            };
            match self.downloader.download(url, &dest).await {
                Ok(()) => {
                    return Some(BackgroundAsset {
                        path: dest,
                        kind: BackgroundKind::Image,
                    });
                }
                Err(err) => {
                    warnings.push(format!("background image download failed: {err}"));
                }
            }
        }
        None
    }
}
