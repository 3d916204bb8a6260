//! Publishing collaborator seam. The transport (upload protocol, auth) is
//! out of scope; the pipeline only needs the request/response shape and the
//! rule that a failed publish never invalidates the finished artifact.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    #[default]
    Private,
    Unlisted,
    Public,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub privacy: Privacy,
}

#[derive(Debug, Clone)]
pub struct PublishReceipt {
    pub video_id: String,
    pub url: String,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, video: &Path, metadata: &PublishMetadata) -> Result<PublishReceipt>;
}

/// Publish result carried on the render outcome. Failure here is partial
/// success: the video file is kept and returned either way.
#[derive(Debug, Clone)]
pub enum PublishOutcome {
    Published(PublishReceipt),
    Failed(String),
}
