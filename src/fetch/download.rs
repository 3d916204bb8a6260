//! Streaming download of a selected media candidate into scratch storage.

use std::path::Path;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;

#[async_trait]
pub trait MediaDownloader: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MediaDownloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Download request for '{url}' failed"))?;

        if !resp.status().is_success() {
            bail!("Download of '{url}' returned status {}", resp.status());
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("Failed to create '{}'", dest.display()))?;

        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.with_context(|| format!("Download stream for '{url}' aborted"))?;
            file.write_all(&chunk)
                .await
                .with_context(|| format!("Failed to write '{}'", dest.display()))?;
        }
        file.flush()
            .await
            .with_context(|| format!("Failed to flush '{}'", dest.display()))?;
        Ok(())
    }
}
