//! Narration synthesis via an external text-to-speech collaborator.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::ACCEPT;

/// Hard cap on one synthesis call. Exceeding it fails the whole render;
/// there is no fallback voice path.
pub const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(30);

/// Closed set of voice names. Unknown names map to [`VoiceProfile::Male`]
/// instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceProfile {
    #[default]
    Male,
    Female,
    Conversational,
    Professional,
    Friendly,
}

impl VoiceProfile {
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "female" => Self::Female,
            "conversational" => Self::Conversational,
            "professional" => Self::Professional,
            "friendly" => Self::Friendly,
            _ => Self::Male,
        }
    }

    /// Collaborator-specific voice identifier.
    pub fn collaborator_id(&self) -> &'static str {
        match self {
            Self::Male | Self::Conversational => "VM016944248927101HE",
            Self::Female => "VF017854738904051HE",
            Self::Professional => "VM017234567890123HE",
            Self::Friendly => "VF018765432109876HE",
        }
    }
}

/// Closed set of delivery styles. Unknown names map to
/// [`StyleProfile::Conversational`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StyleProfile {
    #[default]
    Conversational,
    Professional,
    Friendly,
    Energetic,
    Calm,
}

impl StyleProfile {
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "professional" => Self::Professional,
            "friendly" => Self::Friendly,
            "energetic" => Self::Energetic,
            "calm" => Self::Calm,
            _ => Self::Conversational,
        }
    }

    pub fn collaborator_label(&self) -> &'static str {
        match self {
            Self::Conversational => "Conversational",
            Self::Professional => "Professional",
            Self::Friendly => "Friendly",
            Self::Energetic => "Energetic",
            Self::Calm => "Calm",
        }
    }
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice: VoiceProfile,
        style: StyleProfile,
    ) -> Result<Bytes>;
}

/// Murf-style anonymous TTS endpoint: a GET with text, voice id and style
/// query parameters returning raw audio bytes.
pub struct HttpSynthesizer {
    client: Client,
    endpoint: String,
}

impl HttpSynthesizer {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(SYNTHESIS_TIMEOUT)
            .build()
            .context("Failed to build speech synthesis HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: VoiceProfile,
        style: StyleProfile,
    ) -> Result<Bytes> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("text", text),
                ("voiceId", voice.collaborator_id()),
                ("style", style.collaborator_label()),
            ])
            .header(ACCEPT, "audio/mpeg, audio/wav, audio/*")
            .send()
            .await
            .context("Speech synthesis request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Speech synthesis returned {status}: {body}");
        }

        resp.bytes()
            .await
            .context("Failed to read synthesized audio bytes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_voice_falls_back_to_male() {
        assert_eq!(VoiceProfile::parse("robotic"), VoiceProfile::Male);
        assert_eq!(VoiceProfile::parse(""), VoiceProfile::Male);
        assert_eq!(VoiceProfile::parse("FEMALE"), VoiceProfile::Female);
    }

    #[test]
    fn unknown_style_falls_back_to_conversational() {
        assert_eq!(StyleProfile::parse("shouty"), StyleProfile::Conversational);
        assert_eq!(StyleProfile::parse("Calm"), StyleProfile::Calm);
    }

    #[test]
    fn conversational_voice_shares_the_male_identifier() {
        assert_eq!(
            VoiceProfile::Conversational.collaborator_id(),
            VoiceProfile::Male.collaborator_id()
        );
    }
}
