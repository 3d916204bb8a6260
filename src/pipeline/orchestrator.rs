//! Render orchestration: stage sequencing, progress boundaries, fallback
//! policy and the encode invocation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use reqwest::Client;

use crate::config::Config;
use crate::encode::{self, FfmpegRunOptions, FfmpegRunner, SystemFfmpegRunner};
use crate::error::{RenderError, RenderResult};
use crate::fetch::code_image::{
    CodeRenderer, HttpCodeRenderer, LanguageDetector, TokenHeuristics,
};
use crate::fetch::{AssetFetcher, HttpDownloader};
use crate::fetch::search::{PixabayImageSearch, PixabayVideoSearch};
use crate::graph;
use crate::pipeline::progress::{ProgressSnapshot, ProgressTracker};
use crate::pipeline::request::{AssetSet, RenderRequest};
use crate::pipeline::scratch::ScratchDir;
use crate::publish::{PublishMetadata, PublishOutcome, Publisher};
use crate::speech::{HttpSynthesizer, SpeechSynthesizer, SYNTHESIS_TIMEOUT};
use crate::subtitles;
use crate::ui;

const TOTAL_STEPS: u32 = 5;
const STEP_SYNTHESIZE: &str = "Synthesizing narration";
const STEP_BACKGROUND: &str = "Fetching background media";
const STEP_CODE_IMAGE: &str = "Rendering code snippet";
const STEP_SUBTITLES: &str = "Building subtitles";
const STEP_ENCODE: &str = "Encoding video";

/// Result of one finished render. `publish` is populated only by
/// [`Renderer::render_and_publish`] and may report a failure even though the
/// video itself succeeded.
#[derive(Debug)]
pub struct RenderOutcome {
    pub video_path: PathBuf,
    pub subtitle_path: PathBuf,
    pub warnings: Vec<String>,
    pub publish: Option<PublishOutcome>,
}

/// Collaborator set for a [`Renderer`]. Split out so tests can swap any
/// seam for a mock.
pub struct RendererParts {
    pub fetcher: AssetFetcher,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub detector: Arc<dyn LanguageDetector>,
    pub code_renderer: Option<Arc<dyn CodeRenderer>>,
    pub runner: Arc<dyn FfmpegRunner>,
    pub publisher: Option<Arc<dyn Publisher>>,
}

pub struct Renderer {
    config: Config,
    progress: Arc<ProgressTracker>,
    fetcher: AssetFetcher,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    detector: Arc<dyn LanguageDetector>,
    code_renderer: Option<Arc<dyn CodeRenderer>>,
    runner: Arc<dyn FfmpegRunner>,
    publisher: Option<Arc<dyn Publisher>>,
    verbose: bool,
}

impl Renderer {
    pub fn new(config: Config, parts: RendererParts) -> Self {
        Self {
            config,
            progress: Arc::new(ProgressTracker::new()),
            fetcher: parts.fetcher,
            synthesizer: parts.synthesizer,
            detector: parts.detector,
            code_renderer: parts.code_renderer,
            runner: parts.runner,
            publisher: parts.publisher,
            verbose: false,
        }
    }

    /// Wire up the HTTP collaborators and the system ffmpeg runner.
    pub fn with_defaults(config: Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(SYNTHESIS_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        let api_key = config.media_api_key.clone().unwrap_or_default();
        let fetcher = AssetFetcher::new(
            Arc::new(PixabayVideoSearch::new(
                client.clone(),
                config.video_search_endpoint.clone(),
                api_key.clone(),
            )),
            Arc::new(PixabayImageSearch::new(
                client.clone(),
                config.image_search_endpoint.clone(),
                api_key,
            )),
            Arc::new(HttpDownloader::new(client.clone())),
        );

        let synthesizer: Arc<dyn SpeechSynthesizer> =
            Arc::new(HttpSynthesizer::new(config.tts_endpoint.clone())?);

        let code_renderer: Option<Arc<dyn CodeRenderer>> = config
            .code_renderer_endpoint
            .clone()
            .map(|endpoint| {
                Arc::new(HttpCodeRenderer::new(client, endpoint)) as Arc<dyn CodeRenderer>
            });

        Ok(Self::new(
            config,
            RendererParts {
                fetcher,
                synthesizer,
                detector: Arc::new(TokenHeuristics),
                code_renderer,
                runner: Arc::new(SystemFfmpegRunner),
                publisher: None,
            },
        ))
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.progress.snapshot()
    }

    /// Run the full pipeline for one request. Rejects immediately when a
    /// render is already in flight.
    pub async fn render(&self, request: &RenderRequest) -> RenderResult<RenderOutcome> {
        request.validate()?;
        let slot = self.progress.begin(TOTAL_STEPS, STEP_SYNTHESIZE)?;

        match self.run_stages(request).await {
            Ok(outcome) => {
                slot.complete();
                Ok(outcome)
            }
            Err(err) => {
                self.progress.record_error(err.to_string());
                // Dropping the slot clears the in-flight flag.
                Err(err)
            }
        }
    }

    /// Render, then hand the artifact to the publisher. Publish failure is
    /// partial success: the outcome still carries the finished video.
    pub async fn render_and_publish(
        &self,
        request: &RenderRequest,
        metadata: &PublishMetadata,
    ) -> RenderResult<RenderOutcome> {
        let mut outcome = self.render(request).await?;

        if let Some(publisher) = &self.publisher {
            outcome.publish = Some(
                match publisher.publish(&outcome.video_path, metadata).await {
                    Ok(receipt) => PublishOutcome::Published(receipt),
                    Err(err) => {
                        ui::warn(&format!("publish failed: {err:#}"));
                        PublishOutcome::Failed(format!("{err:#}"))
                    }
                },
            );
        }

        Ok(outcome)
    }

    async fn run_stages(&self, request: &RenderRequest) -> RenderResult<RenderOutcome> {
        self.config
            .ensure_directories()
            .map_err(|e| RenderError::stage("setup", e))?;
        let scratch = ScratchDir::create(&self.config.work_dir, &request.id)
            .map_err(|e| RenderError::stage("setup", e))?;
        let mut assets = AssetSet::default();

        // Narration synthesis. Fatal: no fallback voice path exists.
        let audio_bytes = self
            .synthesizer
            .synthesize(&request.narration, request.voice, request.style)
            .await
            .map_err(|e| RenderError::synthesis(format!("{e:#}")))?;
        let audio_path = scratch.file(&format!("{}_audio.mp3", request.id));
        tokio::fs::write(&audio_path, &audio_bytes)
            .await
            .map_err(RenderError::Io)?;
        assets.audio = Some(audio_path.clone());
        self.progress.step(STEP_BACKGROUND);

        // Background resolution, recoverable by omission.
        assets.background = self
            .fetcher
            .fetch_background(
                &request.visual_category,
                scratch.path(),
                &request.id,
                &mut assets.warnings,
            )
            .await;
        self.progress.step(STEP_CODE_IMAGE);

        // Code image, recoverable by omission.
        if let Some(code) = &request.source_code {
            assets.code_image = self
                .render_code_image(
                    code,
                    &request.title,
                    &request.id,
                    &scratch,
                    &mut assets.warnings,
                )
                .await;
        }
        self.progress.step(STEP_SUBTITLES);

        // Subtitles are deterministic; only I/O can fail here.
        let cues = subtitles::build_cues(&request.narration, request.duration_seconds);
        let subtitle_scratch = scratch.file(&format!("{}_subtitles.srt", request.id));
        tokio::fs::write(&subtitle_scratch, subtitles::to_srt(&cues))
            .await
            .map_err(RenderError::Io)?;
        assets.subtitles = Some(subtitle_scratch.clone());
        self.progress.step(STEP_ENCODE);

        // Graph construction and the encode invocation.
        let filter_graph = graph::build_graph(
            assets.background.is_some(),
            assets.code_image.is_some(),
            &request.title,
        );
        let job = encode::build_encode_job(
            assets.background.as_ref(),
            assets.code_image.as_deref(),
            &audio_path,
            &filter_graph,
            request.duration_seconds,
            self.config.output_path(&request.id),
        )?;

        let runner = Arc::clone(&self.runner);
        let args = job.args.clone();
        let options = FfmpegRunOptions {
            total_duration: Some(job.total_duration),
            verbose: self.verbose,
        };
        tokio::task::spawn_blocking(move || runner.run(&args, options))
            .await
            .map_err(|_| RenderError::encode("encoder task panicked"))?
            .map_err(|e| RenderError::encode(format!("{e:#}")))?;

        // Keep the subtitle sidecar next to the artifact; scratch is removed
        // when `scratch` drops.
        let subtitle_path = self.config.subtitle_sidecar_path(&request.id);
        tokio::fs::copy(&subtitle_scratch, &subtitle_path)
            .await
            .map_err(RenderError::Io)?;

        Ok(RenderOutcome {
            video_path: job.output,
            subtitle_path,
            warnings: assets.warnings,
            publish: None,
        })
    }

    async fn render_code_image(
        &self,
        code: &str,
        title: &str,
        render_id: &str,
        scratch: &ScratchDir,
        warnings: &mut Vec<String>,
    ) -> Option<PathBuf> {
        let Some(renderer) = &self.code_renderer else {
            warnings.push("no code renderer configured, skipping code overlay".to_string());
            return None;
        };

        let language = self.detector.detect(code);
        match renderer.render(code, language, title).await {
            Ok(bytes) => {
                let path = scratch.file(&format!("{render_id}_code_snippet.png"));
                match tokio::fs::write(&path, &bytes).await {
                    Ok(()) => Some(path),
                    Err(err) => {
                        warnings.push(format!("failed to store code image: {err}"));
                        None
                    }
                }
            }
            Err(err) => {
                warnings.push(format!("code image rendering failed: {err}"));
                None
            }
        }
    }
}
