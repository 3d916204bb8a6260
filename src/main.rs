use std::process::ExitCode;

use clap::Parser;

use clipsmith::cli::{Cli, Commands, RenderArgs};
use clipsmith::config::Config;
use clipsmith::encode;
use clipsmith::pipeline::orchestrator::Renderer;
use clipsmith::pipeline::request::RenderRequest;
use clipsmith::speech::{StyleProfile, VoiceProfile};
use clipsmith::ui;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render(args) => cmd_render(args, cli.verbose).await,
        Commands::Check => cmd_check(),
        Commands::Progress => cmd_progress(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ui::error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn cmd_render(args: RenderArgs, verbose: bool) -> anyhow::Result<()> {
    let mut config = Config::from_env();
    if let Some(out) = args.out {
        config.output_dir = out;
    }

    let narration = match (args.narration, args.narration_file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read narration file '{}': {e}", path.display())
        })?,
        (None, None) => anyhow::bail!("either --narration or --narration-file is required"),
    };

    let mut request = RenderRequest::new(
        args.title,
        narration,
        args.duration,
        args.category,
    )?
    .with_voice(
        VoiceProfile::parse(&args.voice),
        StyleProfile::parse(&args.style),
    );
    if let Some(path) = args.code_file {
        let code = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Failed to read code file '{}': {e}", path.display()))?;
        request = request.with_source_code(code);
    }

    ui::info(&format!("rendering '{}' ({})", request.title, request.id));
    let renderer = Renderer::with_defaults(config)?.verbose(verbose);
    let outcome = renderer.render(&request).await?;

    for warning in &outcome.warnings {
        ui::warn(warning);
    }
    ui::success(&format!("video written to {}", outcome.video_path.display()));
    ui::info(&format!("subtitles at {}", outcome.subtitle_path.display()));
    Ok(())
}

/// Progress is process-local state; outside a running render this prints the
/// idle snapshot shape that pollers of a long-lived [`Renderer`] would see.
fn cmd_progress() -> anyhow::Result<()> {
    let tracker = clipsmith::pipeline::progress::ProgressTracker::new();
    println!("{}", serde_json::to_string_pretty(&tracker.snapshot())?);
    Ok(())
}

fn cmd_check() -> anyhow::Result<()> {
    let config = Config::from_env();
    let mut healthy = true;

    if encode::is_ffmpeg_available() {
        ui::success("ffmpeg found on PATH");
    } else {
        ui::error("ffmpeg not found on PATH");
        healthy = false;
    }

    if config.media_api_key.is_some() {
        ui::success("stock media API key configured");
    } else {
        ui::warn("PIXABAY_API_KEY not set; background search will find nothing");
    }

    if config.code_renderer_endpoint.is_some() {
        ui::success("code renderer endpoint configured");
    } else {
        ui::info("CLIPSMITH_CODE_RENDERER not set; code overlays will be skipped");
    }

    if healthy {
        Ok(())
    } else {
        anyhow::bail!("environment is missing required tools")
    }
}
