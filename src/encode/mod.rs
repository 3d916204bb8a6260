//! ffmpeg invocation: input planning, argument assembly and the runner seam.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{RenderError, RenderResult};
use crate::fetch::BackgroundAsset;
use crate::graph::{self, FilterGraph, TARGET_HEIGHT, TARGET_WIDTH};
use crate::pipeline::request::BackgroundKind;

pub const OUTPUT_FPS: u32 = 30;

/// Canvas color when no background media was found.
const CANVAS_COLOR: &str = "0x1E1E2E";

/// A fully assembled ffmpeg invocation for one render.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub args: Vec<String>,
    pub output: PathBuf,
    pub total_duration: f64,
}

/// Build the encoder arguments. Raw input order is the contract the graph
/// builder relies on: base visual first (background or lavfi canvas), then
/// the code image, then the audio file.
pub fn build_encode_job(
    background: Option<&BackgroundAsset>,
    code_image: Option<&Path>,
    audio: &Path,
    graph: &FilterGraph,
    duration_seconds: f64,
    output: PathBuf,
) -> RenderResult<EncodeJob> {
    let mut args: Vec<String> = vec!["-y".into()];
    let mut input_count = 0usize;

    match background {
        Some(asset) => {
            match asset.kind {
                BackgroundKind::Video => {
                    args.extend(["-stream_loop".into(), "-1".into()]);
                }
                BackgroundKind::Image => {
                    args.extend(["-loop".into(), "1".into()]);
                }
            }
            args.extend(["-t".into(), format_duration(duration_seconds)]);
            args.extend(["-i".into(), path_arg(&asset.path)]);
        }
        None => {
            args.extend([
                "-f".into(),
                "lavfi".into(),
                "-i".into(),
                format!(
                    "color=c={CANVAS_COLOR}:s={TARGET_WIDTH}x{TARGET_HEIGHT}:d={}:r={OUTPUT_FPS}",
                    format_duration(duration_seconds)
                ),
            ]);
        }
    }
    input_count += 1;

    if let Some(code) = code_image {
        args.extend(["-i".into(), path_arg(code)]);
        input_count += 1;
    }

    let audio_index = input_count;
    args.extend(["-i".into(), path_arg(audio)]);
    input_count += 1;

    graph.validate(input_count)?;
    args.extend(["-filter_complex".into(), graph.serialize()]);

    args.extend([
        "-map".into(),
        format!("[{}]", graph::FINAL_STREAM),
        "-map".into(),
        format!("{audio_index}:a"),
        "-c:v".into(),
        "libx264".into(),
        "-c:a".into(),
        "aac".into(),
        "-preset".into(),
        "fast".into(),
        "-crf".into(),
        "23".into(),
        "-r".into(),
        OUTPUT_FPS.to_string(),
        "-shortest".into(),
    ]);
    args.push(path_arg(&output));

    Ok(EncodeJob {
        args,
        output,
        total_duration: duration_seconds,
    })
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn format_duration(value: f64) -> String {
    format!("{value:.3}")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegRunOptions {
    pub total_duration: Option<f64>,
    pub verbose: bool,
}

/// Seam between argument assembly and the actual encoder process, so the
/// pipeline is testable without ffmpeg installed.
pub trait FfmpegRunner: Send + Sync {
    fn run(&self, args: &[String], options: FfmpegRunOptions) -> Result<()>;
}

pub fn is_ffmpeg_available() -> bool {
    which::which("ffmpeg").is_ok()
}

/// Spawns the system `ffmpeg`, tracking `time=` progress from stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFfmpegRunner;

impl FfmpegRunner for SystemFfmpegRunner {
    fn run(&self, args: &[String], options: FfmpegRunOptions) -> Result<()> {
        let mut child = Command::new("ffmpeg")
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn ffmpeg (is it installed and on PATH?)")?;

        let stderr = child.stderr.take().expect("stderr was piped");

        let bar = options.total_duration.map(|duration| {
            let bar = ProgressBar::new((duration * 1000.0) as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>7}/{len:7}ms {msg}")
                    .expect("static progress template is valid")
                    .progress_chars("█▉▊▋▌▍▎▏ "),
            );
            bar.set_message("encoding");
            bar
        });

        let mut last_line = String::new();
        let mut error_lines = Vec::new();
        drain_stderr(
            stderr,
            options.verbose,
            bar.as_ref(),
            &mut last_line,
            &mut error_lines,
        )?;

        let status = child.wait().context("Failed to wait for ffmpeg")?;

        if let Some(bar) = bar {
            bar.finish_and_clear();
        }

        if !status.success() {
            let detail = if error_lines.is_empty() {
                last_line
            } else {
                error_lines.join("\n")
            };
            bail!(
                "ffmpeg exited with status {:?}: {}",
                status.code(),
                detail.trim()
            );
        }

        Ok(())
    }
}

fn drain_stderr<R: Read>(
    mut stderr: R,
    verbose: bool,
    bar: Option<&ProgressBar>,
    last_line: &mut String,
    error_lines: &mut Vec<String>,
) -> Result<()> {
    let mut buffer = [0u8; 4096];
    let mut pending = String::new();

    loop {
        let n = stderr
            .read(&mut buffer)
            .context("Failed to read ffmpeg stderr")?;
        if n == 0 {
            break;
        }
        pending.push_str(&String::from_utf8_lossy(&buffer[..n]));

        // ffmpeg reuses the status line with carriage returns.
        while let Some(pos) = pending.find(['\r', '\n']) {
            let mut line: String = pending.drain(..=pos).collect();
            line.pop();
            if line.is_empty() {
                continue;
            }

            *last_line = line.clone();
            if verbose {
                eprintln!("{line}");
            }
            if line.to_ascii_lowercase().contains("error") {
                error_lines.push(line.clone());
            }
            if let Some(bar) = bar
                && let Some(seconds) = parse_progress_seconds(&line)
            {
                bar.set_position((seconds * 1000.0) as u64);
            }
        }
    }

    Ok(())
}

fn parse_progress_seconds(line: &str) -> Option<f64> {
    let rest = &line[line.find("time=")? + 5..];
    let value = rest.split_whitespace().next()?;
    let mut parts = value.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;

    fn video_background() -> BackgroundAsset {
        BackgroundAsset {
            path: PathBuf::from("temp/id_background.mp4"),
            kind: BackgroundKind::Video,
        }
    }

    fn image_background() -> BackgroundAsset {
        BackgroundAsset {
            path: PathBuf::from("temp/id_background.jpg"),
            kind: BackgroundKind::Image,
        }
    }

    fn window(args: &[String], flag: &str) -> Option<usize> {
        args.iter().position(|a| a == flag)
    }

    #[test]
    fn video_background_loops_for_the_full_duration() {
        let graph = build_graph(true, false, "T");
        let job = build_encode_job(
            Some(&video_background()),
            None,
            Path::new("temp/id_audio.mp3"),
            &graph,
            12.0,
            PathBuf::from("generated/id.mp4"),
        )
        .unwrap();

        let loop_pos = window(&job.args, "-stream_loop").unwrap();
        assert_eq!(job.args[loop_pos + 1], "-1");
        let t_pos = window(&job.args, "-t").unwrap();
        assert_eq!(job.args[t_pos + 1], "12.000");
        assert!(loop_pos < window(&job.args, "-i").unwrap());
    }

    #[test]
    fn image_background_uses_still_loop() {
        let graph = build_graph(true, false, "T");
        let job = build_encode_job(
            Some(&image_background()),
            None,
            Path::new("temp/id_audio.mp3"),
            &graph,
            8.0,
            PathBuf::from("generated/id.mp4"),
        )
        .unwrap();

        let loop_pos = window(&job.args, "-loop").unwrap();
        assert_eq!(job.args[loop_pos + 1], "1");
    }

    #[test]
    fn missing_background_injects_a_canvas_input() {
        let graph = build_graph(false, false, "T");
        let job = build_encode_job(
            None,
            None,
            Path::new("temp/id_audio.mp3"),
            &graph,
            10.0,
            PathBuf::from("generated/id.mp4"),
        )
        .unwrap();

        let lavfi = window(&job.args, "-f").unwrap();
        assert_eq!(job.args[lavfi + 1], "lavfi");
        let canvas = &job.args[lavfi + 3];
        assert!(canvas.starts_with("color=c=0x1E1E2E:s=1080x1920:d=10.000"));
        // Audio is input 1 when there is no code image.
        let map = window(&job.args, "-map").unwrap();
        assert_eq!(job.args[map + 1], "[final]");
        assert_eq!(job.args[map + 3], "1:a");
    }

    #[test]
    fn audio_maps_from_the_last_input_with_code_image() {
        let graph = build_graph(true, true, "T");
        let job = build_encode_job(
            Some(&video_background()),
            Some(Path::new("temp/id_code_snippet.png")),
            Path::new("temp/id_audio.mp3"),
            &graph,
            10.0,
            PathBuf::from("generated/id.mp4"),
        )
        .unwrap();

        let map = window(&job.args, "-map").unwrap();
        assert_eq!(job.args[map + 3], "2:a");
    }

    #[test]
    fn output_options_fix_codecs_and_frame_rate() {
        let graph = build_graph(false, false, "T");
        let job = build_encode_job(
            None,
            None,
            Path::new("a.mp3"),
            &graph,
            5.0,
            PathBuf::from("out.mp4"),
        )
        .unwrap();

        let args = &job.args;
        let cv = window(args, "-c:v").unwrap();
        assert_eq!(args[cv + 1], "libx264");
        let ca = window(args, "-c:a").unwrap();
        assert_eq!(args[ca + 1], "aac");
        let r = window(args, "-r").unwrap();
        assert_eq!(args[r + 1], "30");
        assert!(args.contains(&"-shortest".to_string()));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn graph_referencing_missing_code_input_is_rejected() {
        // Graph expects a code image input that the input plan does not have.
        let graph = build_graph(true, true, "T");
        let err = build_encode_job(
            Some(&video_background()),
            None,
            Path::new("a.mp3"),
            &graph,
            5.0,
            PathBuf::from("out.mp4"),
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::GraphInvariant(_)));
    }

    #[test]
    fn progress_seconds_parse_from_status_line() {
        let line = "frame=  300 fps= 30 q=28.0 size=    1024KiB time=00:00:10.03 bitrate= 836.2kbits/s speed=1.01x";
        let seconds = parse_progress_seconds(line).unwrap();
        assert!((seconds - 10.03).abs() < 1e-9);
        assert_eq!(parse_progress_seconds("no time here"), None);
    }
}
