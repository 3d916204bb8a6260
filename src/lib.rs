pub mod cli;
pub mod config;
pub mod encode;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod pipeline;
pub mod publish;
pub mod speech;
pub mod subtitles;
pub mod ui;

pub use config::Config;
pub use error::{RenderError, RenderResult};
pub use pipeline::orchestrator::{RenderOutcome, Renderer, RendererParts};
pub use pipeline::progress::{ProgressSnapshot, ProgressTracker};
pub use pipeline::request::{BackgroundKind, RenderRequest};
