use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "clipsmith",
    about = "Assemble short vertical videos from narration, stock media and code snippets",
    version
)]
pub struct Cli {
    /// Print raw encoder output instead of the progress bar
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a video from a narration script
    Render(RenderArgs),
    /// Check that required tools and credentials are available
    Check,
    /// Print the render progress snapshot as JSON
    Progress,
}

#[derive(clap::Args)]
pub struct RenderArgs {
    /// Title burned into the top of the frame
    #[arg(long)]
    pub title: String,

    /// Narration text, synthesized to speech and subtitled
    #[arg(long, conflicts_with = "narration_file")]
    pub narration: Option<String>,

    /// Read the narration text from a file instead
    #[arg(long)]
    pub narration_file: Option<std::path::PathBuf>,

    /// Target duration in seconds
    #[arg(long, default_value_t = 30.0)]
    pub duration: f64,

    /// Search category for the background visual
    #[arg(long, default_value = "technology")]
    pub category: String,

    /// Path to a source file rendered as a code overlay
    #[arg(long)]
    pub code_file: Option<std::path::PathBuf>,

    /// Voice name (male, female, conversational, professional, friendly)
    #[arg(long, default_value = "male")]
    pub voice: String,

    /// Delivery style (conversational, professional, friendly, energetic, calm)
    #[arg(long, default_value = "conversational")]
    pub style: String,

    /// Directory for the finished video and subtitle sidecar
    #[arg(long)]
    pub out: Option<std::path::PathBuf>,
}
