use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cassette-snapshots",
    version,
    about = "Save the first and last frame of every video in a directory"
)]
struct Cli {
    /// Directory containing rendered videos.
    #[arg(short = 'f', long = "folder")]
    folder: PathBuf,

    /// Video file extension to pick up.
    #[arg(short = 't', long = "type", default_value = "mp4")]
    ext: String,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let written = cassette::snapshot_dir(&cli.folder, &cli.ext)
        .with_context(|| format!("snapshot videos in '{}'", cli.folder.display()))?;
    for paths in &written {
        eprintln!("wrote {} and {}", paths.first.display(), paths.last.display());
    }
    Ok(())
}
