use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cassette::{Background, Config, RunOutcome, SyntaxHighlighter, TypeStream};

const PRODUCTION_CONFIG: &str = "configs/production.yaml";
const PROTOTYPE_CONFIG: &str = "configs/prototype.yaml";

#[derive(Parser, Debug)]
#[command(name = "cassette", version, about = "Render typing videos of source code")]
struct Cli {
    /// Python file to render, or a directory of `*.py` files.
    #[arg(long)]
    in_path: PathBuf,

    /// Output directory.
    #[arg(long)]
    out_path: PathBuf,

    /// Use the low-quality prototype preset.
    #[arg(long, default_value_t = false)]
    lq: bool,

    /// Config file; overrides the preset selected by `--lq`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for background noise (only used when the config has a background).
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(|| {
        PathBuf::from(if cli.lq {
            PROTOTYPE_CONFIG
        } else {
            PRODUCTION_CONFIG
        })
    });
    let mut config = cassette::load_config(&config_path)
        .with_context(|| format!("load config '{}'", config_path.display()))?;
    if let (Some(seed), Some(bg)) = (cli.seed, config.background.as_mut()) {
        bg.seed = seed;
    }

    let inputs = collect_inputs(&cli.in_path)?;
    let highlighter = SyntaxHighlighter::new(&config).context("build highlighter")?;
    let background = match &config.background {
        Some(spec) => {
            let (w, h) = config.size;
            Some(Background::generate(spec, w, h).context("generate background")?)
        }
        None => None,
    };

    for input in &inputs {
        let stream = TypeStream::new(input, &cli.out_path, &config)
            .with_context(|| format!("prepare '{}'", input.display()))?;
        let outcome = stream
            .run(&highlighter, background.as_ref())
            .with_context(|| format!("render '{}'", input.display()))?;
        match &outcome {
            RunOutcome::Image { path } => eprintln!("wrote {}", path.display()),
            RunOutcome::Video { path, stats } => eprintln!(
                "wrote {} ({} frames, {} skipped)",
                path.display(),
                stats.frames_written,
                stats.frames_skipped
            ),
        }
    }
    Ok(())
}

fn collect_inputs(in_path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !in_path.is_dir() {
        return Ok(vec![in_path.to_path_buf()]);
    }
    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(in_path)
        .with_context(|| format!("read input dir '{}'", in_path.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "py") {
            inputs.push(path);
        }
    }
    inputs.sort();
    if inputs.is_empty() {
        anyhow::bail!("no *.py files in '{}'", in_path.display());
    }
    Ok(inputs)
}
