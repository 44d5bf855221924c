use crate::assets::FsAssets;
use crate::batch::{BatchOptions, parse_records, render_batch};
use crate::compose::RenderContext;
use crate::config::load_config;
use crate::text_metrics::FontBook;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cardsmith", version, about = "Render themed encounter cards from a JSON batch")]
pub struct Args {
    /// JSON file holding an array of card records
    #[arg(short = 'i', long = "input", default_value = "cards.json")]
    pub input: PathBuf,

    /// Output directory for the PNG files (overrides the config)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Asset root holding assets/, images/, icons/ and fonts/ (overrides the config)
    #[arg(short = 'a', long = "assets")]
    pub assets: Option<PathBuf>,

    /// Render this many cards in parallel
    #[arg(short = 'j', long = "jobs", default_value_t = 1)]
    pub jobs: usize,

    /// Also write <card>.layout.json next to every PNG
    #[arg(long = "dump-layout")]
    pub dump_layout: bool,

    /// Log progress (repeat for more detail)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(root) = args.assets {
        config.assets.root = root;
    }
    if let Some(dir) = args.output {
        config.output.dir = dir;
    }

    let fonts = FontBook::load(&config).context("loading fonts")?;
    let assets = FsAssets::new(config.assets.clone());
    let ctx = RenderContext {
        config: &config,
        fonts: &fonts,
        assets: &assets,
    };

    let input = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let entries = parse_records(&input).with_context(|| format!("parsing {}", args.input.display()))?;
    tracing::info!(cards = entries.len(), "rendering batch");

    let options = BatchOptions {
        output_dir: config.output.dir.clone(),
        jobs: args.jobs,
        dump_layout: args.dump_layout,
    };
    let report = render_batch(&entries, ctx, &options);

    for (_, path) in report.exported() {
        let file = path.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
        println!("Card created and saved as '{file}'.");
    }
    for (name, error) in report.failures() {
        eprintln!("Failed to create card '{name}': {error}");
    }

    match report.failed_count() {
        0 => Ok(()),
        failed => Err(anyhow::anyhow!("{failed} of {} cards failed", report.outcomes.len())),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
