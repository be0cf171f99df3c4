use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ad_format_adapter::analysis::{StaticBackend, UnavailableBackend};
use ad_format_adapter::config::AdapterConfig;
use ad_format_adapter::{AdaptationReport, FormatCatalog, RendererKind};
use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::Level;

/// Adapt one advertisement image into every format of an ad catalog:
/// - very wide formats (leaderboards): letterbox wide sources, crop the rest
/// - near-square formats: scale to fit, centered on the dominant color
/// - moderate rectangles: crop a centered band
#[derive(Parser, Debug)]
#[command(name = "adfmt")]
#[command(about = "Adapt an advertisement image to fixed ad formats")]
#[command(long_about = "Adapt an advertisement image to every format of an ad catalog.
Placement follows each format's aspect-ratio class; the background, style and headline come
from a content analysis file when one is given, and from safe defaults otherwise.")]
struct Args {
    /// Source advertisement image (PNG, JPEG, WebP, GIF or BMP)
    input: PathBuf,

    /// Directory the adapted PNGs are written to
    #[arg(short, long, default_value = "adapted", help = "Output directory for <key>.png files")]
    output_dir: PathBuf,

    /// Precomputed detections and classifications (JSON)
    #[arg(short, long, help = "Analysis JSON with objects and classifications")]
    analysis: Option<PathBuf>,

    /// Engine configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Format catalog replacing the configured one (JSON array)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Renderer to use
    #[arg(short, long, help = "Renderer: composite (place the source) or generative (prompt-driven)")]
    renderer: Option<RendererKind>,

    /// Formats rendered at once
    #[arg(short = 'j', long, help = "Formats rendered concurrently (default: available cores)")]
    jobs: Option<usize>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;

    let source = image::open(&args.input)
        .with_context(|| format!("Failed to decode {}", args.input.display()))?
        .to_rgba8();
    println!(
        "Adapting {} ({}x{}) into {} formats",
        args.input.display(),
        source.width(),
        source.height(),
        config.catalog().len()
    );

    let source = Arc::new(source);
    let progress = |name: &str, percent: u8| println!("  [{:>3}%] {}", percent, name);

    let report = match &args.analysis {
        Some(path) => {
            let backend = StaticBackend::from_path(path)?;
            ad_format_adapter::adapt_image(source, backend, &config, progress).await?
        }
        None => {
            let backend = UnavailableBackend::new("no analysis file given");
            ad_format_adapter::adapt_image(source, backend, &config, progress).await?
        }
    };

    write_report(&report, &args.output_dir)
}

/// Config file first, then command-line overrides.
fn load_config(args: &Args) -> Result<AdapterConfig> {
    let mut config = match &args.config {
        Some(path) => AdapterConfig::from_path(path)?,
        None => AdapterConfig::default(),
    };

    if let Some(path) = &args.catalog {
        config.catalog = Some(FormatCatalog::from_path(path)?);
    }
    if let Some(renderer) = args.renderer {
        config.renderer = renderer;
    }
    if let Some(jobs) = args.jobs {
        config.max_concurrency = jobs;
    }

    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

/// Write every successful format; fail only when nothing succeeded.
fn write_report(report: &AdaptationReport, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    for (key, image) in report.successes() {
        let path = output_dir.join(format!("{}.png", key));
        fs::write(&path, &image.png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("✔ {} {}x{} -> {}", key, image.width, image.height, path.display());
    }

    for failure in report.failures() {
        eprintln!(
            "✘ {} ({}): {} [{}]",
            failure.key, failure.format, failure.message, failure.kind
        );
    }

    if report.success_count() == 0 {
        bail!("All {} formats failed", report.len());
    }
    Ok(())
}
