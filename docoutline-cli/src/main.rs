use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

// Import from docoutline-core
use docoutline_core::batch::{collect_inputs, write_json, write_reports};
use docoutline_core::rules::engine::DebugConfig;
use docoutline_core::{
    BatchOptions, BatchProcessor, BatchSummary, ConfigManager, JsonLayoutSource, OutlineConfig,
    OutlineExtractor, Preset,
};

#[derive(Parser)]
#[command(name = "docoutline")]
#[command(about = "Extract a title and heading outline from document layout dumps")]
struct Args {
    /// Layout dump to process, or a directory of them
    #[arg(short, long, default_value = "input")]
    input: PathBuf,

    /// Output directory; one <stem>.json per document
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Built-in preset: generic, strict or lenient
    #[arg(long, default_value = "generic")]
    preset: Preset,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    show_config: bool,

    /// Worker threads (0 = one per core)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Number of the first page in the output (0 or 1)
    #[arg(long)]
    page_base: Option<u32>,

    /// Write <stem>.stages.json with every intermediate stage next to each output
    #[arg(long)]
    dump_stages: bool,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    profile: bool,

    /// Exit non-zero when any document fails (all documents are still processed)
    #[arg(long)]
    fail_on_error: bool,

    /// Log every rule verdict for lines matching these patterns (regex or substring)
    #[arg(long)]
    debug_filter: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = resolve_config(&args)?;

    if args.show_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    tracing::info!("🦀 Docoutline ({:?} preset)", config.preset);

    let fingerprint = config.fingerprint()?;
    let workers = config.batch.workers;
    let extension = config.batch.input_extension.clone();
    let fail_on_error = config.batch.fail_on_error;

    let mut extractor = OutlineExtractor::new(config).context("building outline extractor")?;
    if !args.debug_filter.is_empty() {
        extractor.set_debug_config(DebugConfig::new(true, args.debug_filter.clone()));
    }

    if !args.input.exists() {
        bail!("input not found: {}", args.input.display());
    }
    let inputs = collect_inputs(&args.input, &extension)
        .with_context(|| format!("listing inputs in {}", args.input.display()))?;
    if inputs.is_empty() {
        tracing::warn!("⚠️  No *.{} layout dumps found in {}", extension, args.input.display());
    }

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating output directory {}", args.output.display()))?;

    let processor = BatchProcessor::new(extractor, Box::new(JsonLayoutSource::new()), workers);
    let options = BatchOptions {
        capture_stages: args.dump_stages,
        profile: args.profile,
    };
    let reports = processor.process_all(&inputs, options)?;

    let write_failures = write_reports(&reports, &args.output);

    let mut summary = BatchSummary::from_reports(&reports);
    summary.record_write_failures(write_failures);
    save_summary(&summary, &fingerprint, processor.extractor().config(), &args.output)?;

    tracing::info!(
        "📊 {} documents: {} succeeded, {} failed",
        summary.total,
        summary.succeeded,
        summary.failed
    );

    if fail_on_error && summary.failed > 0 {
        bail!("{} of {} documents failed", summary.failed, summary.total);
    }
    Ok(())
}

/// Preset or config file, then command-line overrides
fn resolve_config(args: &Args) -> Result<OutlineConfig> {
    let mut manager = ConfigManager::new()?;

    let preset = match &args.config {
        Some(path) => {
            let preset = manager
                .load_config_from_file(path)
                .with_context(|| format!("loading config {path}"))?;
            tracing::info!("📋 Loaded config from: {}", path);
            preset
        }
        None => args.preset,
    };
    let mut config = manager.get_config(&preset).clone();

    if let Some(jobs) = args.jobs {
        config.batch.workers = jobs;
    }
    if let Some(page_base) = args.page_base {
        config.page_base = page_base;
    }
    if args.fail_on_error {
        config.batch.fail_on_error = true;
    }

    config.validate()?;
    Ok(config)
}

// Summary file: quick reference for validation scripts
fn save_summary(
    summary: &BatchSummary,
    fingerprint: &str,
    config: &OutlineConfig,
    output_dir: &Path,
) -> Result<()> {
    let record = serde_json::json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "preset": config.preset,
        "page_base": config.page_base,
        "config_fingerprint": fingerprint,
        "total": summary.total,
        "succeeded": summary.succeeded,
        "failed": summary.failed,
        "failures": summary.failures,
    });
    let summary_path = output_dir.join("summary.json");
    write_json(&record, &summary_path)?;
    tracing::info!("💾 {}", summary_path.display());
    Ok(())
}
