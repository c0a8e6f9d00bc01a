//! Herostory CLI
//!
//! Generates a hero story from character and world descriptions and renders
//! it as a PDF.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use herostory::config::HeroStoryConfig;
use herostory::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "herostory", version, about = "Illustrated hero stories from generative services")]
struct Cli {
    /// Configuration file (TOML). Environment variables are applied on top.
    #[arg(long, global = true, env = "HEROSTORY_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, overriding the configured level.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format: text or json.
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the pipeline and write the document.
    Generate {
        /// File holding the character description.
        #[arg(long)]
        character: PathBuf,
        /// File holding the world description.
        #[arg(long)]
        world: PathBuf,
        /// PDF output path.
        #[arg(long, default_value = "story.pdf")]
        out: PathBuf,
        /// Also write the pipeline result as JSON.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Render a document from a saved result or client payload.
    Render {
        /// JSON file with a pipeline result or document payload.
        #[arg(long)]
        payload: PathBuf,
        /// PDF output path.
        #[arg(long, default_value = "story.pdf")]
        out: PathBuf,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<HeroStoryConfig> {
    let mut config = match &cli.config {
        Some(path) => HeroStoryConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => HeroStoryConfig::from_env().context("loading config from environment")?,
    };
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    if let Some(format) = &cli.log_format {
        config.logging.format.clone_from(format);
    }
    Ok(config)
}

async fn open_store(config: &HeroStoryConfig) -> anyhow::Result<Arc<FsBlobStore>> {
    let store = FsBlobStore::open(&config.storage.output_dir)
        .await
        .with_context(|| format!("opening output directory {}", config.storage.output_dir.display()))?
        .with_url_prefix(&config.storage.url_prefix);
    Ok(Arc::new(store))
}

async fn read_text(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

async fn write_pdf(
    payload: &DocumentPayload,
    store: &FsBlobStore,
    config: &HeroStoryConfig,
    out: &Path,
) -> anyhow::Result<()> {
    let pdf = assemble_document(payload, store, &DocumentOptions::from_config(config))
        .await
        .context("assembling document")?;
    tokio::fs::write(out, &pdf)
        .await
        .with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(path = %out.display(), bytes = pdf.len(), "Wrote document");
    Ok(())
}

async fn generate(
    config: &HeroStoryConfig,
    character: &Path,
    world: &Path,
    out: &Path,
    json: Option<&Path>,
) -> anyhow::Result<()> {
    let character = read_text(character).await?;
    let world = read_text(world).await?;

    let store = open_store(config).await?;
    let generators = Generators::from_config(config, store.clone()).context("building generators")?;
    let pipeline = Pipeline::from_config(config, generators);

    let result = run_pipeline(&pipeline, character, world).await?;

    if let Some(path) = json {
        let serialized = serde_json::to_string_pretty(&result)?;
        tokio::fs::write(path, serialized)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
    }

    for stage in &result.stages {
        let detail = stage
            .error
            .as_deref()
            .or(stage.skip_reason.as_deref())
            .map(|d| format!(" ({d})"))
            .unwrap_or_default();
        println!("  {:<16} {}{detail}", stage.name.as_str(), stage.status);
    }

    if let Some(fatal) = &result.fatal_error {
        bail!("{fatal}");
    }
    write_pdf(&DocumentPayload::from(&result), &store, config, out).await?;
    println!("Wrote {}", out.display());
    Ok(())
}

async fn render(config: &HeroStoryConfig, payload: &Path, out: &Path) -> anyhow::Result<()> {
    let json = read_text(payload).await?;
    let payload = DocumentPayload::from_json(&json).context("parsing payload")?;
    let store = open_store(config).await?;
    write_pdf(&payload, &store, config, out).await?;
    println!("Wrote {}", out.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    herostory::observability::init_tracing(&config.logging).context("initializing logging")?;

    match &cli.command {
        Command::Generate {
            character,
            world,
            out,
            json,
        } => generate(&config, character, world, out, json.as_deref()).await,
        Command::Render { payload, out } => render(&config, payload, out).await,
    }
}
