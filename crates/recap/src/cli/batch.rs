//! The `recap batch` command: check every caption in a JSONL manifest.
//!
//! Each manifest line is `{"image": "<path>", "caption": "<text>"}`. Relative
//! image paths resolve against the manifest's directory. One result record is
//! written per manifest line, in manifest order, as soon as it is ready.

use super::{build_enhancer, expand_path};
use anyhow::Context;
use clap::Args;
use recap_core::{CaptionRequest, Config, EnhanceError, EnhancementResult, Outcome};
use serde::{Deserialize, Serialize};
use std::fs::File;
use futures_util::{Stream, StreamExt};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Arguments for the `batch` command.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSONL manifest of {"image", "caption"} lines
    pub manifest: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of captions checked concurrently (overrides config)
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Model name (overrides `service.model`)
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    image: PathBuf,
    caption: String,
}

/// One line of batch output.
#[derive(Debug, Serialize)]
struct BatchRecord {
    image: PathBuf,
    original_caption: String,
    caption: String,
    used_enhancement: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl BatchRecord {
    fn new(entry: ManifestEntry, result: Result<EnhancementResult, EnhanceError>) -> Self {
        match result {
            Ok(result) => Self {
                image: entry.image,
                original_caption: entry.caption,
                caption: result.caption,
                used_enhancement: result.used_enhancement,
                outcome: Some(result.outcome),
                error: None,
            },
            Err(e) => Self {
                image: entry.image,
                caption: entry.caption.clone(),
                original_caption: entry.caption,
                used_enhancement: false,
                outcome: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Execute the batch command.
pub async fn execute(args: BatchArgs, config: &Config) -> anyhow::Result<()> {
    let manifest = expand_path(&args.manifest);
    let content = std::fs::read_to_string(&manifest)
        .with_context(|| format!("Failed to read manifest {}", manifest.display()))?;
    let base = manifest.parent().unwrap_or(Path::new("."));
    let entries = parse_manifest(&content, base)?;

    if entries.is_empty() {
        tracing::warn!("Manifest {} has no entries", manifest.display());
        return Ok(());
    }

    let mut config = config.clone();
    if let Some(parallel) = args.parallel {
        config.enhancement_settings.parallel = parallel.max(1);
    }
    let enhancer = build_enhancer(&config, args.model.as_deref())?;

    tracing::info!(
        "Checking {} captions ({} concurrent)",
        entries.len(),
        config.enhancement_settings.parallel
    );
    let start = std::time::Instant::now();

    let requests: Vec<CaptionRequest> = entries
        .iter()
        .map(|e| CaptionRequest::new(e.image.clone(), e.caption.clone()))
        .collect();
    let results = enhancer.enhance_stream(&requests);

    let summary = match &args.output {
        Some(path) => {
            let path = expand_path(path);
            let file = File::create(&path)
                .with_context(|| format!("Failed to create output {}", path.display()))?;
            stream_records(entries, results, BufWriter::new(file)).await?
        }
        None => stream_records(entries, results, std::io::stdout()).await?,
    };

    tracing::info!(
        "Done in {:.1}s: {} corrected, {} unchanged, {} fell back, {} failed",
        start.elapsed().as_secs_f64(),
        summary.corrected,
        summary.unchanged,
        summary.fallback,
        summary.failed
    );
    Ok(())
}

fn parse_manifest(content: &str, base: &Path) -> anyhow::Result<Vec<ManifestEntry>> {
    let mut entries = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut entry: ManifestEntry = serde_json::from_str(line)
            .with_context(|| format!("Invalid manifest entry on line {}", idx + 1))?;
        entry.image = expand_path(&entry.image);
        if entry.image.is_relative() {
            entry.image = base.join(&entry.image);
        }
        entries.push(entry);
    }
    Ok(entries)
}

/// Write one JSONL record per result as the ordered stream yields it.
async fn stream_records<S, W>(
    entries: Vec<ManifestEntry>,
    results: S,
    mut writer: W,
) -> anyhow::Result<Summary>
where
    S: Stream<Item = Result<EnhancementResult, EnhanceError>>,
    W: Write,
{
    let mut results = std::pin::pin!(results);
    let mut summary = Summary::default();

    for entry in entries {
        let Some(result) = results.next().await else {
            anyhow::bail!("Result stream ended before {}", entry.image.display());
        };
        let record = BatchRecord::new(entry, result);
        summary.add(&record);
        serde_json::to_writer(&mut writer, &record)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    Ok(summary)
}

#[derive(Debug, Default, PartialEq)]
struct Summary {
    corrected: usize,
    unchanged: usize,
    fallback: usize,
    failed: usize,
}

impl Summary {
    fn add(&mut self, record: &BatchRecord) {
        match record.outcome {
            Some(Outcome::Corrected) => self.corrected += 1,
            Some(Outcome::Fallback) => self.fallback += 1,
            Some(_) => self.unchanged += 1,
            None => self.failed += 1,
        }
    }
}
