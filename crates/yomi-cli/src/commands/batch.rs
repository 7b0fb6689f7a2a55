//! Batch command - analyze many detection files concurrently.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use yomi_core::{Document, DocumentAnalyzer, PageDetections};

use super::analyze::{OutputFormat, format_document};
use super::load_config;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of detection JSON files
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of analyzing a single file.
struct FileResult {
    path: PathBuf,
    document: Option<Document>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            ext.eq_ignore_ascii_case("json")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to analyze",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
        check_no_input_overwrite(&files, output_dir, args.format)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // Pages share no state, so each one runs on the blocking pool
    let analyzer = Arc::new(DocumentAnalyzer::builder().with_config(config).build());
    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    info!("Analyzing {} files with {} workers", files.len(), args.jobs.max(1));

    let mut handles = Vec::with_capacity(files.len());
    for path in files {
        let analyzer = analyzer.clone();
        let semaphore = semaphore.clone();

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let file_start = Instant::now();

            let task_path = path.clone();
            let result = tokio::task::spawn_blocking(move || analyze_file(&task_path, &analyzer)).await;
            let result = match result {
                Ok(inner) => inner,
                Err(e) => Err(anyhow::anyhow!("Worker failed: {}", e)),
            };

            let processing_time_ms = file_start.elapsed().as_millis() as u64;
            match result {
                Ok(document) => FileResult {
                    path,
                    document: Some(document),
                    error: None,
                    processing_time_ms,
                },
                Err(e) => FileResult {
                    path,
                    document: None,
                    error: Some(e.to_string()),
                    processing_time_ms,
                },
            }
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let result = handle.await?;

        if let Some(error_msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to analyze {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to analyze {}: {}", result.path.display(), error_msg);
                pb.abandon();
                anyhow::bail!("Analysis of {} failed: {}", result.path.display(), error_msg);
            }
        }

        pb.inc(1);
        results.push(result);
    }

    pb.finish_with_message("Complete");

    // Write outputs
    let successful: Vec<_> = results.iter().filter(|r| r.document.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(document) = &result.document {
                let output_path = output_path(output_dir, &result.path, args.format);
                fs::write(&output_path, format_document(document, args.format, false)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Analyzed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn output_path(output_dir: &Path, input: &Path, format: OutputFormat) -> PathBuf {
    let output_name = input.file_stem().and_then(|s| s.to_str()).unwrap_or("page");
    output_dir.join(format!("{}.{}", output_name, format.extension()))
}

/// Fail before any analysis if an output file would replace one of the inputs.
fn check_no_input_overwrite(files: &[PathBuf], output_dir: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let output_dir = fs::canonicalize(output_dir)?;

    for file in files {
        let input = fs::canonicalize(file)?;
        let target = output_path(&output_dir, &input, format);
        if target == input {
            anyhow::bail!(
                "Output for {} would overwrite the input file; choose another --output-dir or --format",
                file.display()
            );
        }
    }

    Ok(())
}

fn analyze_file(path: &Path, analyzer: &DocumentAnalyzer) -> anyhow::Result<Document> {
    let page = PageDetections::from_file(path)?;
    Ok(analyzer.analyze(&page))
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "policy",
        "paragraphs",
        "tables",
        "figures",
        "words",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");

        if let Some(document) = &result.document {
            wtr.write_record([
                filename,
                "success",
                &format!("{:?}", document.policy).to_lowercase(),
                &document.paragraphs.len().to_string(),
                &document.tables.len().to_string(),
                &document.figures.len().to_string(),
                &document.words.len().to_string(),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
