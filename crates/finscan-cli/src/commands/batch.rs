//! Batch processing command for multiple OCR documents.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use finscan_core::{Category, DocumentResult, FinscanConfig, OcrDocument, Pipeline};

use super::process::{OutputFormat, format_result, process_document};
use super::{load_config, output_name};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for OCR result files (e.g. "ocr/*.json")
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each document
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    document: Option<DocumentResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let pipeline = Pipeline::new(&config)?;

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
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        tokio::fs::create_dir_all(output_dir).await?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // Documents are independent; processed in order.
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let result = process_single_file(&path, &pipeline).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(document) => {
                if let Some(output_dir) = &args.output_dir {
                    write_output(output_dir, &path, &document, args.format, &config).await?;
                }
                results.push(ProcessResult {
                    path,
                    document: Some(document),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        document: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    let successful = results.iter().filter(|r| r.document.is_some()).count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    let discrepancies: usize = results
        .iter()
        .filter_map(|r| r.document.as_ref())
        .map(DocumentResult::discrepancy_count)
        .sum();

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
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed, {} balance discrepancies",
        style(successful).green(),
        style(failed.len()).red(),
        style(discrepancies).yellow()
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

async fn process_single_file(path: &Path, pipeline: &Pipeline) -> anyhow::Result<DocumentResult> {
    let content = tokio::fs::read_to_string(path).await?;
    let document = OcrDocument::from_json(&content)?;

    if document.pages.is_empty() {
        anyhow::bail!("No pages in OCR document");
    }

    Ok(process_document(pipeline, &document, None, path))
}

async fn write_output(
    output_dir: &Path,
    input: &Path,
    document: &DocumentResult,
    format: OutputFormat,
    config: &FinscanConfig,
) -> anyhow::Result<()> {
    let suffix = match format {
        OutputFormat::Json => "_result.json",
        OutputFormat::Csv => "_result.csv",
        OutputFormat::Text => "_result.txt",
    };

    let output_path = output_dir.join(output_name(input, suffix));
    tokio::fs::write(&output_path, format_result(document, format, config)?).await?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn count_category(document: &DocumentResult, category: Category) -> usize {
    document.pages.iter().filter(|p| p.category == category).count()
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "pages",
        "bank_statement",
        "check",
        "salary_slip",
        "other",
        "discrepancies",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");

        if let Some(document) = &result.document {
            wtr.write_record([
                filename,
                "success",
                &document.pages.len().to_string(),
                &count_category(document, Category::BankStatement).to_string(),
                &count_category(document, Category::Check).to_string(),
                &count_category(document, Category::SalarySlip).to_string(),
                &count_category(document, Category::Other).to_string(),
                &document.discrepancy_count().to_string(),
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
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
