//! Classify command - label each page of an OCR document.

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::info;

use finscan_core::{Category, Classifier, OcrDocument};

use super::{OrderedMap, load_config, to_json};

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// OCR result file (JSON: page id -> text items)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct PageLabel {
    category: Category,
    score: f64,
}

pub async fn run(args: ClassifyArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let content = tokio::fs::read_to_string(&args.input).await?;
    let document = OcrDocument::from_json(&content)?;
    let classifier = Classifier::new(&config.classification)?;

    let labels: Vec<(String, PageLabel)> = document
        .pages
        .iter()
        .map(|page| {
            let result = classifier.classify_page(page);
            info!("{}: {} ({})", page.id, result.category, result.score);
            (
                page.id.clone(),
                PageLabel {
                    category: result.category,
                    score: result.score,
                },
            )
        })
        .collect();

    let output = to_json(&OrderedMap(labels), config.output.json_indent)?;

    if let Some(output_path) = &args.output {
        tokio::fs::write(output_path, &output).await?;
        println!(
            "{} Classification written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    Ok(())
}
