//! Process command - classify, extract and validate one OCR document.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info, warn};

use finscan_core::extract::format_amount;
use finscan_core::models::record::{CheckStatus, Discrepancy};
use finscan_core::{
    Category, DocumentResult, FinscanConfig, OcrDocument, PageValidation, Pipeline, Rows,
    TableStrategyKind,
};

use super::{OrderedMap, load_config, to_json};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// OCR result file (JSON: page id -> text items)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Treat every page as this category instead of classifying it
    #[arg(long)]
    category: Option<String>,

    /// Transaction row strategy (overrides the config)
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Write balance discrepancies per page to this JSON file
    #[arg(long)]
    discrepancies: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one line per page
    Csv,
    /// Plain text summary
    Text,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum StrategyArg {
    /// Regex over the concatenated page text
    Pattern,
    /// Token positions within each OCR line
    LineTokens,
}

impl From<StrategyArg> for TableStrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Pattern => TableStrategyKind::Pattern,
            StrategyArg::LineTokens => TableStrategyKind::LineTokens,
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(strategy) = args.strategy {
        config.extraction.table_strategy = strategy.into();
    }

    let category = args.category.as_deref().map(str::parse::<Category>).transpose()?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let content = tokio::fs::read_to_string(&args.input).await?;
    let document = OcrDocument::from_json(&content)?;
    if document.pages.is_empty() {
        warn!("{} contains no pages", args.input.display());
    }

    let pipeline = Pipeline::new(&config)?;
    let result = process_document(&pipeline, &document, category, &args.input);

    if let Some(path) = &args.discrepancies {
        write_discrepancies(path, &result, &config).await?;
    }

    let output = format_result(&result, args.format, &config)?;

    if let Some(output_path) = &args.output {
        tokio::fs::write(output_path, &output).await?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Run the pipeline over a document, forcing `category` when given.
pub fn process_document(
    pipeline: &Pipeline,
    document: &OcrDocument,
    category: Option<Category>,
    source: &Path,
) -> DocumentResult {
    let mut result = match category {
        Some(category) => DocumentResult {
            source: None,
            pages: document
                .pages
                .iter()
                .map(|page| pipeline.process_page_as(page, category))
                .collect(),
        },
        None => pipeline.process_document(document),
    };
    result.source = Some(source.display().to_string());
    result
}

async fn write_discrepancies(
    path: &Path,
    result: &DocumentResult,
    config: &FinscanConfig,
) -> anyhow::Result<()> {
    let by_page: Vec<(&str, &[Discrepancy])> = result
        .pages
        .iter()
        .map(|p| (p.page.as_str(), p.validation.discrepancies()))
        .filter(|(_, d)| !d.is_empty())
        .collect();

    if by_page.is_empty() {
        info!("No balance discrepancies found");
    } else {
        warn!(
            "{} balance discrepancies on {} pages",
            result.discrepancy_count(),
            by_page.len()
        );
    }

    tokio::fs::write(path, to_json(&OrderedMap(by_page), config.output.json_indent)?).await?;
    eprintln!(
        "{} Discrepancies written to {}",
        style("✓").green(),
        path.display()
    );
    Ok(())
}

pub fn format_result(
    result: &DocumentResult,
    format: OutputFormat,
    config: &FinscanConfig,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => to_json(result, config.output.json_indent),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn validation_status(validation: &PageValidation) -> &'static str {
    match validation {
        PageValidation::Validated(r) if r.success => "validated",
        PageValidation::Validated(_) => "discrepancies",
        PageValidation::NotValidated { .. } => "not_validated",
        PageValidation::NotApplicable => "not_applicable",
    }
}

fn format_csv(result: &DocumentResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "page",
        "category",
        "confidence",
        "fields",
        "rows",
        "validation",
        "discrepancies",
        "acceptance",
    ])?;

    for page in &result.pages {
        let fields = page
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ");

        wtr.write_record([
            page.page.as_str(),
            page.category.as_str(),
            &format!("{:.2}", page.confidence),
            &fields,
            &page.rows.len().to_string(),
            validation_status(&page.validation),
            &page.validation.discrepancies().len().to_string(),
            if page.acceptance.passed() { "passed" } else { "failed" },
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &DocumentResult) -> String {
    let mut output = String::new();

    if let Some(source) = &result.source {
        output.push_str(&format!("Document: {}\n", source));
    }

    for page in &result.pages {
        output.push_str(&format!(
            "\n{}: {} (score {:.2})\n",
            page.page, page.category, page.confidence
        ));

        for (field, value) in page.fields.iter() {
            output.push_str(&format!("  {}: {}\n", field, value));
        }

        match &page.rows {
            Rows::Transactions(rows) => {
                output.push_str(&format!("  Transactions: {}\n", rows.len()));
                for row in rows {
                    output.push_str(&format!(
                        "    {} {:<30} +{:>12} -{:>12} = {}\n",
                        row.date.as_deref().unwrap_or("-"),
                        row.description,
                        format_amount(row.credit),
                        format_amount(row.debit),
                        row.balance.map(format_amount).unwrap_or_else(|| "?".to_string())
                    ));
                }
            }
            Rows::Salary(rows) => {
                output.push_str(&format!("  Salary components: {}\n", rows.len()));
                for row in rows {
                    output.push_str(&format!("    {:<30} {}\n", row.component, row.amount));
                }
            }
            Rows::None => {}
        }

        match &page.validation {
            PageValidation::Validated(r) if r.success => output.push_str("  Balance: OK\n"),
            PageValidation::Validated(r) => {
                output.push_str(&format!("  Balance: {} discrepancies\n", r.discrepancies.len()));
                for d in &r.discrepancies {
                    output.push_str(&format!(
                        "    row {}: stated {}, calculated {}\n",
                        d.row,
                        d.expected_balance.map(format_amount).unwrap_or_else(|| "?".to_string()),
                        format_amount(d.calculated_balance)
                    ));
                }
            }
            PageValidation::NotValidated { reason } => {
                output.push_str(&format!("  Balance: not validated ({})\n", reason));
            }
            PageValidation::NotApplicable => {}
        }

        let checks = page
            .acceptance
            .checks
            .iter()
            .filter(|c| c.status != CheckStatus::NoExpectation);
        for check in checks {
            output.push_str(&format!(
                "  Expected {} = {}, found {} ({:?})\n",
                check.field,
                check.expected.as_deref().unwrap_or("-"),
                check.found.as_deref().unwrap_or("-"),
                check.status
            ));
        }
    }

    output
}
