//! Analyze command - rebuild the structure of a single page.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use yomi_core::models::config::PolicySelection;
use yomi_core::models::document::{Block, Document};
use yomi_core::export::{table_rows, to_html, to_markdown};
use yomi_core::{DocumentAnalyzer, PageDetections};

use super::load_config;

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Detection JSON file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Reading-order policy (overrides the config file)
    #[arg(short, long, value_enum)]
    policy: Option<PolicyArg>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON document
    Json,
    /// HTML page
    Html,
    /// Markdown
    Markdown,
    /// CSV rows of tables and paragraphs
    Csv,
    /// Plain text in reading order
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "md",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum PolicyArg {
    /// Detect from paragraph directions
    Auto,
    /// Top to bottom, left to right
    Horizontal,
    /// Right-to-left columns, top to bottom
    Vertical,
}

impl From<PolicyArg> for PolicySelection {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Auto => PolicySelection::Auto,
            PolicyArg::Horizontal => PolicySelection::Horizontal,
            PolicyArg::Vertical => PolicySelection::Vertical,
        }
    }
}

pub async fn run(args: AnalyzeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(policy) = args.policy {
        config.reading_order.policy = policy.into();
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Analyzing file: {}", args.input.display());

    let page = PageDetections::from_file(&args.input)?;
    let analyzer = DocumentAnalyzer::builder().with_config(config).build();
    let document = analyzer.analyze(&page);

    let output = format_document(&document, args.format, args.pretty)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
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

/// Render a document in the requested format.
pub fn format_document(document: &Document, format: OutputFormat, pretty: bool) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json if pretty => Ok(serde_json::to_string_pretty(document)?),
        OutputFormat::Json => Ok(serde_json::to_string(document)?),
        OutputFormat::Html => Ok(to_html(document)),
        OutputFormat::Markdown => Ok(to_markdown(document)),
        OutputFormat::Csv => format_csv(document),
        OutputFormat::Text => Ok(format_text(document)),
    }
}

/// Tables as rows of cell text, paragraphs as single-field rows, a blank row
/// after every block.
fn format_csv(document: &Document) -> anyhow::Result<String> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(vec![]);

    for block in document.blocks() {
        match block {
            Block::Table(table) => {
                for row in table_rows(table) {
                    wtr.write_record(&row)?;
                }
            }
            Block::Paragraph(paragraph) => {
                wtr.write_record([paragraph.contents.as_deref().unwrap_or_default()])?;
            }
            Block::Figure(_) => continue,
        }
        wtr.write_record([""])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(document: &Document) -> String {
    let mut output = String::new();

    output.push_str(&format!("Policy: {:?}\n", document.policy));
    output.push_str(&format!("Paragraphs: {}\n", document.paragraphs.len()));
    output.push_str(&format!("Tables: {}\n", document.tables.len()));
    output.push_str(&format!("Figures: {}\n", document.figures.len()));
    output.push('\n');
    output.push_str(&document.text());

    output
}
