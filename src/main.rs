//! # Quire CLI
//!
//! Usage:
//!   quire input.json -o output.pdf
//!   echo '{ ... }' | quire - -o output.pdf
//!   quire input.json --dump
//!   quire --example > report.json

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use quire::image_loader::SourceImageProvider;
use quire::text::StandardMetrics;
use quire::Document;

/// Lay out a JSON document description into pages and write a PDF.
#[derive(Debug, Parser)]
#[command(name = "quire", version)]
struct Cli {
    /// Input JSON file, or `-` for stdin.
    input: Option<PathBuf>,

    /// Where to write the PDF.
    #[arg(short, long, default_value = "output.pdf")]
    output: PathBuf,

    /// Print the page and fragment tree with heights instead of writing a PDF.
    #[arg(long)]
    dump: bool,

    /// Print a sample document and exit.
    #[arg(long)]
    example: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.example {
        print!("{}", example_json());
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> quire::Result<()> {
    let input = match &cli.input {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)?,
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let mut document = Document::from_json(&input, &SourceImageProvider::new())?;

    if cli.dump {
        document.layout(&StandardMetrics::new())?;
        print!("{}", document.describe());
        return Ok(());
    }

    let pdf_bytes = quire::render(&mut document)?;
    fs::write(&cli.output, &pdf_bytes)?;
    eprintln!(
        "✓ Written {} bytes ({} pages) to {}",
        pdf_bytes.len(),
        document.pages().len(),
        cli.output.display()
    );
    Ok(())
}

fn example_json() -> &'static str {
    r##"{
  "name": "Quarterly Report",
  "orientation": "portrait",
  "margin": 36,
  "font": "helvetica",
  "header": { "type": "text", "content": "Acme Corp - Quarterly Report", "fontStyle": "bold", "border": true },
  "footer": { "type": "text", "content": "Page {{pageNumber}} of {{totalPages}}", "textAlign": "center", "fontSize": 8 },
  "content": [
    { "type": "text", "content": "Summary", "fontSize": 18, "fontStyle": "bold", "margin": { "bottom": 6 } },
    "Revenue grew in every region this quarter. The tables below break the numbers down by region and by product line.",
    {
      "type": "row",
      "border": true,
      "overflow": "noSplit",
      "content": [
        { "type": "text", "content": ["Region", "North", "South", "East", "West"], "fixedWidth": 120, "fontStyle": "bold" },
        { "type": "text", "content": ["Q1", "1.2M", "0.9M", "1.4M", "1.1M"], "textAlign": "right" },
        { "type": "text", "content": ["Q2", "1.4M", "1.0M", "1.5M", "1.3M"], "textAlign": "right" }
      ]
    },
    {
      "type": "column",
      "fillColor": "#eeeeee",
      "padding": 8,
      "margin": { "top": 12 },
      "header": { "type": "text", "content": "Notes", "fontStyle": "bold" },
      "content": [
        "Figures are unaudited.",
        "Regional totals include returns processed after quarter end."
      ]
    }
  ]
}
"##
}
