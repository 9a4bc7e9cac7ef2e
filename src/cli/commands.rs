use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use crate::collaborators::TracingProgress;
use crate::config::{AnalysisConfig, locate_config};
use crate::error::AnalysisError;
use crate::models::BirthdayEntity;
use crate::parsers::{LineFormat, read_transcript_file};
use crate::pipeline::{Collaborators, analyze_with};
use crate::storage::{ResultsDocument, SourceReport, load_results, save_results};
use crate::utils::{collect_transcripts, format_path_with_tilde, sanitize_cell};

const NAME_WIDTH: usize = 24;

#[derive(Parser)]
#[command(name = "chat-birthdays")]
#[command(version = "0.1.0")]
#[command(about = "Find birthdays in exported group chat transcripts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze transcript files, or directories of .txt exports
    Analyze {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Save the full results document to this file
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Also list birthdays below the confidence threshold
        #[arg(long)]
        include_rejected: bool,
    },
    /// Print a results file written by `analyze --output`
    Show {
        results: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        #[arg(long)]
        include_rejected: bool,
    },
    /// List the export line formats that can be read
    Formats,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Analyze { paths, config, format, output, include_rejected }) => {
            let config = load_config(config.as_deref())?;
            let document = analyze_paths(paths, &config)?;
            if let Some(output) = output {
                save_results(output, &document)?;
                info!(path = %output.display(), "Results saved");
            }
            render(&document, *format, *include_rejected)?;
        }
        Some(Commands::Show { results, format, include_rejected }) => {
            let Some(document) = load_results(results)? else {
                bail!(
                    "{} was written by an incompatible version of chat-birthdays",
                    format_path_with_tilde(results)
                );
            };
            render(&document, *format, *include_rejected)?;
        }
        Some(Commands::Formats) => {
            show_formats();
        }
        None => {
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<AnalysisConfig> {
    let config = match locate_config(explicit) {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            AnalysisConfig::from_file(&path)?
        }
        None => AnalysisConfig::default(),
    };
    config.validate().context("Configuration rejected")?;
    Ok(config)
}

/// Analyze every transcript under `inputs`.
///
/// A transcript that cannot be parsed is skipped with a warning; the command
/// fails only when nothing could be analyzed.
fn analyze_paths(inputs: &[PathBuf], config: &AnalysisConfig) -> Result<ResultsDocument> {
    let files = collect_transcripts(inputs)?;
    if files.is_empty() {
        bail!("No .txt transcripts found in the given paths");
    }

    let progress = TracingProgress;
    let collaborators = Collaborators { progress: &progress, ..Default::default() };
    let mut sources = Vec::with_capacity(files.len());
    let mut failures = 0usize;

    for path in &files {
        let text = read_transcript_file(path)?;
        match analyze_with(&text, config, &collaborators) {
            Ok(report) => sources.push(SourceReport { path: path.clone(), report }),
            Err(AnalysisError::Parse(e)) => {
                warn!(path = %path.display(), error = %e, "Skipping transcript");
                eprintln!("Skipping {}: {}", format_path_with_tilde(path), e);
                failures += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to analyze {}", path.display()));
            }
        }
    }

    if sources.is_empty() {
        bail!("None of the {} transcript(s) could be analyzed", failures);
    }
    Ok(ResultsDocument::new(sources))
}

fn render(document: &ResultsDocument, format: OutputFormat, include_rejected: bool) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let mut shown = document.clone();
            if !include_rejected {
                for source in &mut shown.sources {
                    source.report.rejected.clear();
                }
            }
            let json = serde_json::to_string_pretty(&shown).context("Failed to serialize results")?;
            println!("{}", json);
        }
        OutputFormat::Table => print_table(document, include_rejected),
    }
    Ok(())
}

fn print_table(document: &ResultsDocument, include_rejected: bool) {
    println!("Birthdays found: {}", document.entity_count());
    println!("================================");

    for source in &document.sources {
        let report = &source.report;
        println!();
        println!(
            "{} ({} messages, {})",
            format_path_with_tilde(&source.path),
            report.stats.messages,
            report.format
        );

        if report.entities.is_empty() {
            println!("  No birthdays above the confidence threshold");
        } else {
            print_header();
            for entity in &report.entities {
                print_row(entity);
            }
        }

        if include_rejected && !report.rejected.is_empty() {
            println!("  Rejected:");
            for entity in &report.rejected {
                print_row(entity);
            }
        }

        let warning_count =
            report.warnings.len() + report.entities.iter().map(|e| e.warnings.len()).sum::<usize>();
        if warning_count > 0 {
            println!("  Warnings: {}", warning_count);
            for warning in &report.warnings {
                println!("    - {}", sanitize_cell(&warning.to_string(), 100));
            }
        }
    }
}

fn print_header() {
    println!(
        "  {:<6} {:<width$} {:>5}  {:<10} {}",
        "DATE",
        "PERSON",
        "CONF",
        "DECIDED BY",
        "YEARS",
        width = NAME_WIDTH
    );
}

fn print_row(entity: &BirthdayEntity) {
    let person = entity
        .target
        .as_ref()
        .map(|t| sanitize_cell(&t.display_name, NAME_WIDTH))
        .unwrap_or_else(|| "(unknown)".to_string());
    let decided_by = entity
        .occurrences
        .iter()
        .find_map(|o| o.decided_by)
        .map(|s| s.as_str())
        .unwrap_or("-");
    let years: Vec<String> = entity.years().iter().map(|y| y.to_string()).collect();

    println!(
        "  {:<6} {:<width$} {:>5.2}  {:<10} {}",
        entity.date.to_string(),
        person,
        entity.confidence,
        decided_by,
        years.join(","),
        width = NAME_WIDTH
    );
}

fn show_formats() {
    println!("Supported export line formats");
    println!("================================");
    for format in LineFormat::ALL {
        println!("{:<26} {}", format.name(), format.example());
    }
}
