use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use codesim_guard::source::read_text;
use codesim_guard::{Analyzer, CodesimResult, Hyperparameters, SourceFile};

#[derive(Parser)]
#[command(
    name = "codesim-guard",
    about = "Compare source files and flag code that looks machine-generated",
    version
)]
struct Cli {
    /// TOML file overriding the default hyperparameters
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print single-line JSON
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compare two files written in the same language
    Compare { file1: PathBuf, file2: PathBuf },
    /// Score files for AI-likelihood (reads stdin if none provided)
    Detect { files: Vec<PathBuf> },
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> CodesimResult<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{json}");
    Ok(())
}

fn run(cli: &Cli) -> CodesimResult<()> {
    let hp = match &cli.config {
        Some(path) => Hyperparameters::from_file(path)?,
        None => Hyperparameters::default(),
    };
    let analyzer = Analyzer::new(hp)?;

    match &cli.command {
        Command::Compare { file1, file2 } => {
            let report = analyzer.compare_files(file1, file2)?;
            print_json(&report, cli.compact)
        }
        Command::Detect { files } if files.is_empty() => {
            let input = read_text(std::io::stdin().lock(), "<stdin>", analyzer.hyperparameters())?;
            print_json(&analyzer.detect_ai_likelihood(&input), cli.compact)
        }
        Command::Detect { files } => {
            for path in files {
                let source = SourceFile::read(path, analyzer.hyperparameters())?;
                print_json(&analyzer.detect_ai_likelihood(&source.text), cli.compact)?;
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let status = if e.is_validation() { 2 } else { 1 };
            if !e.is_validation() {
                tracing::error!("{e}");
            }
            let body = ErrorBody {
                error: e.to_string(),
            };
            if let Ok(json) = serde_json::to_string(&body) {
                println!("{json}");
            }
            ExitCode::from(status)
        }
    }
}
