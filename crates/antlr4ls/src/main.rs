//! The ANTLR4 grammar language server CLI.
//!
//! Provides the `antlr4ls` command with the following subcommands:
//!
//! - `antlr4ls lsp` - Start the LSP server over stdin/stdout (the default)
//! - `antlr4ls check <files>...` - Analyze grammars and print diagnostics
//!
//! Options:
//! - `--log-level` - Log filter for stderr (overrides `ANTLR4LS_LOG`)
//! - `--json` - Output diagnostics as JSON (one object per line)
//! - `--no-color` - Disable colorized output
//! - `--lib` - Directory searched for imports and token vocabularies

mod check;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use antlr4ls_tool::Tool;

use crate::check::CheckOptions;

const LOG_ENV: &str = "ANTLR4LS_LOG";

#[derive(Parser)]
#[command(name = "antlr4ls", version, about = "ANTLR4 grammar language server")]
struct Cli {
    /// Log filter written to stderr, e.g. `debug` or `antlr4ls_lsp=trace`
    #[arg(long = "log-level", global = true)]
    log_level: Option<String>,

    /// Accepted for editor compatibility; stdio is the only transport
    #[arg(long, global = true, hide = true)]
    stdio: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the LSP server (communicates via stdin/stdout)
    Lsp {
        /// Directory searched for imported grammars and .tokens files
        #[arg(long)]
        lib: Option<PathBuf>,
    },
    /// Analyze grammar files and report diagnostics
    Check {
        /// Grammar files to analyze
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output diagnostics as JSON (one object per line) instead of human-readable format
        #[arg(long)]
        json: bool,

        /// Disable colorized output
        #[arg(long = "no-color")]
        no_color: bool,

        /// Directory searched for imported grammars and .tokens files
        #[arg(long)]
        lib: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match cli.command.unwrap_or(Commands::Lsp { lib: None }) {
        Commands::Lsp { lib } => {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("error: failed to create tokio runtime: {}", e);
                    process::exit(1);
                }
            };
            rt.block_on(antlr4ls_lsp::run_server(tool_with(lib)));
        }
        Commands::Check {
            files,
            json,
            no_color,
            lib,
        } => {
            let options = CheckOptions {
                color: !no_color && !json,
                json,
            };
            let summary = check::check_files(&tool_with(lib), &files, &options);
            if summary.failed() {
                process::exit(1);
            }
        }
    }
}

fn tool_with(lib: Option<PathBuf>) -> Tool {
    match lib {
        Some(dir) => Tool::new().with_lib_dir(dir),
        None => Tool::new(),
    }
}

/// Logs go to stderr; stdout belongs to the LSP transport.
fn init_logging(level: Option<&str>) {
    let filter = level
        .and_then(|level| EnvFilter::try_new(level).ok())
        .or_else(|| EnvFilter::try_from_env(LOG_ENV).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
