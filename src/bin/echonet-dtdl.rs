//! ECHONET Lite to Digital Twin CLI
//!
//! Command-line interface for converting device descriptions into interface
//! documents and for checking them for unsupported constructs.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use echonet_dtdl::{
    convert, load_document_auto, Conversion, ConversionStats, ConvertError, ConvertOptions,
    Diagnostic, DEFAULT_CONTEXT, DEFAULT_MAX_DEPTH, DEFAULT_NAMESPACE,
};

#[derive(Parser)]
#[command(name = "echonet-dtdl")]
#[command(about = "Convert ECHONET Lite device descriptions into Digital Twin interfaces")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a device description into interface documents
    Convert {
        /// Device description source: file path or URL (http:// or https://)
        source: String,

        /// Output file (stdout if not specified)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Write the output on a single line
        #[arg(long)]
        compact: bool,

        /// Namespace of generated urn identifiers
        #[arg(long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,

        /// Value of every @context member
        #[arg(long, default_value = DEFAULT_CONTEXT)]
        context: String,

        /// Maximum nesting of type descriptors
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Exit with status 1 if any diagnostic was produced
        #[arg(long)]
        strict: bool,
    },

    /// Check a device description without writing output
    Check {
        /// Device description source: file path or URL (http:// or https://)
        source: String,

        /// Report format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Only print the summary line
        #[arg(long, short)]
        quiet: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            source,
            output,
            compact,
            namespace,
            context,
            max_depth,
            strict,
        } => {
            let options = ConvertOptions::new()
                .namespace(namespace)
                .context(context)
                .max_depth(max_depth);
            run_convert(&source, output, compact, &options, strict)
        }
        Commands::Check {
            source,
            format,
            quiet,
        } => run_check(&source, format, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("error"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(err: ConvertError) -> u8 {
    eprintln!("Error: {}", err);
    err.exit_code() as u8
}

fn load_and_convert(source: &str, options: &ConvertOptions) -> Result<Conversion, u8> {
    let document = load_document_auto(source).map_err(fail)?;
    convert(&document, options).map_err(fail)
}

fn run_convert(
    source: &str,
    output: Option<PathBuf>,
    compact: bool,
    options: &ConvertOptions,
    strict: bool,
) -> Result<(), u8> {
    let conversion = load_and_convert(source, options)?;

    for diag in &conversion.diagnostics {
        eprintln!("warning{}", diag_line(diag));
    }

    let rendered = if compact {
        conversion.to_json()
    } else {
        conversion.to_json_pretty()
    }
    .map_err(fail)?;

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered).map_err(|source| {
                fail(ConvertError::WriteError {
                    path: path.clone(),
                    source,
                })
            })?;
        }
        None => println!("{}", rendered),
    }

    if strict && !conversion.is_clean() {
        eprintln!(
            "Error: {} diagnostic(s) in strict mode",
            conversion.diagnostics.len()
        );
        return Err(1);
    }
    Ok(())
}

#[derive(Serialize)]
struct CheckReport<'a> {
    source: &'a str,
    stats: ConversionStats,
    diagnostics: &'a [Diagnostic],
}

fn run_check(source: &str, format: Format, quiet: bool) -> Result<(), u8> {
    let conversion = load_and_convert(source, &ConvertOptions::default())?;
    let stats = conversion.stats;

    match format {
        Format::Json => {
            let report = CheckReport {
                source,
                stats,
                diagnostics: &conversion.diagnostics,
            };
            let rendered = serde_json::to_string_pretty(&report)
                .map_err(|source| fail(ConvertError::Serialize { source }))?;
            println!("{}", rendered);
        }
        Format::Text => {
            if !quiet {
                println!("Checking {} ...\n", source);
                for diag in &conversion.diagnostics {
                    println!("  {}", diag_line(diag));
                }
                if !conversion.is_clean() {
                    println!();
                }
            }

            if conversion.is_clean() {
                println!(
                    "\x1b[32m✓ {} devices emitted, {} dropped, {} interfaces\x1b[0m",
                    stats.devices_emitted, stats.devices_dropped, stats.interfaces
                );
            } else {
                println!(
                    "\x1b[31m✗ {} devices emitted, {} dropped, {} interfaces ({} diagnostics)\x1b[0m",
                    stats.devices_emitted,
                    stats.devices_dropped,
                    stats.interfaces,
                    conversion.diagnostics.len()
                );
            }
        }
    }

    if conversion.is_clean() {
        Ok(())
    } else {
        Err(1)
    }
}

fn diag_line(diag: &Diagnostic) -> String {
    format!("[{}]: {} - {}", diag.code, diag.path, diag.message)
}
