mod commands;
mod input;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Serialization of the converted schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DocumentFormat {
    Yaml,
    Json,
}

/// Legacy spreadsheet form converter.
#[derive(Parser)]
#[command(
    name = "formlift",
    version,
    about = "Convert legacy spreadsheet form definitions into form schemas"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log dropped fragments and excluded rows
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a row CSV into a form schema document
    Convert {
        /// Path to the form rows CSV
        #[arg(long)]
        rows: PathBuf,
        /// Path to the mapping config (.toml or .json)
        #[arg(long)]
        config: PathBuf,
        /// Path to the lookup CSV
        #[arg(long)]
        lookups: Option<PathBuf>,
        /// Write the schema here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Schema document format
        #[arg(long, default_value = "yaml", value_enum)]
        format: DocumentFormat,
        /// Write the run summary JSON here
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Compile one visibility expression and print its rules
    Compile {
        /// The raw expression, e.g. "A = 'x' OR 'y'"
        expression: String,
        /// Mapping config supplying operator synonyms
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Report unresolved references, option mismatches and cycles
    Lint {
        /// Path to a schema document (.yaml, .yml or .json)
        schema: PathBuf,
    },

    /// List the fields visible for a set of answers
    Eval {
        /// Path to a schema document (.yaml, .yml or .json)
        schema: PathBuf,
        /// Path to the answers JSON object
        #[arg(long)]
        answers: PathBuf,
    },
}

/// Flags win over `FORMLIFT_LOG`; without either, only warnings show.
fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_env("FORMLIFT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Convert {
            rows,
            config,
            lookups,
            out,
            format,
            summary,
        } => {
            commands::convert::cmd_convert(
                &commands::convert::ConvertArgs {
                    rows: &rows,
                    config: &config,
                    lookups: lookups.as_deref(),
                    out: out.as_deref(),
                    format,
                    summary: summary.as_deref(),
                },
                cli.output,
                cli.quiet,
            );
        }
        Commands::Compile { expression, config } => {
            commands::compile::cmd_compile(&expression, config.as_deref(), cli.output, cli.quiet);
        }
        Commands::Lint { schema } => {
            commands::lint::cmd_lint(&schema, cli.output, cli.quiet);
        }
        Commands::Eval { schema, answers } => {
            commands::eval::cmd_eval(&schema, &answers, cli.output, cli.quiet);
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}

/// Report `msg` and exit with status 1.
pub(crate) fn fail(msg: &str, output: OutputFormat, quiet: bool) -> ! {
    report_error(msg, output, quiet);
    std::process::exit(1);
}
