use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use blockcov::commands::{disas_command, generate_command, list_backends_command};

/// Basic block coverage report generator CLI.
///
/// This CLI is a thin wrapper around `blockcov-core` (exposed in code as
/// `blockcov_core`). All substantive logic lives in the library so it can
/// be tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "blockcov",
    version,
    about = "Basic block coverage reports from translation-block traces",
    long_about = None
)]
struct Cli {
    /// Only log errors.
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate basic block coverage reports for every module in a trace.
    ///
    /// Coverage can be written in one of two formats:
    /// - A single JSON file per module, aggregating the basic block
    ///   coverage across **all** states.
    /// - Multiple drcov files per module, one per state, compatible with
    ///   the IDA Pro Lighthouse plugin.
    Generate {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Aggregated trace JSON file. Defaults to `tbcoverage.json` in
        /// the results directory.
        #[arg(long)]
        trace: Option<String>,

        /// Write per-state drcov files instead of the aggregate JSON report.
        #[arg(long, default_value_t = false)]
        drcov: bool,

        /// Disassembler backend to use (see `blockcov backends`).
        #[arg(long)]
        backend: Option<String>,

        /// Directory to search when resolving module paths (repeatable).
        #[arg(long = "search-path")]
        search_paths: Vec<String>,

        /// Directory reports are written into. Defaults to `<root>/s2e-last`.
        #[arg(long)]
        results_dir: Option<String>,

        /// Project config file. Defaults to `<root>/blockcov.yaml` when present.
        #[arg(long)]
        config: Option<String>,
    },

    /// Disassemble one module and refresh its `.disas` cache artifact.
    Disas {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Path to the module to disassemble.
        #[arg(long)]
        module: String,

        /// Disassembler backend to use (see `blockcov backends`).
        #[arg(long)]
        backend: Option<String>,

        /// Project config file. Defaults to `<root>/blockcov.yaml` when present.
        #[arg(long)]
        config: Option<String>,
    },

    /// List the disassembler backends compiled into this binary.
    Backends {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet { LevelFilter::Error } else { LevelFilter::Info };
    SimpleLogger::new().with_level(level).init().ok();

    match cli.command {
        Command::Generate { root, trace, drcov, backend, search_paths, results_dir, config } => {
            generate_command(
                &root,
                trace.as_deref(),
                drcov,
                backend.as_deref(),
                &search_paths,
                results_dir.as_deref(),
                config.as_deref(),
            )
        }
        Command::Disas { root, module, backend, config } => {
            disas_command(&root, &module, backend.as_deref(), config.as_deref())
        }
        Command::Backends { json } => list_backends_command(json),
    }
}
