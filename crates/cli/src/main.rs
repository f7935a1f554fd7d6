// lpair - Journal to EDW bank reconciliation from the command line

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::EXIT_SUCCESS;
use recon::RunArgs;

#[derive(Parser)]
#[command(name = "lpair")]
#[command(about = "Match journal debits to bank EDW transactions by exact subset sum")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a journal against EDW transactions
    #[command(after_help = "\
Examples:
  lpair run --config recon.toml --workbook daily.xlsx --out reconciled.xlsx
  lpair run --config recon.toml --edw edw.csv --journal journal.csv > rows.csv
  lpair run --config recon.toml --workbook daily.xlsx --json --out rows.csv
  RUST_LOG=info lpair run --config recon.toml --workbook daily.xlsx --summary-json summary.json")]
    Run(RunArgs),

    /// Check a config file without running
    #[command(after_help = "\
Examples:
  lpair validate --config recon.toml")]
    Validate {
        /// Path to the reconciliation TOML config
        #[arg(long)]
        config: PathBuf,
    },

    /// Print (or write) a config holding every default
    #[command(after_help = "\
Examples:
  lpair init-config > recon.toml
  lpair init-config --output recon.toml")]
    InitConfig {
        /// Write to this path instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("LPAIR_COMMIT"), ")",
        "\nengine:  ledgerpair-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("LPAIR_TARGET"),
    )
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => recon::cmd_run(args),
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::InitConfig { output, force } => recon::cmd_init_config(output, force),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
