//! `lpair run` / `lpair validate` / `lpair init-config`.

use std::path::{Path, PathBuf};

use clap::Args;
use ledgerpair_io::{csv as csv_io, xlsx, IoError, EDW_SHEET, JOURNAL_SHEET};
use ledgerpair_recon::amount::format_minor_units_wide;
use ledgerpair_recon::model::{ReconMeta, ReconSummary};
use ledgerpair_recon::{load_input, run_with_options, RawTable, ReconConfig, ReconResult, RunOptions};
use serde::Serialize;

use crate::exit_codes::{
    io_exit_code, recon_exit_code, EXIT_AMBIGUOUS, EXIT_IO, EXIT_UNMATCHED, EXIT_USAGE,
};
use crate::CliError;

#[derive(Args)]
pub struct RunArgs {
    /// Path to the reconciliation TOML config
    #[arg(long)]
    pub config: PathBuf,

    /// Workbook holding `EDW` and `Journal` sheets
    #[arg(long, conflicts_with_all = ["edw", "journal"], required_unless_present_all = ["edw", "journal"])]
    pub workbook: Option<PathBuf>,

    /// EDW transactions as CSV
    #[arg(long, requires = "journal")]
    pub edw: Option<PathBuf>,

    /// Journal entries as CSV
    #[arg(long, requires = "edw")]
    pub journal: Option<PathBuf>,

    /// Write rows to a file (.xlsx or .csv). Without it, CSV rows go to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Print the full result (entries, proofs, rows, summary) as JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Write run metadata and summary as JSON to this path
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    /// Worker threads (0 = one per core). Overrides `parallel.workers`.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Matching deadline in milliseconds. Overrides `search.deadline_ms`.
    #[arg(long)]
    pub deadline_ms: Option<u64>,

    /// Exit 6 when any match was picked among tied covers or after a search cap
    #[arg(long)]
    pub fail_on_ambiguous: bool,
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn from_io(err: IoError) -> CliError {
    recon_err(io_exit_code(&err), err.to_string())
}

fn load_config(path: &Path) -> Result<ReconConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| recon_err(EXIT_IO, format!("cannot read config {}: {e}", path.display())))?;
    let config = ReconConfig::from_toml(&text).map_err(|e| CliError {
        code: recon_exit_code(&e),
        message: format!("{}: {e}", path.display()),
        hint: Some("run `lpair init-config` to see every option with its default".into()),
    })?;
    log::info!("loaded config '{}' from {}", config.name, path.display());
    Ok(config)
}

enum OutputKind {
    Xlsx,
    Csv,
}

fn output_kind(path: &Path) -> Result<OutputKind, CliError> {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("xlsx") => Ok(OutputKind::Xlsx),
        Some("csv") => Ok(OutputKind::Csv),
        _ => Err(CliError {
            code: EXIT_USAGE,
            message: format!("unsupported output file: {}", path.display()),
            hint: Some("use a .xlsx or .csv extension".into()),
        }),
    }
}

fn read_tables(args: &RunArgs) -> Result<(RawTable, RawTable), CliError> {
    match (&args.workbook, &args.edw, &args.journal) {
        (Some(workbook), _, _) => xlsx::read_workbook_tables(workbook).map_err(from_io),
        (None, Some(edw), Some(journal)) => {
            let edw = csv_io::read_csv_table(edw, EDW_SHEET).map_err(from_io)?;
            let journal = csv_io::read_csv_table(journal, JOURNAL_SHEET).map_err(from_io)?;
            Ok((edw, journal))
        }
        _ => Err(recon_err(EXIT_USAGE, "pass --workbook, or both --edw and --journal")),
    }
}

#[derive(Serialize)]
struct SummaryOutput<'a> {
    meta: &'a ReconMeta,
    summary: &'a ReconSummary,
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let mut config = load_config(&args.config)?;
    if let Some(ms) = args.deadline_ms {
        config.search.deadline_ms = Some(ms);
    }
    // Fail on a bad --out before doing any work
    let out_kind = args.out.as_deref().map(output_kind).transpose()?;

    let (edw, journal) = read_tables(&args)?;
    let input = load_input(&edw, &journal, &config)
        .map_err(|e| recon_err(recon_exit_code(&e), e.to_string()))?;

    let options = RunOptions {
        workers: args.workers,
        ..RunOptions::default()
    };
    let result = run_with_options(&config, &input, &options)
        .map_err(|e| recon_err(recon_exit_code(&e), e.to_string()))?;

    match (&args.out, out_kind) {
        (Some(path), Some(OutputKind::Xlsx)) => {
            xlsx::write_workbook(&result, &edw, &journal, path).map_err(from_io)?;
            eprintln!("wrote {}", path.display());
        }
        (Some(path), Some(OutputKind::Csv)) => {
            csv_io::write_csv(&result.rows, config.minor_unit_digits, path).map_err(from_io)?;
            eprintln!("wrote {}", path.display());
        }
        _ if args.json => {}
        _ => {
            let stdout = std::io::stdout();
            csv_io::write_rows(&result.rows, config.minor_unit_digits, stdout.lock())
                .map_err(|e| recon_err(EXIT_IO, format!("cannot write rows: {e}")))?;
        }
    }

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| recon_err(EXIT_IO, format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    if let Some(ref path) = args.summary_json {
        let summary = SummaryOutput {
            meta: &result.meta,
            summary: &result.summary,
        };
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| recon_err(EXIT_IO, format!("JSON serialization error: {e}")))?;
        std::fs::write(path, json)
            .map_err(|e| recon_err(EXIT_IO, format!("cannot write {}: {e}", path.display())))?;
    }

    print_summary(&result);
    verdict(&result, args.fail_on_ambiguous)
}

fn print_summary(result: &ReconResult) {
    let s = &result.summary;
    let digits = result.meta.minor_unit_digits;
    eprintln!(
        "reconciled {} journal entries: {} matched ({} {}), {} unmatched ({} {})",
        s.total_entries,
        s.matched_count,
        format_minor_units_wide(s.total_matched_amount, digits),
        result.meta.currency,
        s.unmatched_count,
        format_minor_units_wide(s.total_unmatched_amount, digits),
        result.meta.currency,
    );
    eprintln!(
        "EDW transactions: {} of {} consumed",
        s.transactions_consumed, s.transactions_total
    );
    for (reason, count) in &s.reason_counts {
        eprintln!("  {reason}: {count}");
    }
    if s.ambiguous > 0 {
        eprintln!("ambiguous matches: {}", s.ambiguous);
    }
}

fn verdict(result: &ReconResult, fail_on_ambiguous: bool) -> Result<(), CliError> {
    let s = &result.summary;
    if fail_on_ambiguous && s.ambiguous > 0 {
        return Err(recon_err(
            EXIT_AMBIGUOUS,
            format!("{} ambiguous match(es) (--fail-on-ambiguous)", s.ambiguous),
        ));
    }
    if s.unmatched_count > 0 {
        // Summary already printed; exit code carries the verdict
        return Err(recon_err(EXIT_UNMATCHED, ""));
    }
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "valid: '{}' ({}, {} minor digits, max_group_size {}, max_cover_size {})",
        config.name,
        config.currency,
        config.minor_unit_digits,
        config.search.max_group_size,
        config.search.max_cover_size,
    );
    Ok(())
}

pub fn cmd_init_config(output: Option<PathBuf>, force: bool) -> Result<(), CliError> {
    let text = ReconConfig::default()
        .to_toml()
        .map_err(|e| recon_err(recon_exit_code(&e), e.to_string()))?;

    match output {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            if path.exists() && !force {
                return Err(CliError {
                    code: EXIT_USAGE,
                    message: format!("{} already exists", path.display()),
                    hint: Some("pass --force to overwrite".into()),
                });
            }
            std::fs::write(&path, text)
                .map_err(|e| recon_err(EXIT_IO, format!("cannot write {}: {e}", path.display())))?;
            eprintln!("wrote {}", path.display());
            Ok(())
        }
    }
}
