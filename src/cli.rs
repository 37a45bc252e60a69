//! CLI definition and dispatch.
//!
//! JSON goes to stdout; progress and errors go to stderr. Failures print
//! `error: ...` and exit with the code mapped from `NlqError`.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::catalogue::catalogue;
use crate::domain::error::NlqError;
use crate::domain::interpreter::Interpreter;
use crate::domain::settings::InterpreterSettings;

#[derive(Parser, Debug)]
#[command(
    name = "quant-nlq",
    about = "Natural-language queries over equity technical indicators"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify a query and print the structured result
    Parse {
        query: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Classify a query and execute it against the indicator store
    Query {
        query: String,
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated tickers to restrict the search to
        #[arg(long)]
        tickers: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        limit: Option<i64>,
        /// Point-in-time view (YYYY-MM-DD), overriding `[sqlite] as_of`
        #[arg(long, value_parser = parse_date)]
        as_of: Option<NaiveDate>,
    },
    /// Print example queries and supported indicators
    Examples,
    /// Create the store schema and load CSV files into it
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        indicators: Option<PathBuf>,
        #[arg(long)]
        profiles: Option<PathBuf>,
        #[arg(long)]
        levels: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Parse { query, config } => run_parse(&query, config.as_deref()),
        Command::Query {
            query,
            config,
            tickers,
            limit,
            as_of,
        } => run_query(&query, &config, tickers.as_deref(), limit, as_of),
        Command::Examples => run_examples(),
        Command::Import {
            config,
            indicators,
            profiles,
            levels,
        } => run_import(
            &config,
            indicators.as_deref(),
            profiles.as_deref(),
            levels.as_deref(),
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

/// Split a comma-separated ticker list. Blank entries are kept so that
/// request validation can reject them.
pub fn parse_tickers(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

pub fn load_settings(config: Option<&Path>) -> Result<InterpreterSettings, NlqError> {
    match config {
        Some(path) => InterpreterSettings::from_config(&FileConfigAdapter::from_file(path)?),
        None => Ok(InterpreterSettings::default()),
    }
}

pub fn render_json<T: Serialize>(value: &T) -> Result<String, NlqError> {
    serde_json::to_string_pretty(value).map_err(|e| NlqError::Io(std::io::Error::other(e)))
}

fn run_parse(query: &str, config: Option<&Path>) -> Result<(), NlqError> {
    let interpreter = Interpreter::new(load_settings(config)?);
    let parsed = interpreter.parse(query);
    println!("{}", render_json(&parsed)?);
    Ok(())
}

fn run_examples() -> Result<(), NlqError> {
    println!("{}", render_json(&catalogue())?);
    Ok(())
}

#[cfg(feature = "sqlite")]
fn run_query(
    query: &str,
    config_path: &Path,
    tickers: Option<&str>,
    limit: Option<i64>,
    as_of: Option<NaiveDate>,
) -> Result<(), NlqError> {
    use crate::adapters::sqlite_adapter::SqliteIndicatorStore;

    let config = FileConfigAdapter::from_file(config_path)?;
    let interpreter = Interpreter::new(InterpreterSettings::from_config(&config)?);
    let mut store = SqliteIndicatorStore::from_config(&config)?;
    if as_of.is_some() {
        store = store.with_as_of(as_of);
    }

    let tickers = tickers.map(parse_tickers);
    let result = interpreter.query(&store, query, tickers.as_deref(), limit)?;
    println!("{}", render_json(&result)?);
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn run_query(
    _query: &str,
    _config_path: &Path,
    _tickers: Option<&str>,
    _limit: Option<i64>,
    _as_of: Option<NaiveDate>,
) -> Result<(), NlqError> {
    Err(NlqError::data_unavailable(
        "sqlite feature is required for query",
    ))
}

#[cfg(feature = "sqlite")]
fn run_import(
    config_path: &Path,
    indicators: Option<&Path>,
    profiles: Option<&Path>,
    levels: Option<&Path>,
) -> Result<(), NlqError> {
    use crate::adapters::csv_adapter::{read_indicator_records, read_levels, read_profiles};
    use crate::adapters::sqlite_adapter::SqliteIndicatorStore;

    let config = FileConfigAdapter::from_file(config_path)?;
    let store = SqliteIndicatorStore::from_config(&config)?;
    store.initialize_schema()?;

    if let Some(path) = indicators {
        let count = store.insert_indicators(&read_indicator_records(path)?)?;
        eprintln!("Imported {count} indicator rows from {}", path.display());
    }
    if let Some(path) = profiles {
        let count = store.insert_profiles(&read_profiles(path)?)?;
        eprintln!("Imported {count} stock profiles from {}", path.display());
    }
    if let Some(path) = levels {
        let count = store.insert_levels(&read_levels(path)?)?;
        eprintln!("Imported {count} price levels from {}", path.display());
    }
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn run_import(
    _config_path: &Path,
    _indicators: Option<&Path>,
    _profiles: Option<&Path>,
    _levels: Option<&Path>,
) -> Result<(), NlqError> {
    Err(NlqError::data_unavailable(
        "sqlite feature is required for import",
    ))
}
