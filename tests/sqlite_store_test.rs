//! End-to-end: CSV files -> SQLite store -> interpreter queries.

#![cfg(feature = "sqlite")]

use quant_nlq::adapters::csv_adapter::{read_indicator_records, read_levels, read_profiles};
use quant_nlq::adapters::file_config_adapter::FileConfigAdapter;
use quant_nlq::adapters::sqlite_adapter::SqliteIndicatorStore;
use quant_nlq::cli::load_settings;
use quant_nlq::domain::interpreter::Interpreter;
use quant_nlq::domain::query::QueryType;
use quant_nlq::domain::settings::InterpreterSettings;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const INDICATORS: &str = "ticker,date,indicator,value
GP,2024-03-01,RSI_14,65
GP,2024-03-04,RSI_14,68
GP,2024-03-05,RSI_14,74
BRAC,2024-03-01,RSI_14,45
BRAC,2024-03-04,RSI_14,38
BRAC,2024-03-05,RSI_14,28
SQPH,2024-03-05,RSI_14,55
GP,2024-03-05,volume,900000
BRAC,2024-03-05,volume,1500000
SQPH,2024-03-05,volume,400000
GP,2024-03-05,close,352
BRAC,2024-03-05,close,41
SQPH,2024-03-05,close,210
GP,2024-03-01,MACD_line,-0.4
GP,2024-03-01,MACD_signal,0.1
GP,2024-03-04,MACD_line,-0.1
GP,2024-03-04,MACD_signal,0.0
GP,2024-03-05,MACD_line,0.3
GP,2024-03-05,MACD_signal,0.1
";

const PROFILES: &str = "ticker,sector
GP,Telecom
BRAC,Bank
SQPH,Pharmaceuticals
";

const LEVELS: &str = "ticker,support,resistance
GP,300,355
BRAC,40.5,55
";

struct Fixture {
    _dir: TempDir,
    config_path: PathBuf,
}

fn fixture(extra_config: &str) -> Fixture {
    let dir = TempDir::new().unwrap();
    let write = |name: &str, content: &str| {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    };

    let indicators = write("indicators.csv", INDICATORS);
    let profiles = write("profiles.csv", PROFILES);
    let levels = write("levels.csv", LEVELS);
    let config_path = write(
        "nlq.ini",
        &format!(
            "[sqlite]\npath = {}\npool_size = 2\n{extra_config}",
            dir.path().join("indicators.db").display()
        ),
    );

    let config = FileConfigAdapter::from_file(&config_path).unwrap();
    let store = SqliteIndicatorStore::from_config(&config).unwrap();
    store.initialize_schema().unwrap();
    assert_eq!(
        store
            .insert_indicators(&read_indicator_records(&indicators).unwrap())
            .unwrap(),
        19
    );
    store
        .insert_profiles(&read_profiles(&profiles).unwrap())
        .unwrap();
    store.insert_levels(&read_levels(&levels).unwrap()).unwrap();

    Fixture {
        _dir: dir,
        config_path,
    }
}

fn open(fixture: &Fixture) -> (Interpreter, SqliteIndicatorStore) {
    let config = FileConfigAdapter::from_file(&fixture.config_path).unwrap();
    (
        Interpreter::new(InterpreterSettings::from_config(&config).unwrap()),
        SqliteIndicatorStore::from_config(&config).unwrap(),
    )
}

#[test]
fn threshold_and_cues() {
    let fx = fixture("");
    let (interpreter, store) = open(&fx);

    let result = interpreter
        .query(&store, "stocks with RSI above 70", None, None)
        .unwrap();
    assert_eq!(result.tickers(), vec!["GP"]);

    let result = interpreter.query(&store, "oversold stocks", None, None).unwrap();
    assert_eq!(result.tickers(), vec!["BRAC"]);
}

#[test]
fn configured_cue_level_applies() {
    let fx = fixture("[cues]\noverbought = 60\n");
    let (interpreter, store) = open(&fx);
    let result = interpreter.query(&store, "overbought stocks", None, None).unwrap();
    assert_eq!(result.parsed.threshold, Some(60.0));
    assert_eq!(result.tickers(), vec!["GP"]);
}

#[test]
fn ranking_with_sector_and_limit() {
    let fx = fixture("");
    let (interpreter, store) = open(&fx);

    let result = interpreter
        .query(&store, "top 2 stocks by volume", None, None)
        .unwrap();
    assert_eq!(result.tickers(), vec!["BRAC", "GP"]);

    let result = interpreter
        .query(&store, "show 10 bank sector stocks with highest volume", None, None)
        .unwrap();
    assert_eq!(result.tickers(), vec!["BRAC"]);
}

#[test]
fn trend_and_crossover() {
    let fx = fixture("");
    let (interpreter, store) = open(&fx);

    let result = interpreter
        .query(&store, "decreasing RSI for 2 days", None, None)
        .unwrap();
    assert_eq!(result.query_type, QueryType::Trend);
    assert_eq!(result.tickers(), vec!["BRAC"]);

    let result = interpreter
        .query(&store, "MACD bullish crossover", None, None)
        .unwrap();
    assert_eq!(result.tickers(), vec!["GP"]);
    assert_eq!(result.results[0].extra["crossover_date"], "2024-03-05");
}

#[test]
fn support_resistance_and_comparison() {
    let fx = fixture("");
    let (interpreter, store) = open(&fx);

    let result = interpreter
        .query(&store, "price near resistance", None, None)
        .unwrap();
    assert_eq!(result.tickers(), vec!["GP"]);

    let result = interpreter
        .query(&store, "price near support", None, None)
        .unwrap();
    assert_eq!(result.tickers(), vec!["BRAC"]);

    let result = interpreter
        .query(&store, "stocks outperforming their sector", None, None)
        .unwrap();
    assert_eq!(result.query_type, QueryType::Comparison);
    assert!(result.results.is_empty());
}

#[test]
fn as_of_gives_point_in_time_view() {
    let fx = fixture("as_of = 2024-03-04\n");
    let (interpreter, store) = open(&fx);
    assert!(store.as_of().is_some());

    let result = interpreter
        .query(&store, "stocks with RSI above 70", None, None)
        .unwrap();
    assert!(result.results.is_empty());

    let result = interpreter
        .query(&store, "stocks with RSI below 40", None, None)
        .unwrap();
    assert_eq!(result.tickers(), vec!["BRAC"]);
    assert_eq!(result.results[0].value, 38.0);
}

#[test]
fn ticker_subset() {
    let fx = fixture("");
    let (interpreter, store) = open(&fx);
    let subset = vec!["sqph".to_string(), "gp".to_string()];
    let result = interpreter
        .query(&store, "stocks with lowest volume", Some(&subset), Some(1))
        .unwrap();
    assert_eq!(result.tickers(), vec!["SQPH"]);
}

#[test]
fn settings_load_from_config_file() {
    let fx = fixture("[interpreter]\ndefault_ranking_limit = 1\n");
    let settings = load_settings(Some(fx.config_path.as_path())).unwrap();
    assert_eq!(settings.default_ranking_limit, 1);

    let (interpreter, store) = open(&fx);
    let result = interpreter
        .query(&store, "stocks with highest volume", None, None)
        .unwrap();
    assert_eq!(result.tickers(), vec!["BRAC"]);
}
