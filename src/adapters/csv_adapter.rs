//! CSV loaders for seeding an indicator store.
//!
//! Three headered formats:
//! - indicators: `ticker,date,indicator,value` (date as YYYY-MM-DD)
//! - profiles: `ticker,sector`
//! - levels: `ticker,support,resistance`

use crate::domain::error::NlqError;
use crate::domain::market_data::{IndicatorRecord, PriceLevels, StockProfile};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct LevelRow {
    ticker: String,
    support: f64,
    resistance: f64,
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, NlqError> {
    let import_error = |reason: String| NlqError::Import {
        file: path.display().to_string(),
        reason,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| import_error(e.to_string()))?;

    let mut rows = Vec::new();
    for result in rdr.deserialize::<T>() {
        rows.push(result.map_err(|e| import_error(format!("CSV parse error: {e}")))?);
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "csv file read");
    Ok(rows)
}

pub fn read_indicator_records(path: &Path) -> Result<Vec<IndicatorRecord>, NlqError> {
    let records: Vec<IndicatorRecord> = read_rows(path)?;
    if let Some(bad) = records.iter().find(|r| !r.value.is_finite()) {
        return Err(NlqError::Import {
            file: path.display().to_string(),
            reason: format!(
                "non-finite value for {} {} on {}",
                bad.ticker, bad.indicator, bad.date
            ),
        });
    }
    Ok(records)
}

pub fn read_profiles(path: &Path) -> Result<Vec<StockProfile>, NlqError> {
    read_rows(path)
}

/// Support must not exceed resistance.
pub fn read_levels(path: &Path) -> Result<Vec<(String, PriceLevels)>, NlqError> {
    let rows: Vec<LevelRow> = read_rows(path)?;
    rows.into_iter()
        .map(|row| {
            if row.support > row.resistance {
                return Err(NlqError::Import {
                    file: path.display().to_string(),
                    reason: format!(
                        "support {} above resistance {} for {}",
                        row.support, row.resistance, row.ticker
                    ),
                });
            }
            Ok((
                row.ticker,
                PriceLevels {
                    support: row.support,
                    resistance: row.resistance,
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn reads_indicator_records() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "indicators.csv",
            "ticker,date,indicator,value\n\
             GP,2024-01-15,RSI_14,71.5\n\
             BRAC, 2024-01-15 ,volume,120000\n",
        );

        let records = read_indicator_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ticker, "GP");
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(records[0].indicator, "RSI_14");
        assert_eq!(records[1].value, 120000.0);
    }

    #[test]
    fn bad_date_is_import_error() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "indicators.csv",
            "ticker,date,indicator,value\nGP,15/01/2024,RSI_14,71.5\n",
        );
        match read_indicator_records(&path).unwrap_err() {
            NlqError::Import { file, reason } => {
                assert!(file.ends_with("indicators.csv"));
                assert!(reason.contains("CSV parse error"));
            }
            other => panic!("expected Import, got {other}"),
        }
    }

    #[test]
    fn missing_file_is_import_error() {
        let err = read_profiles(Path::new("/nonexistent/profiles.csv")).unwrap_err();
        assert!(matches!(err, NlqError::Import { .. }));
    }

    #[test]
    fn reads_profiles() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "profiles.csv", "ticker,sector\nGP,Telecom\nBRAC,Bank\n");
        let profiles = read_profiles(&path).unwrap();
        assert_eq!(
            profiles[1],
            StockProfile {
                ticker: "BRAC".into(),
                sector: "Bank".into()
            }
        );
    }

    #[test]
    fn reads_levels() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "levels.csv",
            "ticker,support,resistance\nGP,300,350.5\n",
        );
        let levels = read_levels(&path).unwrap();
        assert_eq!(levels[0].0, "GP");
        assert_eq!(levels[0].1.resistance, 350.5);
    }

    #[test]
    fn inverted_levels_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "levels.csv", "ticker,support,resistance\nGP,400,350\n");
        assert!(matches!(
            read_levels(&path),
            Err(NlqError::Import { ref reason, .. }) if reason.contains("GP")
        ));
    }
}
