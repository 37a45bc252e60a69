//! SQLite indicator store.
//!
//! Precomputed indicator values live in one long table keyed by
//! `(ticker, name, date)`. Sector membership and support/resistance levels
//! are one row per ticker. An optional `as_of` date hides every indicator
//! row after it, giving a point-in-time view of the same database.

use crate::domain::error::NlqError;
use crate::domain::indicator::Indicator;
use crate::domain::market_data::{
    IndicatorRecord, IndicatorRow, PairRow, PriceLevels, StockProfile,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::indicator_port::IndicatorPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, params_from_iter, OptionalExtension};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteIndicatorStore {
    pool: Pool<SqliteConnectionManager>,
    as_of: Option<NaiveDate>,
}

impl SqliteIndicatorStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, NlqError> {
        let db_path = config
            .get_string("sqlite", "path")
            .ok_or_else(|| NlqError::ConfigMissing {
                section: "sqlite".into(),
                key: "path".into(),
            })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4);
        if !(1..=i64::from(u32::MAX)).contains(&pool_size) {
            return Err(NlqError::ConfigInvalid {
                section: "sqlite".into(),
                key: "pool_size".into(),
                reason: format!("pool_size must be a positive integer, got {pool_size}"),
            });
        }

        let as_of = match config.get_string("sqlite", "as_of") {
            Some(raw) => Some(NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(
                |e: chrono::ParseError| NlqError::ConfigInvalid {
                    section: "sqlite".into(),
                    key: "as_of".into(),
                    reason: format!("'{raw}' is not a YYYY-MM-DD date: {e}"),
                },
            )?),
            None => None,
        };

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size as u32)
            .build(manager)
            .map_err(|e: r2d2::Error| NlqError::data_unavailable(e))?;

        tracing::debug!(path = %db_path, pool_size, ?as_of, "sqlite store opened");
        Ok(Self { pool, as_of })
    }

    pub fn in_memory() -> Result<Self, NlqError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| NlqError::data_unavailable(e))?;

        Ok(Self { pool, as_of: None })
    }

    /// Restrict every read to rows dated on or before `as_of`.
    pub fn with_as_of(mut self, as_of: Option<NaiveDate>) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn as_of(&self) -> Option<NaiveDate> {
        self.as_of
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, NlqError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| NlqError::data_unavailable(e))
    }

    pub fn initialize_schema(&self) -> Result<(), NlqError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS indicators (
                ticker TEXT NOT NULL,
                date TEXT NOT NULL,
                name TEXT NOT NULL,
                value REAL NOT NULL,
                PRIMARY KEY (ticker, name, date)
            );
            CREATE INDEX IF NOT EXISTS idx_indicators_name_date ON indicators(name, date);
            CREATE TABLE IF NOT EXISTS stock_profiles (
                ticker TEXT PRIMARY KEY,
                sector TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS price_levels (
                ticker TEXT PRIMARY KEY,
                support REAL NOT NULL,
                resistance REAL NOT NULL
            );",
        )
        .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))?;

        Ok(())
    }

    /// Upsert indicator values. Known indicator names are stored under their
    /// canonical spelling; tickers are upper-cased.
    pub fn insert_indicators(&self, records: &[IndicatorRecord]) -> Result<usize, NlqError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))?;

        for record in records {
            let name = Indicator::from_name(&record.indicator)
                .map(|i| i.name().to_string())
                .unwrap_or_else(|| record.indicator.trim().to_string());
            tx.execute(
                "INSERT OR REPLACE INTO indicators (ticker, date, name, value)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    normalize_ticker(&record.ticker),
                    record.date.format(DATE_FORMAT).to_string(),
                    name,
                    record.value
                ],
            )
            .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))?;
        Ok(records.len())
    }

    pub fn insert_profiles(&self, profiles: &[StockProfile]) -> Result<usize, NlqError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))?;

        for profile in profiles {
            tx.execute(
                "INSERT OR REPLACE INTO stock_profiles (ticker, sector) VALUES (?1, ?2)",
                params![normalize_ticker(&profile.ticker), profile.sector.trim()],
            )
            .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))?;
        Ok(profiles.len())
    }

    pub fn insert_levels(&self, levels: &[(String, PriceLevels)]) -> Result<usize, NlqError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))?;

        for (ticker, level) in levels {
            tx.execute(
                "INSERT OR REPLACE INTO price_levels (ticker, support, resistance)
                 VALUES (?1, ?2, ?3)",
                params![normalize_ticker(ticker), level.support, level.resistance],
            )
            .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))?;
        Ok(levels.len())
    }

    /// Appends the `as_of` and ticker filters for `alias.date` / `alias.ticker`.
    fn filters(&self, alias: &str, tickers: Option<&[String]>, args: &mut Vec<String>) -> String {
        let mut sql = String::new();
        if let Some(as_of) = self.as_of {
            args.push(as_of.format(DATE_FORMAT).to_string());
            sql.push_str(&format!(" AND {alias}.date <= ?{}", args.len()));
        }
        if let Some(tickers) = tickers {
            let placeholders: Vec<String> = tickers
                .iter()
                .map(|t| {
                    args.push(normalize_ticker(t));
                    format!("?{}", args.len())
                })
                .collect();
            sql.push_str(&format!(
                " AND {alias}.ticker IN ({})",
                placeholders.join(", ")
            ));
        }
        sql
    }
}

fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

fn parse_date(raw: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            raw.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

impl IndicatorPort for SqliteIndicatorStore {
    fn fetch(
        &self,
        indicator: &str,
        tickers: Option<&[String]>,
    ) -> Result<Vec<IndicatorRow>, NlqError> {
        if tickers.is_some_and(|t| t.is_empty()) {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;

        let mut args = vec![indicator.to_string()];
        let filters = self.filters("i", tickers, &mut args);
        let query = format!(
            "SELECT i.ticker, i.date, i.value
             FROM indicators i
             WHERE i.name = ?1{filters}
             ORDER BY i.ticker ASC, i.date ASC"
        );

        let mut stmt = conn
            .prepare(&query)
            .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))?;

        let rows = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok(IndicatorRow {
                    ticker: row.get(0)?,
                    date: parse_date(row.get(1)?)?,
                    value: row.get(2)?,
                })
            })
            .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))?;

        let rows = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))?;

        tracing::debug!(indicator, rows = rows.len(), "indicator rows fetched");
        Ok(rows)
    }

    fn fetch_pair(
        &self,
        fast: &str,
        slow: &str,
        tickers: Option<&[String]>,
    ) -> Result<Vec<PairRow>, NlqError> {
        if tickers.is_some_and(|t| t.is_empty()) {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;

        let mut args = vec![fast.to_string(), slow.to_string()];
        let filters = self.filters("f", tickers, &mut args);
        let query = format!(
            "SELECT f.ticker, f.date, f.value, s.value
             FROM indicators f
             JOIN indicators s ON s.ticker = f.ticker AND s.date = f.date AND s.name = ?2
             WHERE f.name = ?1{filters}
             ORDER BY f.ticker ASC, f.date ASC"
        );

        let mut stmt = conn
            .prepare(&query)
            .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))?;

        let rows = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok(PairRow {
                    ticker: row.get(0)?,
                    date: parse_date(row.get(1)?)?,
                    fast_value: row.get(2)?,
                    slow_value: row.get(3)?,
                })
            })
            .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))
    }

    fn sector_mean(&self, indicator: &str, sector: &str) -> Result<Option<f64>, NlqError> {
        let conn = self.conn()?;

        let mut args = vec![indicator.to_string(), sector.to_string()];
        let latest_filter = self.filters("j", None, &mut args);
        let query = format!(
            "SELECT AVG(i.value)
             FROM indicators i
             JOIN stock_profiles p ON p.ticker = i.ticker
             WHERE i.name = ?1
               AND p.sector = ?2 COLLATE NOCASE
               AND i.date = (
                   SELECT MAX(j.date) FROM indicators j
                   WHERE j.ticker = i.ticker AND j.name = i.name{latest_filter}
               )"
        );

        conn.query_row(&query, params_from_iter(args.iter()), |row| {
            row.get::<_, Option<f64>>(0)
        })
        .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))
    }

    fn sector_of(&self, ticker: &str) -> Result<Option<String>, NlqError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT sector FROM stock_profiles WHERE ticker = ?1",
            params![normalize_ticker(ticker)],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))
    }

    fn support_resistance_levels(&self, ticker: &str) -> Result<Option<PriceLevels>, NlqError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT support, resistance FROM price_levels WHERE ticker = ?1",
            params![normalize_ticker(ticker)],
            |row| {
                Ok(PriceLevels {
                    support: row.get(0)?,
                    resistance: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(|e: rusqlite::Error| NlqError::data_unavailable(e))
    }
}
