#![allow(dead_code)]

use chrono::NaiveDate;
use quant_nlq::domain::error::NlqError;
pub use quant_nlq::domain::market_data::{IndicatorRow, PairRow, PriceLevels};
use quant_nlq::ports::indicator_port::IndicatorPort;
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};

/// In-memory indicator store with optional failure injection.
pub struct MockIndicatorStore {
    /// indicator name -> rows
    pub series: HashMap<String, Vec<IndicatorRow>>,
    pub sectors: HashMap<String, String>,
    pub levels: HashMap<String, PriceLevels>,
    pub failure: Option<String>,
    pub sector_mean_calls: Cell<usize>,
}

impl MockIndicatorStore {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            sectors: HashMap::new(),
            levels: HashMap::new(),
            failure: None,
            sector_mean_calls: Cell::new(0),
        }
    }

    /// Consecutive daily values for `ticker`, starting 2024-03-01.
    pub fn with_series(mut self, indicator: &str, ticker: &str, values: &[f64]) -> Self {
        let rows = self.series.entry(indicator.to_string()).or_default();
        for (i, value) in values.iter().enumerate() {
            rows.push(IndicatorRow {
                ticker: ticker.to_string(),
                date: day(i as u32),
                value: *value,
            });
        }
        self
    }

    pub fn with_sector(mut self, ticker: &str, sector: &str) -> Self {
        self.sectors.insert(ticker.to_string(), sector.to_string());
        self
    }

    pub fn with_levels(mut self, ticker: &str, support: f64, resistance: f64) -> Self {
        self.levels.insert(
            ticker.to_string(),
            PriceLevels {
                support,
                resistance,
            },
        );
        self
    }

    pub fn with_failure(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    fn check(&self) -> Result<(), NlqError> {
        match &self.failure {
            Some(reason) => Err(NlqError::data_unavailable(reason)),
            None => Ok(()),
        }
    }

    fn rows(&self, indicator: &str, tickers: Option<&[String]>) -> Vec<IndicatorRow> {
        let mut rows: Vec<IndicatorRow> = self
            .series
            .get(indicator)
            .map(|rows| {
                rows.iter()
                    .filter(|r| tickers.is_none_or(|t| t.contains(&r.ticker)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(|a, b| a.ticker.cmp(&b.ticker).then(a.date.cmp(&b.date)));
        rows
    }
}

impl Default for MockIndicatorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorPort for MockIndicatorStore {
    fn fetch(
        &self,
        indicator: &str,
        tickers: Option<&[String]>,
    ) -> Result<Vec<IndicatorRow>, NlqError> {
        self.check()?;
        Ok(self.rows(indicator, tickers))
    }

    fn fetch_pair(
        &self,
        fast: &str,
        slow: &str,
        tickers: Option<&[String]>,
    ) -> Result<Vec<PairRow>, NlqError> {
        self.check()?;
        let slow_by_key: HashMap<(String, NaiveDate), f64> = self
            .rows(slow, tickers)
            .into_iter()
            .map(|r| ((r.ticker, r.date), r.value))
            .collect();
        Ok(self
            .rows(fast, tickers)
            .into_iter()
            .filter_map(|r| {
                let slow_value = *slow_by_key.get(&(r.ticker.clone(), r.date))?;
                Some(PairRow {
                    ticker: r.ticker,
                    date: r.date,
                    fast_value: r.value,
                    slow_value,
                })
            })
            .collect())
    }

    fn sector_mean(&self, indicator: &str, sector: &str) -> Result<Option<f64>, NlqError> {
        self.check()?;
        self.sector_mean_calls.set(self.sector_mean_calls.get() + 1);

        let mut latest: BTreeMap<String, IndicatorRow> = BTreeMap::new();
        for row in self.rows(indicator, None) {
            let in_sector = self
                .sectors
                .get(&row.ticker)
                .is_some_and(|s| s.eq_ignore_ascii_case(sector));
            if in_sector {
                latest.insert(row.ticker.clone(), row);
            }
        }
        if latest.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            latest.values().map(|r| r.value).sum::<f64>() / latest.len() as f64,
        ))
    }

    fn sector_of(&self, ticker: &str) -> Result<Option<String>, NlqError> {
        self.check()?;
        Ok(self.sectors.get(ticker).cloned())
    }

    fn support_resistance_levels(&self, ticker: &str) -> Result<Option<PriceLevels>, NlqError> {
        self.check()?;
        Ok(self.levels.get(ticker).copied())
    }
}

pub fn day(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + chrono::Days::new(offset as u64)
}

pub fn tickers(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}
