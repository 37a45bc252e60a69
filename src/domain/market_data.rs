//! Indicator store row types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One indicator value for one ticker on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub value: f64,
}

/// A fast/slow indicator pair on the same ticker and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub fast_value: f64,
    pub slow_value: f64,
}

impl PairRow {
    /// fast - slow
    pub fn spread(&self) -> f64 {
        self.fast_value - self.slow_value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevels {
    pub support: f64,
    pub resistance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockProfile {
    pub ticker: String,
    pub sector: String,
}

/// Indicator rows as stored: a named value rather than a queried one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub ticker: String,
    pub date: NaiveDate,
    pub indicator: String,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_spread() {
        let row = PairRow {
            ticker: "GP".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            fast_value: 1.25,
            slow_value: 0.75,
        };
        assert!((row.spread() - 0.5).abs() < f64::EPSILON);
    }
}
