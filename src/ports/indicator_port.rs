//! Indicator store port.
//!
//! Read-only access to precomputed indicator series, sector membership and
//! support/resistance levels. Implementations return rows ordered by ticker,
//! then date ascending, and report failures as `NlqError::DataUnavailable`.

use crate::domain::error::NlqError;
use crate::domain::market_data::{IndicatorRow, PairRow, PriceLevels};

pub trait IndicatorPort {
    /// Series for `indicator`, restricted to `tickers` when given.
    fn fetch(
        &self,
        indicator: &str,
        tickers: Option<&[String]>,
    ) -> Result<Vec<IndicatorRow>, NlqError>;

    /// Dates on which both `fast` and `slow` have a value.
    fn fetch_pair(
        &self,
        fast: &str,
        slow: &str,
        tickers: Option<&[String]>,
    ) -> Result<Vec<PairRow>, NlqError>;

    /// Mean of the latest `indicator` value across the sector's tickers.
    fn sector_mean(&self, indicator: &str, sector: &str) -> Result<Option<f64>, NlqError>;

    fn sector_of(&self, ticker: &str) -> Result<Option<String>, NlqError>;

    fn support_resistance_levels(&self, ticker: &str) -> Result<Option<PriceLevels>, NlqError>;
}
