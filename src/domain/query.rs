//! Structured query types.
//!
//! - `QueryType`: the classified intent of a free-text query
//! - `Direction`: polarity of the intent (above/below, highest/lowest, ...)
//! - `ParsedQuery`: the interpreter's output, created fresh per call
//! - `ResultRow` / `QueryResult`: the executor's ranked output

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Trend,
    Threshold,
    Ranking,
    Comparison,
    Crossover,
    SupportResistance,
    Unknown,
}

impl QueryType {
    pub const ALL: [QueryType; 7] = [
        QueryType::Trend,
        QueryType::Threshold,
        QueryType::Ranking,
        QueryType::Comparison,
        QueryType::Crossover,
        QueryType::SupportResistance,
        QueryType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Trend => "trend",
            QueryType::Threshold => "threshold",
            QueryType::Ranking => "ranking",
            QueryType::Comparison => "comparison",
            QueryType::Crossover => "crossover",
            QueryType::SupportResistance => "support_resistance",
            QueryType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Polarity of an intent.
///
/// `Up` reads as above / highest / rising / bullish / outperforming /
/// near resistance; `Down` as the opposite of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub query_type: QueryType,
    pub indicator: Option<String>,
    pub threshold: Option<f64>,
    pub days: Option<u32>,
    pub direction: Option<Direction>,
    pub limit: Option<usize>,
    pub sector: Option<String>,
    pub confidence: f64,
}

impl ParsedQuery {
    /// The fallback result: no intent, nothing extracted, zero confidence.
    pub fn unknown() -> Self {
        Self {
            query_type: QueryType::Unknown,
            indicator: None,
            threshold: None,
            days: None,
            direction: None,
            limit: None,
            sector: None,
            confidence: 0.0,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.query_type == QueryType::Unknown
    }
}

impl Default for ParsedQuery {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Clamp to [0, 1] and round to two decimals so additive scores compare exactly.
pub fn clamp_confidence(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    (score.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub ticker: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl ResultRow {
    pub fn new(ticker: impl Into<String>, value: f64) -> Self {
        Self {
            ticker: ticker.into(),
            value,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub query: String,
    pub query_type: QueryType,
    pub parsed: ParsedQuery,
    pub results: Vec<ResultRow>,
    pub total_results: usize,
}

impl QueryResult {
    pub fn new(query: &str, parsed: ParsedQuery, results: Vec<ResultRow>) -> Self {
        Self {
            query: query.to_string(),
            query_type: parsed.query_type,
            total_results: results.len(),
            parsed,
            results,
        }
    }

    pub fn empty(query: &str, parsed: ParsedQuery) -> Self {
        Self::new(query, parsed, Vec::new())
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.ticker.as_str()).collect()
    }
}
