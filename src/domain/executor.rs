//! Query execution.
//!
//! Turns a `ParsedQuery` into a ranked `QueryResult` against an indicator
//! store.
//!
//! # Semantics
//!
//! - `threshold`: latest value strictly above/below the threshold, or the
//!   ticker's trailing average when no threshold was given
//! - `trend`: the last `days + 1` values move strictly in the stated direction
//! - `ranking`: latest value sorted descending (up) or ascending (down)
//! - `crossover`: `fast - slow` flips sign within the lookback window
//! - `support_resistance`: latest close within the tolerance band of a level
//! - `comparison`: latest value deviates from the sector mean beyond the band
//!
//! Ties always break on ticker ascending, so truncation to the limit is
//! stable for a deterministic store.

use crate::domain::error::NlqError;
use crate::domain::indicator::Indicator;
use crate::domain::market_data::{IndicatorRow, PairRow};
use crate::domain::query::{Direction, ParsedQuery, QueryResult, QueryType, ResultRow};
use crate::domain::settings::InterpreterSettings;
use crate::domain::vocabulary::crossover_pair;
use crate::ports::indicator_port::IndicatorPort;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const EPSILON: f64 = 1e-9;

/// Caller-supplied execution parameters, validated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionRequest {
    pub tickers: Option<Vec<String>>,
    pub limit: Option<usize>,
}

impl ExecutionRequest {
    /// Tickers are trimmed, upper-cased and de-duplicated in order.
    pub fn new(tickers: Option<&[String]>, limit: Option<i64>) -> Result<Self, NlqError> {
        let limit = match limit {
            Some(n) if n <= 0 => {
                return Err(NlqError::invalid_parameter(
                    "limit",
                    format!("must be positive, got {n}"),
                ));
            }
            Some(n) => Some(usize::try_from(n).unwrap_or(usize::MAX)),
            None => None,
        };

        let tickers = match tickers {
            Some(list) => {
                let mut seen = BTreeSet::new();
                let mut normalized = Vec::with_capacity(list.len());
                for raw in list {
                    let ticker = raw.trim().to_uppercase();
                    if ticker.is_empty() {
                        return Err(NlqError::invalid_parameter(
                            "tickers",
                            "ticker entries must not be blank",
                        ));
                    }
                    if seen.insert(ticker.clone()) {
                        normalized.push(ticker);
                    }
                }
                Some(normalized)
            }
            None => None,
        };

        Ok(Self { tickers, limit })
    }
}

pub fn execute(
    query: &str,
    parsed: ParsedQuery,
    store: &dyn IndicatorPort,
    request: &ExecutionRequest,
    settings: &InterpreterSettings,
) -> Result<QueryResult, NlqError> {
    if parsed.is_unknown() {
        tracing::debug!(query, "unrecognized query, returning no results");
        return Ok(QueryResult::empty(query, parsed));
    }
    if request.tickers.as_ref().is_some_and(Vec::is_empty) {
        return Ok(QueryResult::empty(query, parsed));
    }

    let tickers = request.tickers.as_deref();
    let mut rows = match parsed.query_type {
        QueryType::Threshold => threshold(&parsed, store, tickers, settings)?,
        QueryType::Trend => trend(&parsed, store, tickers, settings)?,
        QueryType::Ranking => ranking(&parsed, store, tickers)?,
        QueryType::Crossover => crossover(&parsed, store, tickers, settings)?,
        QueryType::SupportResistance => support_resistance(&parsed, store, tickers, settings)?,
        QueryType::Comparison => comparison(&parsed, store, tickers, settings)?,
        QueryType::Unknown => Vec::new(),
    };

    let limit = effective_limit(&parsed, request, settings);
    rows.truncate(limit);

    tracing::debug!(
        query_type = %parsed.query_type,
        results = rows.len(),
        limit,
        "query executed"
    );
    Ok(QueryResult::new(query, parsed, rows))
}

/// Text limit or configured default, capped by the caller and the configured maximum.
pub fn effective_limit(
    parsed: &ParsedQuery,
    request: &ExecutionRequest,
    settings: &InterpreterSettings,
) -> usize {
    let mut limit = parsed.limit.unwrap_or(settings.default_result_limit);
    if let Some(cap) = request.limit {
        limit = limit.min(cap);
    }
    limit.min(settings.max_result_limit)
}

fn required_indicator<'a>(parsed: &'a ParsedQuery) -> Option<&'a str> {
    let indicator = parsed.indicator.as_deref();
    if indicator.is_none() {
        tracing::warn!(
            query_type = %parsed.query_type,
            "no indicator resolved, returning no results"
        );
    }
    indicator
}

fn group_by_ticker(rows: Vec<IndicatorRow>) -> BTreeMap<String, Vec<IndicatorRow>> {
    let mut grouped: BTreeMap<String, Vec<IndicatorRow>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.ticker.clone()).or_default().push(row);
    }
    for series in grouped.values_mut() {
        series.sort_by_key(|r| r.date);
    }
    grouped
}

fn group_pairs_by_ticker(rows: Vec<PairRow>) -> BTreeMap<String, Vec<PairRow>> {
    let mut grouped: BTreeMap<String, Vec<PairRow>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.ticker.clone()).or_default().push(row);
    }
    for series in grouped.values_mut() {
        series.sort_by_key(|r| r.date);
    }
    grouped
}

/// Order by `key` in `direction` (up = descending), ties by ticker ascending.
fn sort_rows<F>(rows: &mut [ResultRow], direction: Direction, key: F)
where
    F: Fn(&ResultRow) -> f64,
{
    rows.sort_by(|a, b| {
        let ord = match direction {
            Direction::Up => key(b).total_cmp(&key(a)),
            Direction::Down => key(a).total_cmp(&key(b)),
        };
        ord.then_with(|| a.ticker.cmp(&b.ticker))
    });
}

fn extra_f64(row: &ResultRow, key: &str) -> f64 {
    row.extra.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { None } else { Some(sum / count as f64) }
}

fn threshold(
    parsed: &ParsedQuery,
    store: &dyn IndicatorPort,
    tickers: Option<&[String]>,
    settings: &InterpreterSettings,
) -> Result<Vec<ResultRow>, NlqError> {
    let Some(indicator) = required_indicator(parsed) else {
        return Ok(Vec::new());
    };
    let direction = parsed.direction.unwrap_or(Direction::Up);
    let grouped = group_by_ticker(store.fetch(indicator, tickers)?);

    let mut rows = Vec::new();
    for (ticker, series) in grouped {
        let Some((latest, history)) = series.split_last() else {
            continue;
        };
        let (reference, key) = match parsed.threshold {
            Some(level) => (level, "threshold"),
            None => {
                let window = &history[history.len().saturating_sub(settings.average_window)..];
                match mean(window.iter().map(|r| r.value)) {
                    Some(avg) => (avg, "average"),
                    None => continue,
                }
            }
        };
        let keep = match direction {
            Direction::Up => latest.value > reference,
            Direction::Down => latest.value < reference,
        };
        if keep {
            rows.push(
                ResultRow::new(ticker, latest.value)
                    .with_extra("date", latest.date.to_string())
                    .with_extra(key, reference),
            );
        }
    }

    sort_rows(&mut rows, direction, |r| r.value);
    Ok(rows)
}

fn trend(
    parsed: &ParsedQuery,
    store: &dyn IndicatorPort,
    tickers: Option<&[String]>,
    settings: &InterpreterSettings,
) -> Result<Vec<ResultRow>, NlqError> {
    let Some(indicator) = required_indicator(parsed) else {
        return Ok(Vec::new());
    };
    let direction = parsed.direction.unwrap_or(Direction::Up);
    let days = parsed.days.unwrap_or(settings.default_trend_days) as usize;
    let grouped = group_by_ticker(store.fetch(indicator, tickers)?);

    let mut rows = Vec::new();
    for (ticker, series) in grouped {
        if series.len() < days + 1 {
            continue;
        }
        let window = &series[series.len() - days - 1..];
        let monotonic = window.windows(2).all(|pair| match direction {
            Direction::Up => pair[1].value > pair[0].value,
            Direction::Down => pair[1].value < pair[0].value,
        });
        if !monotonic {
            continue;
        }

        let start = window[0].value;
        let end = window[window.len() - 1].value;
        let change = end - start;
        let change_pct = if start.abs() > EPSILON {
            change / start.abs() * 100.0
        } else {
            0.0
        };
        rows.push(
            ResultRow::new(ticker, end)
                .with_extra("days", days as u64)
                .with_extra("start_value", start)
                .with_extra("change", change)
                .with_extra("change_pct", change_pct),
        );
    }

    sort_rows(&mut rows, Direction::Up, |r| extra_f64(r, "change_pct").abs());
    Ok(rows)
}

fn ranking(
    parsed: &ParsedQuery,
    store: &dyn IndicatorPort,
    tickers: Option<&[String]>,
) -> Result<Vec<ResultRow>, NlqError> {
    let Some(indicator) = required_indicator(parsed) else {
        return Ok(Vec::new());
    };
    let direction = parsed.direction.unwrap_or(Direction::Up);
    let grouped = group_by_ticker(store.fetch(indicator, tickers)?);

    let mut rows = Vec::new();
    for (ticker, series) in grouped {
        let Some(latest) = series.last() else {
            continue;
        };
        let mut row = ResultRow::new(ticker.clone(), latest.value)
            .with_extra("date", latest.date.to_string());
        if let Some(wanted) = parsed.sector.as_deref() {
            match store.sector_of(&ticker)? {
                Some(sector) if sector.eq_ignore_ascii_case(wanted) => {
                    row = row.with_extra("sector", sector);
                }
                _ => continue,
            }
        }
        rows.push(row);
    }

    sort_rows(&mut rows, direction, |r| r.value);
    Ok(rows)
}

fn crossover(
    parsed: &ParsedQuery,
    store: &dyn IndicatorPort,
    tickers: Option<&[String]>,
    settings: &InterpreterSettings,
) -> Result<Vec<ResultRow>, NlqError> {
    let Some(pair_name) = required_indicator(parsed) else {
        return Ok(Vec::new());
    };
    let Some(pair) = crossover_pair(pair_name) else {
        tracing::warn!(pair = pair_name, "unknown crossover pair, returning no results");
        return Ok(Vec::new());
    };
    let direction = parsed.direction.unwrap_or(Direction::Up);
    let grouped = group_pairs_by_ticker(store.fetch_pair(
        pair.fast.name(),
        pair.slow.name(),
        tickers,
    )?);

    let mut found: Vec<(NaiveDate, ResultRow)> = Vec::new();
    for (ticker, series) in grouped {
        if series.len() < 2 {
            continue;
        }
        let first = series.len().saturating_sub(settings.crossover_lookback).max(1);
        let flipped = (first..series.len()).rev().find(|&i| {
            let prev = series[i - 1].spread();
            let curr = series[i].spread();
            match direction {
                Direction::Up => prev <= 0.0 && curr > 0.0,
                Direction::Down => prev >= 0.0 && curr < 0.0,
            }
        });
        let Some(index) = flipped else {
            continue;
        };

        let latest = &series[series.len() - 1];
        let cross_date = series[index].date;
        found.push((
            cross_date,
            ResultRow::new(ticker, latest.spread())
                .with_extra("crossover_date", cross_date.to_string())
                .with_extra(pair.fast.name(), latest.fast_value)
                .with_extra(pair.slow.name(), latest.slow_value),
        ));
    }

    found.sort_by(|(da, a), (db, b)| db.cmp(da).then_with(|| a.ticker.cmp(&b.ticker)));
    Ok(found.into_iter().map(|(_, row)| row).collect())
}

fn support_resistance(
    parsed: &ParsedQuery,
    store: &dyn IndicatorPort,
    tickers: Option<&[String]>,
    settings: &InterpreterSettings,
) -> Result<Vec<ResultRow>, NlqError> {
    let indicator = parsed
        .indicator
        .as_deref()
        .unwrap_or(Indicator::Close.name());
    let direction = parsed.direction.unwrap_or(Direction::Down);
    let tolerance = parsed.threshold.unwrap_or(settings.support_tolerance_pct);
    let grouped = group_by_ticker(store.fetch(indicator, tickers)?);

    let mut rows = Vec::new();
    for (ticker, series) in grouped {
        let Some(latest) = series.last() else {
            continue;
        };
        let Some(levels) = store.support_resistance_levels(&ticker)? else {
            tracing::debug!(%ticker, "no support/resistance levels, skipping");
            continue;
        };
        let level = match direction {
            Direction::Down => levels.support,
            Direction::Up => levels.resistance,
        };
        if level <= 0.0 {
            continue;
        }
        let distance_pct = (latest.value - level).abs() / level * 100.0;
        if distance_pct <= tolerance {
            rows.push(
                ResultRow::new(ticker, latest.value)
                    .with_extra("level", level)
                    .with_extra("distance_pct", distance_pct)
                    .with_extra("support", levels.support)
                    .with_extra("resistance", levels.resistance),
            );
        }
    }

    sort_rows(&mut rows, Direction::Down, |r| extra_f64(r, "distance_pct"));
    Ok(rows)
}

fn comparison(
    parsed: &ParsedQuery,
    store: &dyn IndicatorPort,
    tickers: Option<&[String]>,
    settings: &InterpreterSettings,
) -> Result<Vec<ResultRow>, NlqError> {
    let Some(indicator) = required_indicator(parsed) else {
        return Ok(Vec::new());
    };
    let direction = parsed.direction.unwrap_or(Direction::Up);
    let band = settings.comparison_band_pct;
    let grouped = group_by_ticker(store.fetch(indicator, tickers)?);

    let mut sector_means: HashMap<String, Option<f64>> = HashMap::new();
    let mut rows = Vec::new();
    for (ticker, series) in grouped {
        let Some(latest) = series.last() else {
            continue;
        };
        let Some(sector) = store.sector_of(&ticker)? else {
            tracing::debug!(%ticker, "no sector on record, skipping");
            continue;
        };
        if let Some(wanted) = parsed.sector.as_deref()
            && !sector.eq_ignore_ascii_case(wanted)
        {
            continue;
        }

        let key = sector.to_lowercase();
        let sector_mean = match sector_means.get(&key) {
            Some(cached) => *cached,
            None => {
                let fetched = store.sector_mean(indicator, &sector)?;
                sector_means.insert(key, fetched);
                fetched
            }
        };
        let Some(sector_mean) = sector_mean.filter(|m| m.abs() > EPSILON) else {
            continue;
        };

        let deviation_pct = (latest.value - sector_mean) / sector_mean.abs() * 100.0;
        let keep = match direction {
            Direction::Up => deviation_pct > band,
            Direction::Down => deviation_pct < -band,
        };
        if keep {
            rows.push(
                ResultRow::new(ticker, latest.value)
                    .with_extra("sector", sector)
                    .with_extra("sector_mean", sector_mean)
                    .with_extra("deviation_pct", deviation_pct),
            );
        }
    }

    sort_rows(&mut rows, direction, |r| extra_f64(r, "deviation_pct"));
    Ok(rows)
}
