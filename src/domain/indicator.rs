//! Supported indicator vocabulary and free-text resolution.
//!
//! Canonical names are the storage names used by the indicator store. Free
//! text resolves through an alias table; the earliest mention wins and, at
//! the same position, the longest alias wins ("macd histogram" over "macd").

use crate::domain::tokenizer::TokenStream;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    Rsi14,
    Sma20,
    Sma50,
    Sma200,
    MacdHistogram,
    MacdLine,
    MacdSignal,
    Adx14,
    Atr14,
    Volume,
    Close,
}

impl Indicator {
    pub const ALL: [Indicator; 11] = [
        Indicator::Rsi14,
        Indicator::Sma20,
        Indicator::Sma50,
        Indicator::Sma200,
        Indicator::MacdHistogram,
        Indicator::MacdLine,
        Indicator::MacdSignal,
        Indicator::Adx14,
        Indicator::Atr14,
        Indicator::Volume,
        Indicator::Close,
    ];

    /// Storage name.
    pub fn name(&self) -> &'static str {
        match self {
            Indicator::Rsi14 => "RSI_14",
            Indicator::Sma20 => "SMA_20",
            Indicator::Sma50 => "SMA_50",
            Indicator::Sma200 => "SMA_200",
            Indicator::MacdHistogram => "MACD_histogram",
            Indicator::MacdLine => "MACD_line",
            Indicator::MacdSignal => "MACD_signal",
            Indicator::Adx14 => "ADX_14",
            Indicator::Atr14 => "ATR_14",
            Indicator::Volume => "volume",
            Indicator::Close => "close",
        }
    }

    /// Name shown in the catalogue.
    pub fn label(&self) -> &'static str {
        match self {
            Indicator::Close => "price/close",
            other => other.name(),
        }
    }

    /// Case-insensitive lookup by canonical name, catalogue label, or alias.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        Indicator::ALL
            .into_iter()
            .find(|i| i.name().to_lowercase() == lower || i.label() == lower)
            .or_else(|| {
                ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == lower)
                    .map(|(_, i)| *i)
            })
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Free-text aliases. Multi-word entries are matched token by token.
const ALIASES: &[(&str, Indicator)] = &[
    ("rsi_14", Indicator::Rsi14),
    ("rsi14", Indicator::Rsi14),
    ("rsi", Indicator::Rsi14),
    ("relative strength index", Indicator::Rsi14),
    ("relative strength", Indicator::Rsi14),
    ("sma_20", Indicator::Sma20),
    ("sma20", Indicator::Sma20),
    ("sma", Indicator::Sma20),
    ("moving average", Indicator::Sma20),
    ("sma_50", Indicator::Sma50),
    ("sma50", Indicator::Sma50),
    ("sma_200", Indicator::Sma200),
    ("sma200", Indicator::Sma200),
    ("macd_histogram", Indicator::MacdHistogram),
    ("macd histogram", Indicator::MacdHistogram),
    ("histogram", Indicator::MacdHistogram),
    ("macd_line", Indicator::MacdLine),
    ("macd line", Indicator::MacdLine),
    ("macd", Indicator::MacdLine),
    ("macd_signal", Indicator::MacdSignal),
    ("macd signal", Indicator::MacdSignal),
    ("adx_14", Indicator::Adx14),
    ("adx14", Indicator::Adx14),
    ("adx", Indicator::Adx14),
    ("trend strength", Indicator::Adx14),
    ("atr_14", Indicator::Atr14),
    ("atr14", Indicator::Atr14),
    ("atr", Indicator::Atr14),
    ("average true range", Indicator::Atr14),
    ("volatility", Indicator::Atr14),
    ("volume", Indicator::Volume),
    ("volumes", Indicator::Volume),
    ("trading volume", Indicator::Volume),
    ("turnover", Indicator::Volume),
    ("price", Indicator::Close),
    ("prices", Indicator::Close),
    ("close", Indicator::Close),
    ("closing price", Indicator::Close),
];

/// Indicator families that take a period suffix ("SMA 50", "RSI(14)").
const PERIOD_FAMILIES: &[&str] = &["sma", "rsi", "adx", "atr"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorMatch {
    pub indicator: Indicator,
    /// Index of the first token of the mention.
    pub start: usize,
    /// Number of tokens the mention spans.
    pub len: usize,
}

impl IndicatorMatch {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Resolve the first indicator mentioned in `tokens`.
pub fn find_indicator(tokens: &TokenStream) -> Option<IndicatorMatch> {
    let mut best: Option<IndicatorMatch> = None;

    for (alias, indicator) in ALIASES {
        let Some(start) = tokens.find_phrase(alias) else {
            continue;
        };
        let len = alias.split_whitespace().count();
        let candidate = with_period(tokens, IndicatorMatch {
            indicator: *indicator,
            start,
            len,
        });
        best = match best {
            Some(current)
                if current.start < candidate.start
                    || (current.start == candidate.start && current.len >= candidate.len) =>
            {
                Some(current)
            }
            _ => Some(candidate),
        };
    }

    best
}

/// Longest indicator mention starting exactly at `start`.
pub fn indicator_at(tokens: &TokenStream, start: usize) -> Option<IndicatorMatch> {
    ALIASES
        .iter()
        .filter(|(alias, _)| tokens.phrase_at(start, alias))
        .map(|(alias, indicator)| IndicatorMatch {
            indicator: *indicator,
            start,
            len: alias.split_whitespace().count(),
        })
        .max_by_key(|m| m.len)
        .map(|m| with_period(tokens, m))
}

/// Indicator mention whose last token sits right before `end`
/// ("RSI 14" in "RSI 14 above 70").
pub fn indicator_ending_at(tokens: &TokenStream, end: usize) -> Option<IndicatorMatch> {
    (end.saturating_sub(MAX_MENTION_TOKENS)..end)
        .filter_map(|start| indicator_at(tokens, start))
        .find(|m| m.end() == end)
}

/// Longest alias, in tokens.
const MAX_MENTION_TOKENS: usize = 3;

/// Upgrade a bare family word to `FAMILY_N` when followed by a supported period.
fn with_period(tokens: &TokenStream, found: IndicatorMatch) -> IndicatorMatch {
    if found.len != 1 {
        return found;
    }
    let Some(word) = tokens.word(found.start) else {
        return found;
    };
    if !PERIOD_FAMILIES.contains(&word) {
        return found;
    }
    let Some(period) = tokens.integer_after(found.start) else {
        return found;
    };
    match Indicator::from_name(&format!("{}_{}", word, period)) {
        Some(indicator) => IndicatorMatch {
            indicator,
            start: found.start,
            len: 2,
        },
        None => found,
    }
}

pub fn is_period_family(word: &str) -> bool {
    PERIOD_FAMILIES.contains(&word)
}

/// Words that may sit in indicator position without being an indicator mention.
const NON_INDICATOR_WORDS: &[&str] = &[
    "stock", "stocks", "share", "shares", "ticker", "tickers", "company", "companies", "is",
    "are", "was", "were", "be", "been", "being", "has", "have", "with", "that", "which",
    "where", "whose", "the", "a", "an", "its", "their", "all", "any", "show", "me", "find",
    "list", "get", "give", "trading", "trade", "traded", "going", "moving", "still", "currently",
    "now", "value", "values", "level", "levels", "and", "or", "of", "for", "in", "on", "by",
    "to", "stays", "stay", "remains", "remain", "today", "yesterday", "this", "last", "past",
    "recent", "recently", "since", "during", "from", "at", "than", "more",
];

/// True when the word at `index` looks like an attempted indicator name that
/// the vocabulary does not know ("EMA" in "stocks with EMA above 50").
pub fn is_unresolved_mention(tokens: &TokenStream, index: usize) -> bool {
    match tokens.word(index) {
        Some(word) => !NON_INDICATOR_WORDS.contains(&word) && Indicator::from_name(word).is_none(),
        None => false,
    }
}
