//! Cue-word tables driving classification.
//!
//! Extending the interpreter's vocabulary means editing these tables, not the
//! rules that read them.

use crate::domain::indicator::Indicator;
use crate::domain::query::Direction;

/// A cue phrase that stands for a full threshold condition ("overbought").
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdCue {
    pub phrase: &'static str,
    pub indicator: Indicator,
    pub level: f64,
    pub direction: Direction,
}

/// Defaults for threshold cues; levels are overridable from the `[cues]` section.
pub const DEFAULT_THRESHOLD_CUES: &[ThresholdCue] = &[
    ThresholdCue {
        phrase: "overbought",
        indicator: Indicator::Rsi14,
        level: 70.0,
        direction: Direction::Up,
    },
    ThresholdCue {
        phrase: "oversold",
        indicator: Indicator::Rsi14,
        level: 30.0,
        direction: Direction::Down,
    },
];

pub const COMPARISON_OPERATORS: &[(&str, Direction)] = &[
    ("above", Direction::Up),
    ("over", Direction::Up),
    ("exceeding", Direction::Up),
    ("exceeds", Direction::Up),
    ("exceed", Direction::Up),
    ("greater", Direction::Up),
    ("below", Direction::Down),
    ("under", Direction::Down),
    ("beneath", Direction::Down),
    ("less", Direction::Down),
];

/// Reference words meaning "compared with the ticker's own average".
pub const AVERAGE_REFERENCES: &[&str] = &["average", "avg", "mean", "normal", "usual"];

pub const TREND_VERBS: &[(&str, Direction)] = &[
    ("increasing", Direction::Up),
    ("rising", Direction::Up),
    ("climbing", Direction::Up),
    ("growing", Direction::Up),
    ("gaining", Direction::Up),
    ("uptrend", Direction::Up),
    ("decreasing", Direction::Down),
    ("falling", Direction::Down),
    ("declining", Direction::Down),
    ("dropping", Direction::Down),
    ("sliding", Direction::Down),
    ("downtrend", Direction::Down),
];

/// Duration units and their length in trading days.
pub const DURATION_UNITS: &[(&str, u32)] = &[
    ("day", 1),
    ("days", 1),
    ("session", 1),
    ("sessions", 1),
    ("week", 5),
    ("weeks", 5),
    ("month", 21),
    ("months", 21),
];

pub const SUPERLATIVES: &[(&str, Direction)] = &[
    ("highest", Direction::Up),
    ("top", Direction::Up),
    ("most", Direction::Up),
    ("largest", Direction::Up),
    ("biggest", Direction::Up),
    ("best", Direction::Up),
    ("strongest", Direction::Up),
    ("lowest", Direction::Down),
    ("bottom", Direction::Down),
    ("least", Direction::Down),
    ("smallest", Direction::Down),
    ("worst", Direction::Down),
    ("weakest", Direction::Down),
];

/// Words followed by a result count ("top 20", "show 10").
pub const LIMIT_WORDS: &[&str] = &["top", "bottom", "show", "first", "list"];

#[derive(Debug, Clone, PartialEq)]
pub struct CrossoverPair {
    pub keywords: &'static [&'static str],
    pub name: &'static str,
    pub fast: Indicator,
    pub slow: Indicator,
}

pub const CROSSOVER_PAIRS: &[CrossoverPair] = &[
    CrossoverPair {
        keywords: &["macd"],
        name: "MACD",
        fast: Indicator::MacdLine,
        slow: Indicator::MacdSignal,
    },
    CrossoverPair {
        keywords: &["sma", "moving average", "moving averages"],
        name: "SMA",
        fast: Indicator::Sma50,
        slow: Indicator::Sma200,
    },
];

/// Named crossover events: phrase, pair name, direction.
pub const CROSS_EVENTS: &[(&str, &str, Direction)] = &[
    ("golden cross", "SMA", Direction::Up),
    ("death cross", "SMA", Direction::Down),
];

pub const CROSS_WORDS: &[&str] = &[
    "crossover",
    "crossovers",
    "cross",
    "crosses",
    "crossed",
    "crossing",
];

pub const POLARITY_WORDS: &[(&str, Direction)] = &[
    ("bullish", Direction::Up),
    ("positive", Direction::Up),
    ("upward", Direction::Up),
    ("bearish", Direction::Down),
    ("negative", Direction::Down),
    ("downward", Direction::Down),
];

/// Proximity cues for support/resistance, with the confidence each carries.
/// "close" alone is the price, so it only counts as "close to".
pub const PROXIMITY_WORDS: &[(&str, f64)] = &[
    ("near", 0.9),
    ("nearing", 0.9),
    ("approaching", 0.75),
    ("close to", 0.75),
    ("at", 0.75),
    ("testing", 0.75),
    ("touching", 0.75),
];

pub const LEVEL_WORDS: &[(&str, Direction)] = &[
    ("support", Direction::Down),
    ("resistance", Direction::Up),
];

pub const COMPARISON_CUES: &[(&str, Direction)] = &[
    ("outperforming", Direction::Up),
    ("outperform", Direction::Up),
    ("outperforms", Direction::Up),
    ("beating", Direction::Up),
    ("underperforming", Direction::Down),
    ("underperform", Direction::Down),
    ("underperforms", Direction::Down),
    ("lagging", Direction::Down),
];

/// Words that never name a sector when they precede "sector".
pub const SECTOR_STOPWORDS: &[&str] = &[
    "their", "its", "the", "own", "same", "each", "a", "by", "per", "in", "any", "every",
    "whole", "entire", "that", "this", "his", "her", "sector",
];

/// Word lookup in a `(word, value)` table.
pub fn lookup<T: Copy>(table: &[(&str, T)], word: &str) -> Option<T> {
    table.iter().find(|(w, _)| *w == word).map(|(_, v)| *v)
}

pub fn words<T>(table: &[(&'static str, T)]) -> Vec<&'static str> {
    table.iter().map(|(w, _)| *w).collect()
}

/// True when `word` is a cue of any intent, so it cannot be a sector name.
pub fn is_cue_word(word: &str) -> bool {
    lookup(COMPARISON_OPERATORS, word).is_some()
        || lookup(TREND_VERBS, word).is_some()
        || lookup(SUPERLATIVES, word).is_some()
        || lookup(COMPARISON_CUES, word).is_some()
        || lookup(POLARITY_WORDS, word).is_some()
        || LIMIT_WORDS.contains(&word)
        || CROSS_WORDS.contains(&word)
        || DEFAULT_THRESHOLD_CUES.iter().any(|c| c.phrase == word)
}

pub fn crossover_pair(name: &str) -> Option<&'static CrossoverPair> {
    CROSSOVER_PAIRS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}
