//! Classification rules.
//!
//! Each rule is a pure function from tokenized text to an optional
//! `ParsedQuery`. Rules do not look at each other; priority is decided by
//! their order in `interpreter::RULES`.
//!
//! Confidence is additive for the open-ended intents (trend, threshold,
//! ranking): a base score for the cue, plus a bonus for each parameter
//! stated explicitly, minus a penalty when the text names an indicator the
//! vocabulary does not know. The closed intents (crossover,
//! support/resistance, comparison) score by which cues are present.

use crate::domain::indicator::{
    find_indicator, indicator_at, indicator_ending_at, is_period_family, is_unresolved_mention,
    Indicator, IndicatorMatch,
};
use crate::domain::query::{clamp_confidence, Direction, ParsedQuery, QueryType};
use crate::domain::settings::InterpreterSettings;
use crate::domain::tokenizer::TokenStream;
use crate::domain::vocabulary::{
    is_cue_word, lookup, words, AVERAGE_REFERENCES, COMPARISON_CUES, COMPARISON_OPERATORS,
    CROSSOVER_PAIRS, CROSS_EVENTS, CROSS_WORDS, DURATION_UNITS, LEVEL_WORDS, LIMIT_WORDS,
    POLARITY_WORDS, PROXIMITY_WORDS, SECTOR_STOPWORDS, SUPERLATIVES, TREND_VERBS,
};

/// Cue matched, nothing else extracted.
pub const BASE_CONFIDENCE: f64 = 0.5;
/// Indicator resolved from the text.
pub const INDICATOR_BONUS: f64 = 0.3;
/// Threshold stated as a number or as an average reference.
pub const THRESHOLD_BONUS: f64 = 0.15;
pub const DURATION_BONUS: f64 = 0.1;
pub const LIMIT_BONUS: f64 = 0.1;
/// Text names an indicator outside the vocabulary.
pub const UNRESOLVED_PENALTY: f64 = 0.2;
/// Threshold operand is another indicator, which carries no level.
pub const INDICATOR_OPERAND_PENALTY: f64 = 0.2;
/// Table cue such as "overbought".
pub const CUE_CONFIDENCE: f64 = 0.85;
/// Table cue with an explicit indicator or level on top.
pub const CUE_OVERRIDE_BONUS: f64 = 0.05;
/// Pair keyword, polarity and crossing word all present.
pub const CROSSOVER_FULL: f64 = 0.9;
/// Named event ("golden cross").
pub const CROSSOVER_EVENT: f64 = 0.85;
/// Two of the three crossover cues.
pub const CROSSOVER_PARTIAL: f64 = 0.65;
pub const COMPARISON_WITH_SECTOR: f64 = 0.85;
pub const COMPARISON_WITHOUT_SECTOR: f64 = 0.65;

/// Polarity words strong enough to imply a crossover without "cross".
const STRONG_POLARITY: &[&str] = &["bullish", "bearish"];

/// Words after which an indicator name is expected ("by volume", "stocks EMA").
const INDICATOR_SLOT_WORDS: &[&str] = &["by", "on", "with", "stock", "stocks", "share", "shares"];

/// Filler between a comparison operator and its operand ("greater than the").
const OPERAND_FILLERS: &[&str] = &["than", "the", "its", "their", "a", "an"];

pub fn crossover(tokens: &TokenStream, _settings: &InterpreterSettings) -> Option<ParsedQuery> {
    for (phrase, pair, direction) in CROSS_EVENTS {
        if tokens.find_phrase(phrase).is_some() {
            return Some(ParsedQuery {
                query_type: QueryType::Crossover,
                indicator: Some(pair.to_string()),
                direction: Some(*direction),
                confidence: CROSSOVER_EVENT,
                ..ParsedQuery::unknown()
            });
        }
    }

    let pair = CROSSOVER_PAIRS.iter().find(|p| {
        p.keywords
            .iter()
            .any(|keyword| tokens.find_phrase(keyword).is_some())
    });
    let polarity = tokens.find_any(&words(POLARITY_WORDS));
    let crossing = tokens.find_any(CROSS_WORDS).is_some();

    let strong_polarity = polarity.is_some_and(|(_, w)| STRONG_POLARITY.contains(&w));
    if !crossing && !(pair.is_some() && strong_polarity) {
        return None;
    }

    let cues = [pair.is_some(), polarity.is_some(), crossing]
        .iter()
        .filter(|present| **present)
        .count();
    let confidence = match cues {
        3 => CROSSOVER_FULL,
        2 => CROSSOVER_PARTIAL,
        _ => return None,
    };

    // "price crossed above SMA 50" carries its polarity in the operator.
    let direction = polarity
        .and_then(|(_, w)| lookup(POLARITY_WORDS, w))
        .or_else(|| {
            tokens
                .find_any(&words(COMPARISON_OPERATORS))
                .and_then(|(_, w)| lookup(COMPARISON_OPERATORS, w))
        })
        .unwrap_or(Direction::Up);

    Some(ParsedQuery {
        query_type: QueryType::Crossover,
        indicator: Some(pair.map_or("MACD", |p| p.name).to_string()),
        direction: Some(direction),
        confidence,
        ..ParsedQuery::unknown()
    })
}

pub fn support_resistance(
    tokens: &TokenStream,
    _settings: &InterpreterSettings,
) -> Option<ParsedQuery> {
    let (_, level_word) = tokens.find_any(&words(LEVEL_WORDS))?;
    let direction = lookup(LEVEL_WORDS, level_word)?;

    let confidence = PROXIMITY_WORDS
        .iter()
        .filter(|(phrase, _)| tokens.find_phrase(phrase).is_some())
        .map(|(_, confidence)| *confidence)
        .fold(None, |best: Option<f64>, c| Some(best.map_or(c, |b| b.max(c))))?;

    let tolerance = tokens
        .position_of("within")
        .and_then(|i| tokens.number_after(i, 2))
        .filter(|n| *n > 0.0);

    Some(ParsedQuery {
        query_type: QueryType::SupportResistance,
        indicator: Some(Indicator::Close.name().to_string()),
        threshold: tolerance,
        direction: Some(direction),
        confidence,
        ..ParsedQuery::unknown()
    })
}

pub fn comparison(tokens: &TokenStream, settings: &InterpreterSettings) -> Option<ParsedQuery> {
    let (_, cue) = tokens.find_any(&words(COMPARISON_CUES))?;
    let direction = lookup(COMPARISON_CUES, cue)?;

    let mentions_sector = tokens.contains("sector") || tokens.contains("sectors");
    let confidence = if mentions_sector {
        COMPARISON_WITH_SECTOR
    } else {
        COMPARISON_WITHOUT_SECTOR
    };

    let indicator = find_indicator(tokens)
        .map(|m| m.indicator)
        .unwrap_or(settings.comparison_indicator);

    Some(ParsedQuery {
        query_type: QueryType::Comparison,
        indicator: Some(indicator.name().to_string()),
        direction: Some(direction),
        sector: extract_sector(tokens),
        confidence,
        ..ParsedQuery::unknown()
    })
}

pub fn trend(tokens: &TokenStream, settings: &InterpreterSettings) -> Option<ParsedQuery> {
    let (verb_index, verb) = tokens.find_any(&words(TREND_VERBS))?;
    let direction = lookup(TREND_VERBS, verb)?;

    let mut confidence = BASE_CONFIDENCE;
    let adjacent: Vec<usize> = [Some(verb_index + 1), verb_index.checked_sub(1)]
        .into_iter()
        .flatten()
        .collect();
    let indicator = resolve_or_default(
        find_indicator(tokens),
        names_unknown_indicator(tokens, &adjacent),
        Indicator::Close,
        &mut confidence,
    );

    let days = match extract_duration(tokens) {
        Some(days) => {
            confidence += DURATION_BONUS;
            days
        }
        None => settings.default_trend_days,
    };

    Some(ParsedQuery {
        query_type: QueryType::Trend,
        indicator,
        days: Some(days),
        direction: Some(direction),
        confidence: clamp_confidence(confidence),
        ..ParsedQuery::unknown()
    })
}

pub fn threshold(tokens: &TokenStream, settings: &InterpreterSettings) -> Option<ParsedQuery> {
    let operator = find_operator(tokens);

    for cue in &settings.threshold_cues {
        let Some(cue_index) = tokens.find_phrase(cue.phrase) else {
            continue;
        };
        let cue_end = cue_index + cue.phrase.split_whitespace().count();
        let explicit_level = operator.and_then(|(i, _)| threshold_number(tokens, i));

        // Only a mention attached to the cue or to the stated level overrides it.
        let explicit_indicator = indicator_at(tokens, cue_end)
            .or_else(|| indicator_ending_at(tokens, cue_index))
            .or_else(|| {
                explicit_level
                    .and(operator)
                    .and_then(|(i, _)| indicator_ending_at(tokens, i))
            })
            .map(|m| m.indicator);

        let indicator = explicit_indicator.unwrap_or(cue.indicator);
        let level = explicit_level.or((indicator == cue.indicator).then_some(cue.level));
        let confidence = if explicit_indicator.is_some() || explicit_level.is_some() {
            CUE_CONFIDENCE + CUE_OVERRIDE_BONUS
        } else {
            CUE_CONFIDENCE
        };
        return Some(ParsedQuery {
            query_type: QueryType::Threshold,
            indicator: Some(indicator.name().to_string()),
            threshold: level,
            direction: Some(cue.direction),
            confidence: clamp_confidence(confidence),
            ..ParsedQuery::unknown()
        });
    }

    let (operator_index, direction) = operator?;
    let mut confidence = BASE_CONFIDENCE;

    let operand = (operator_index + 1..tokens.len())
        .find(|&i| !tokens.word(i).is_some_and(|w| OPERAND_FILLERS.contains(&w)))
        .and_then(|i| indicator_at(tokens, i));

    let level = match operand {
        Some(_) => None,
        None => threshold_number(tokens, operator_index),
    };
    let average_reference = tokens
        .tokens()
        .iter()
        .skip(operator_index + 1)
        .take(3)
        .any(|t| AVERAGE_REFERENCES.contains(&t.lower.as_str()));
    if operand.is_some() {
        confidence -= INDICATOR_OPERAND_PENALTY;
    } else if level.is_some() || average_reference {
        confidence += THRESHOLD_BONUS;
    }

    // The subject is the indicator before the operator, never the operand.
    let subject = find_indicator(tokens)
        .filter(|m| operand.is_none_or(|o| m.start != o.start));
    let adjacent: Vec<usize> = operator_index.checked_sub(1).into_iter().collect();
    let indicator = resolve_or_default(
        subject,
        names_unknown_indicator(tokens, &adjacent),
        Indicator::Close,
        &mut confidence,
    );

    Some(ParsedQuery {
        query_type: QueryType::Threshold,
        indicator,
        threshold: level,
        direction: Some(direction),
        confidence: clamp_confidence(confidence),
        ..ParsedQuery::unknown()
    })
}

pub fn ranking(tokens: &TokenStream, settings: &InterpreterSettings) -> Option<ParsedQuery> {
    let superlative = tokens.find_any(&words(SUPERLATIVES));
    let explicit_limit = (0..tokens.len())
        .filter(|&i| tokens.word(i).is_some_and(|w| LIMIT_WORDS.contains(&w)))
        .find_map(|i| tokens.integer_after(i));

    if superlative.is_none() && explicit_limit.is_none() {
        return None;
    }

    let direction = superlative
        .and_then(|(_, w)| lookup(SUPERLATIVES, w))
        .unwrap_or(Direction::Up);

    let mut confidence = BASE_CONFIDENCE;
    if explicit_limit.is_some() {
        confidence += LIMIT_BONUS;
    }

    let adjacent: Vec<usize> = superlative.map(|(i, _)| i + 1).into_iter().collect();
    let indicator = resolve_or_default(
        find_indicator(tokens),
        names_unknown_indicator(tokens, &adjacent),
        settings.ranking_indicator,
        &mut confidence,
    );

    Some(ParsedQuery {
        query_type: QueryType::Ranking,
        indicator,
        direction: Some(direction),
        limit: Some(
            explicit_limit
                .map(|n| n as usize)
                .unwrap_or(settings.default_ranking_limit),
        ),
        sector: extract_sector(tokens),
        confidence: clamp_confidence(confidence),
        ..ParsedQuery::unknown()
    })
}

/// Explicit indicator earns the bonus; an unknown name costs the penalty and
/// leaves the indicator unset; otherwise the rule's default applies.
fn resolve_or_default(
    found: Option<IndicatorMatch>,
    unresolved: bool,
    default: Indicator,
    confidence: &mut f64,
) -> Option<String> {
    match found {
        Some(IndicatorMatch { indicator, .. }) => {
            *confidence += INDICATOR_BONUS;
            Some(indicator.name().to_string())
        }
        None if unresolved => {
            *confidence -= UNRESOLVED_PENALTY;
            None
        }
        None => Some(default.name().to_string()),
    }
}

/// True when a word in indicator position is a name the vocabulary does not
/// know. Indicator positions are `adjacent` to the cue, after a slot word
/// ("by", "with", "stocks") and right after a result count ("top 5 EMA").
fn names_unknown_indicator(tokens: &TokenStream, adjacent: &[usize]) -> bool {
    let slots = (0..tokens.len()).filter_map(|i| {
        let slot_word = tokens
            .word(i)
            .is_some_and(|w| INDICATOR_SLOT_WORDS.contains(&w));
        let count = tokens.number(i).is_some()
            && i.checked_sub(1)
                .and_then(|p| tokens.word(p))
                .is_some_and(|w| LIMIT_WORDS.contains(&w));
        (slot_word || count).then_some(i + 1)
    });

    adjacent.iter().copied().chain(slots).any(|i| {
        let names_sector = tokens
            .word(i + 1)
            .is_some_and(|w| w == "sector" || w == "sectors");
        is_unresolved_mention(tokens, i)
            && tokens.word(i).is_some_and(|w| !is_cue_word(w))
            && !names_sector
    })
}

/// First comparison operator that is not part of a duration ("over 5 days").
fn find_operator(tokens: &TokenStream) -> Option<(usize, Direction)> {
    (0..tokens.len()).find_map(|i| {
        let direction = lookup(COMPARISON_OPERATORS, tokens.word(i)?)?;
        let is_duration = tokens.number(i + 1).is_some()
            && tokens
                .word(i + 2)
                .is_some_and(|w| lookup(DURATION_UNITS, w).is_some());
        if is_duration {
            None
        } else {
            Some((i, direction))
        }
    })
}

/// Number following an operator, skipping "than" and indicator periods
/// ("above SMA 50" names an indicator, not a level).
fn threshold_number(tokens: &TokenStream, operator_index: usize) -> Option<f64> {
    (operator_index + 1..(operator_index + 4).min(tokens.len())).find_map(|i| {
        let n = tokens.number(i)?;
        let after_family = i
            .checked_sub(1)
            .and_then(|p| tokens.word(p))
            .is_some_and(is_period_family);
        if after_family { None } else { Some(n) }
    })
}

/// Duration in trading days: "5 days", "2 weeks", or a bare "week".
fn extract_duration(tokens: &TokenStream) -> Option<u32> {
    (0..tokens.len()).find_map(|i| {
        let unit_days = lookup(DURATION_UNITS, tokens.word(i)?)?;
        match tokens.integer_before(i) {
            Some(n) => Some(n.saturating_mul(unit_days)),
            None if !tokens.word(i)?.ends_with('s') => Some(unit_days),
            None => None,
        }
    })
}

/// The word right before "sector", unless it is a stop-word or a cue.
pub fn extract_sector(tokens: &TokenStream) -> Option<String> {
    let sector_index = tokens.position_of("sector")?;
    let token = tokens.get(sector_index.checked_sub(1)?)?;
    if !token.is_word() {
        return None;
    }
    let word = token.lower.as_str();
    if SECTOR_STOPWORDS.contains(&word) || is_cue_word(word) || Indicator::from_name(word).is_some()
    {
        return None;
    }
    Some(token.text.clone())
}
