//! Query interpreter.
//!
//! `parse` tokenizes free text and runs the rule table in priority order;
//! the first rule that recognizes the text wins. `query` parses and then
//! executes against an indicator store.

use crate::domain::error::NlqError;
use crate::domain::executor::{execute, ExecutionRequest};
use crate::domain::query::{clamp_confidence, ParsedQuery, QueryResult};
use crate::domain::rules;
use crate::domain::settings::InterpreterSettings;
use crate::domain::tokenizer::TokenStream;
use crate::ports::indicator_port::IndicatorPort;

pub type Rule = fn(&TokenStream, &InterpreterSettings) -> Option<ParsedQuery>;

/// Classification rules, highest priority first.
///
/// The closed intents go before the open-ended ones: "MACD bullish
/// crossover above 0" is a crossover, "price near support" is not a
/// threshold on price.
pub const RULES: &[(&str, Rule)] = &[
    ("crossover", rules::crossover),
    ("support_resistance", rules::support_resistance),
    ("comparison", rules::comparison),
    ("trend", rules::trend),
    ("threshold", rules::threshold),
    ("ranking", rules::ranking),
];

#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    settings: InterpreterSettings,
}

impl Interpreter {
    pub fn new(settings: InterpreterSettings) -> Self {
        Self { settings }
    }

    /// Classify `text`. Unrecognized text yields `ParsedQuery::unknown()`.
    pub fn parse(&self, text: &str) -> ParsedQuery {
        let tokens = TokenStream::new(text);
        if tokens.is_empty() {
            return ParsedQuery::unknown();
        }

        for (name, rule) in RULES {
            let Some(mut parsed) = rule(&tokens, &self.settings) else {
                continue;
            };
            parsed.confidence = clamp_confidence(parsed.confidence);
            if parsed.confidence <= 0.0 {
                tracing::debug!(rule = name, text, "rule matched with no confidence");
                return ParsedQuery::unknown();
            }
            tracing::debug!(
                rule = name,
                query_type = %parsed.query_type,
                indicator = parsed.indicator.as_deref().unwrap_or("-"),
                confidence = parsed.confidence,
                "query classified"
            );
            return parsed;
        }

        tracing::debug!(text, "no rule matched");
        ParsedQuery::unknown()
    }

    /// Parse `text` and execute it against `store`.
    ///
    /// Caller parameters are validated before the intent is considered, so a
    /// bad limit is reported even for unrecognized text.
    pub fn query(
        &self,
        store: &dyn IndicatorPort,
        text: &str,
        tickers: Option<&[String]>,
        limit: Option<i64>,
    ) -> Result<QueryResult, NlqError> {
        let request = ExecutionRequest::new(tickers, limit)?;
        let parsed = self.parse(text);
        execute(text, parsed, store, &request, &self.settings)
    }
}
