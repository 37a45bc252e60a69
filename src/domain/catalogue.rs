//! Static reference data: example queries per intent and supported indicators.

use crate::domain::indicator::Indicator;
use crate::domain::query::QueryType;
use serde::Serialize;
use std::collections::BTreeMap;

pub const EXAMPLES: &[(QueryType, &[&str])] = &[
    (
        QueryType::Trend,
        &[
            "stocks with increasing RSI for 5 days",
            "decreasing SMA_20 for 3 days",
            "stocks with rising price",
        ],
    ),
    (
        QueryType::Threshold,
        &[
            "stocks with RSI above 70",
            "volume above average",
            "overbought stocks",
            "oversold stocks",
        ],
    ),
    (
        QueryType::Ranking,
        &[
            "top 20 stocks by volume",
            "show 10 stocks with highest RSI",
            "stocks with lowest price",
            "show 10 Bank sector stocks with highest volume",
        ],
    ),
    (
        QueryType::Comparison,
        &[
            "stocks outperforming their sector",
            "stocks underperforming sector",
        ],
    ),
    (
        QueryType::Crossover,
        &["MACD bullish crossover", "MACD bearish crossover"],
    ),
    (
        QueryType::SupportResistance,
        &["price near support", "price near resistance"],
    ),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalogue {
    pub examples: BTreeMap<&'static str, Vec<&'static str>>,
    pub supported_indicators: Vec<&'static str>,
}

pub fn catalogue() -> Catalogue {
    Catalogue {
        examples: EXAMPLES
            .iter()
            .map(|(query_type, queries)| (query_type.as_str(), queries.to_vec()))
            .collect(),
        supported_indicators: Indicator::ALL.iter().map(Indicator::label).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::interpreter::Interpreter;

    #[test]
    fn every_example_classifies_as_its_intent() {
        let interpreter = Interpreter::default();
        for (query_type, queries) in EXAMPLES {
            for query in *queries {
                let parsed = interpreter.parse(query);
                assert_eq!(parsed.query_type, *query_type, "{query}");
                assert!(parsed.confidence > 0.0, "{query}");
            }
        }
    }

    #[test]
    fn every_known_intent_has_examples() {
        let catalogue = catalogue();
        for query_type in QueryType::ALL {
            if query_type == QueryType::Unknown {
                assert!(!catalogue.examples.contains_key(query_type.as_str()));
            } else {
                assert!(catalogue.examples.contains_key(query_type.as_str()));
            }
        }
    }

    #[test]
    fn supported_indicators_listed() {
        let catalogue = catalogue();
        assert_eq!(catalogue.supported_indicators.len(), 11);
        assert!(catalogue.supported_indicators.contains(&"RSI_14"));
        assert!(catalogue.supported_indicators.contains(&"price/close"));
    }

    #[test]
    fn serializes_keyed_by_intent() {
        let json = serde_json::to_value(catalogue()).unwrap();
        assert_eq!(json["examples"]["crossover"][0], "MACD bullish crossover");
        assert_eq!(json["supported_indicators"][0], "RSI_14");
    }
}
