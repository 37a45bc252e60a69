//! Interpreter settings.
//!
//! Every tunable constant of classification and execution, loaded from the
//! `[interpreter]` and `[cues]` config sections and validated up front.

use crate::domain::error::NlqError;
use crate::domain::indicator::Indicator;
use crate::domain::vocabulary::{ThresholdCue, DEFAULT_THRESHOLD_CUES};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "interpreter";
const CUES_SECTION: &str = "cues";

#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterSettings {
    /// Trend window when the text names no duration.
    pub default_trend_days: u32,
    /// Ranking size when the text names no count.
    pub default_ranking_limit: usize,
    /// Result cap for intents that carry no count of their own.
    pub default_result_limit: usize,
    pub max_result_limit: usize,
    pub ranking_indicator: Indicator,
    pub comparison_indicator: Indicator,
    /// Minimum deviation from the sector mean, in percent.
    pub comparison_band_pct: f64,
    /// Maximum distance from a support/resistance level, in percent.
    pub support_tolerance_pct: f64,
    /// Bars searched back for a sign flip of the crossover pair.
    pub crossover_lookback: usize,
    /// Bars averaged for "above average" style thresholds.
    pub average_window: usize,
    pub threshold_cues: Vec<ThresholdCue>,
}

impl Default for InterpreterSettings {
    fn default() -> Self {
        Self {
            default_trend_days: 3,
            default_ranking_limit: 10,
            default_result_limit: 50,
            max_result_limit: 1000,
            ranking_indicator: Indicator::Volume,
            comparison_indicator: Indicator::Rsi14,
            comparison_band_pct: 5.0,
            support_tolerance_pct: 2.0,
            crossover_lookback: 3,
            average_window: 20,
            threshold_cues: DEFAULT_THRESHOLD_CUES.to_vec(),
        }
    }
}

impl InterpreterSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, NlqError> {
        let defaults = Self::default();

        let settings = Self {
            default_trend_days: positive_int(
                config,
                "default_trend_days",
                defaults.default_trend_days as i64,
            )? as u32,
            default_ranking_limit: positive_int(
                config,
                "default_ranking_limit",
                defaults.default_ranking_limit as i64,
            )? as usize,
            default_result_limit: positive_int(
                config,
                "default_result_limit",
                defaults.default_result_limit as i64,
            )? as usize,
            max_result_limit: positive_int(
                config,
                "max_result_limit",
                defaults.max_result_limit as i64,
            )? as usize,
            ranking_indicator: indicator(config, "ranking_indicator", defaults.ranking_indicator)?,
            comparison_indicator: indicator(
                config,
                "comparison_indicator",
                defaults.comparison_indicator,
            )?,
            comparison_band_pct: non_negative(
                config,
                "comparison_band_pct",
                defaults.comparison_band_pct,
            )?,
            support_tolerance_pct: non_negative(
                config,
                "support_tolerance_pct",
                defaults.support_tolerance_pct,
            )?,
            crossover_lookback: positive_int(
                config,
                "crossover_lookback",
                defaults.crossover_lookback as i64,
            )? as usize,
            average_window: positive_int(config, "average_window", defaults.average_window as i64)?
                as usize,
            threshold_cues: threshold_cues(config)?,
        };

        if settings.default_result_limit > settings.max_result_limit {
            return Err(NlqError::ConfigInvalid {
                section: SECTION.into(),
                key: "default_result_limit".into(),
                reason: format!(
                    "default_result_limit ({}) exceeds max_result_limit ({})",
                    settings.default_result_limit, settings.max_result_limit
                ),
            });
        }

        Ok(settings)
    }
}

fn positive_int(config: &dyn ConfigPort, key: &str, default: i64) -> Result<i64, NlqError> {
    let value = config.get_int(SECTION, key, default);
    if value < 1 || value > u32::MAX as i64 {
        return Err(NlqError::ConfigInvalid {
            section: SECTION.into(),
            key: key.into(),
            reason: format!("{key} must be a positive integer, got {value}"),
        });
    }
    Ok(value)
}

fn non_negative(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, NlqError> {
    let value = config.get_double(SECTION, key, default);
    if !value.is_finite() || value < 0.0 {
        return Err(NlqError::ConfigInvalid {
            section: SECTION.into(),
            key: key.into(),
            reason: format!("{key} must be non-negative, got {value}"),
        });
    }
    Ok(value)
}

fn indicator(
    config: &dyn ConfigPort,
    key: &str,
    default: Indicator,
) -> Result<Indicator, NlqError> {
    match config.get_string(SECTION, key) {
        Some(name) => Indicator::from_name(&name).ok_or_else(|| NlqError::ConfigInvalid {
            section: SECTION.into(),
            key: key.into(),
            reason: format!("unknown indicator '{name}'"),
        }),
        None => Ok(default),
    }
}

fn threshold_cues(config: &dyn ConfigPort) -> Result<Vec<ThresholdCue>, NlqError> {
    DEFAULT_THRESHOLD_CUES
        .iter()
        .map(|cue| {
            let level = config.get_double(CUES_SECTION, cue.phrase, cue.level);
            if cue.indicator == Indicator::Rsi14 && !(0.0..=100.0).contains(&level) {
                return Err(NlqError::ConfigInvalid {
                    section: CUES_SECTION.into(),
                    key: cue.phrase.into(),
                    reason: format!("RSI level must be within 0-100, got {level}"),
                });
            }
            Ok(ThresholdCue {
                level,
                ..cue.clone()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::query::Direction;

    fn cue<'a>(settings: &'a InterpreterSettings, phrase: &str) -> &'a ThresholdCue {
        settings
            .threshold_cues
            .iter()
            .find(|c| c.phrase == phrase)
            .unwrap()
    }

    fn settings_from(ini: &str) -> Result<InterpreterSettings, NlqError> {
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        InterpreterSettings::from_config(&adapter)
    }

    #[test]
    fn empty_config_gives_defaults() {
        let settings = settings_from("[interpreter]\n").unwrap();
        assert_eq!(settings, InterpreterSettings::default());
    }

    #[test]
    fn default_constants() {
        let settings = InterpreterSettings::default();
        assert_eq!(settings.default_trend_days, 3);
        assert_eq!(settings.ranking_indicator, Indicator::Volume);
        let overbought = cue(&settings, "overbought");
        assert_eq!(overbought.level, 70.0);
        assert_eq!(overbought.direction, Direction::Up);
        assert_eq!(cue(&settings, "oversold").level, 30.0);
    }

    #[test]
    fn overrides_are_applied() {
        let settings = settings_from(
            "[interpreter]\ndefault_trend_days = 5\nranking_indicator = RSI_14\n\
             support_tolerance_pct = 1.5\n[cues]\noverbought = 80\n",
        )
        .unwrap();
        assert_eq!(settings.default_trend_days, 5);
        assert_eq!(settings.ranking_indicator, Indicator::Rsi14);
        assert_eq!(settings.support_tolerance_pct, 1.5);
        assert_eq!(cue(&settings, "overbought").level, 80.0);
        assert_eq!(cue(&settings, "oversold").level, 30.0);
    }

    #[test]
    fn rejects_zero_window() {
        let err = settings_from("[interpreter]\ncrossover_lookback = 0\n").unwrap_err();
        assert!(
            matches!(err, NlqError::ConfigInvalid { ref key, .. } if key == "crossover_lookback")
        );
    }

    #[test]
    fn rejects_negative_band() {
        let err = settings_from("[interpreter]\ncomparison_band_pct = -1\n").unwrap_err();
        assert!(
            matches!(err, NlqError::ConfigInvalid { ref key, .. } if key == "comparison_band_pct")
        );
    }

    #[test]
    fn rejects_unknown_indicator() {
        let err = settings_from("[interpreter]\ncomparison_indicator = EMA_9\n").unwrap_err();
        match err {
            NlqError::ConfigInvalid { key, reason, .. } => {
                assert_eq!(key, "comparison_indicator");
                assert!(reason.contains("EMA_9"));
            }
            other => panic!("expected ConfigInvalid, got {other}"),
        }
    }

    #[test]
    fn rejects_out_of_range_rsi_cue() {
        let err = settings_from("[cues]\noversold = 130\n").unwrap_err();
        assert!(matches!(err, NlqError::ConfigInvalid { ref section, .. } if section == "cues"));
    }

    #[test]
    fn rejects_default_limit_above_max() {
        let err =
            settings_from("[interpreter]\ndefault_result_limit = 100\nmax_result_limit = 10\n")
                .unwrap_err();
        assert!(
            matches!(err, NlqError::ConfigInvalid { ref key, .. } if key == "default_result_limit")
        );
    }
}
