//! Detector configuration.

use serde::{Deserialize, Serialize};
use triarb_core::Instrument;

/// How the two legs combine into the synthetic cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossRule {
    /// `mid(leg0) × mid(leg1)`, e.g. EUR/GBP × GBP/USD = EUR/USD.
    #[default]
    Product,
    /// `mid(leg0) / mid(leg1)`, e.g. EUR/JPY / USD/JPY = EUR/USD.
    Quotient,
}

impl CrossRule {
    /// Synthetic cross, or `None` when the quotient denominator is zero.
    pub fn combine(&self, leg0: f64, leg1: f64) -> Option<f64> {
        match self {
            Self::Product => Some(leg0 * leg1),
            Self::Quotient => {
                if leg1 == 0.0 {
                    None
                } else {
                    Some(leg0 / leg1)
                }
            }
        }
    }
}

/// `[spread]` configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadConfig {
    /// Quoted cross-rate pair the synthetic replicates.
    #[serde(default = "default_target")]
    pub target: Instrument,
    /// The two legs forming the synthetic cross, in combining order.
    #[serde(default = "default_legs")]
    pub legs: [Instrument; 2],
    #[serde(default)]
    pub rule: CrossRule,
    /// Number of spread samples in the volatility window.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Threshold when volatility is zero.
    #[serde(default = "default_baseline_threshold")]
    pub baseline_threshold: f64,
    #[serde(default = "default_volatility_multiplier")]
    pub volatility_multiplier: f64,
}

fn default_target() -> Instrument {
    Instrument::new("EUR/USD")
}

fn default_legs() -> [Instrument; 2] {
    [Instrument::new("EUR/GBP"), Instrument::new("GBP/USD")]
}

fn default_window_size() -> usize {
    500
}

fn default_baseline_threshold() -> f64 {
    0.0001
}

fn default_volatility_multiplier() -> f64 {
    2.0
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            legs: default_legs(),
            rule: CrossRule::default(),
            window_size: default_window_size(),
            baseline_threshold: default_baseline_threshold(),
            volatility_multiplier: default_volatility_multiplier(),
        }
    }
}

impl SpreadConfig {
    /// Validate configuration values.
    ///
    /// Returns Err if:
    /// - window_size is zero
    /// - baseline_threshold or volatility_multiplier is negative or not finite
    /// - the triangle repeats an instrument
    pub fn validate(&self) -> Result<(), String> {
        if self.window_size == 0 {
            return Err("window_size must be at least 1".to_string());
        }
        if !self.baseline_threshold.is_finite() || self.baseline_threshold < 0.0 {
            return Err(format!(
                "baseline_threshold ({}) must be finite and non-negative",
                self.baseline_threshold
            ));
        }
        if !self.volatility_multiplier.is_finite() || self.volatility_multiplier < 0.0 {
            return Err(format!(
                "volatility_multiplier ({}) must be finite and non-negative",
                self.volatility_multiplier
            ));
        }
        let [leg0, leg1] = &self.legs;
        if leg0 == leg1 || leg0 == &self.target || leg1 == &self.target {
            return Err(format!(
                "triangle must name three distinct instruments: target={} legs=[{}, {}]",
                self.target, leg0, leg1
            ));
        }
        Ok(())
    }
}

/// Score assigned to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrengthScoring {
    /// `|spread|`
    #[default]
    AbsSpread,
    /// `|spread| / threshold`, falling back to `|spread|` at zero threshold.
    ThresholdRatio,
    /// `scale × |spread| + offset`
    Affine { scale: f64, offset: f64 },
}

impl StrengthScoring {
    pub fn score(&self, spread: f64, threshold: f64) -> f64 {
        let magnitude = spread.abs();
        match *self {
            Self::AbsSpread => magnitude,
            Self::ThresholdRatio => {
                if threshold > 0.0 {
                    magnitude / threshold
                } else {
                    magnitude
                }
            }
            Self::Affine { scale, offset } => scale * magnitude + offset,
        }
    }
}

/// `[decision]` configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionConfig {
    #[serde(default)]
    pub scoring: StrengthScoring,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SpreadConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window_size, 500);
        assert_eq!(config.baseline_threshold, 0.0001);
        assert_eq!(config.volatility_multiplier, 2.0);
        assert_eq!(config.target.as_str(), "EUR/USD");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_window = SpreadConfig {
            window_size: 0,
            ..Default::default()
        };
        assert!(zero_window.validate().is_err());

        let repeated = SpreadConfig {
            legs: [Instrument::new("EUR/USD"), Instrument::new("GBP/USD")],
            ..Default::default()
        };
        assert!(repeated.validate().is_err());

        let negative = SpreadConfig {
            baseline_threshold: -1.0,
            ..Default::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_cross_rules() {
        assert_eq!(CrossRule::Product.combine(0.85, 1.3), Some(0.85 * 1.3));
        assert_eq!(CrossRule::Quotient.combine(160.0, 145.0), Some(160.0 / 145.0));
        assert_eq!(CrossRule::Quotient.combine(160.0, 0.0), None);
    }

    #[test]
    fn test_strength_scoring() {
        assert_eq!(StrengthScoring::AbsSpread.score(-0.002, 0.001), 0.002);
        assert_eq!(StrengthScoring::ThresholdRatio.score(-0.002, 0.001), 2.0);
        assert_eq!(StrengthScoring::ThresholdRatio.score(0.002, 0.0), 0.002);
        let affine = StrengthScoring::Affine {
            scale: 100.0,
            offset: 1.0,
        };
        assert!((affine.score(0.002, 0.001) - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_parse_from_toml() {
        let config: SpreadConfig = toml::from_str(
            r#"
            target = "EUR/USD"
            legs = ["EUR/JPY", "USD/JPY"]
            rule = "quotient"
            window_size = 100
            "#,
        )
        .unwrap();
        assert_eq!(config.rule, CrossRule::Quotient);
        assert_eq!(config.legs[1].as_str(), "USD/JPY");
        assert_eq!(config.baseline_threshold, 0.0001);

        let decision: DecisionConfig = toml::from_str(
            r#"
            [scoring]
            kind = "affine"
            scale = 10.0
            offset = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(
            decision.scoring,
            StrengthScoring::Affine {
                scale: 10.0,
                offset: 0.5
            }
        );
    }
}
