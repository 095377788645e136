//! # Validation Rules Configuration
//!
//! Tunable knobs for the validators, loaded with this priority:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Overrides (highest priority, via with_overrides)                   │
//! │     ICO_PERCENT_EPSILON=0.01                                           │
//! │     ICO_INPUT_UTC_OFFSET=+09:00                                        │
//! │     ICO_CONTIGUITY=submission                                          │
//! │                                                                         │
//! │  2. TOML document (via from_toml_str)                                  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     epsilon 0.01, JST input, submission-order contiguity               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # rules.toml
//! percent_epsilon = 0.01
//! input_utc_offset = "+09:00"
//! contiguity = "chronological"
//! ```
//!
//! This crate never reads the process environment itself. Binaries pass a
//! key lookup (usually `std::env::var`) to [`SaleRules::with_overrides`].

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::time::{jst, parse_offset};
use crate::DEFAULT_PERCENT_EPSILON;

// =============================================================================
// Contiguity Order
// =============================================================================

/// Which neighbour a window is compared against in the gap check.
///
/// ## Modes
/// ```text
/// Input:   [ B: 01-15..02-01 ]  [ A: 01-01..01-15 ]
///
/// SUBMISSION     compare B.end (02-01) with A.start (01-01)  → Gap
/// CHRONOLOGICAL  sort → A, B; compare A.end with B.start     → OK
/// ```
///
/// Submission order is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContiguityOrder {
    /// Neighbours are adjacent rows as submitted.
    #[default]
    Submission,

    /// Rows are sorted by start before neighbours are compared.
    Chronological,
}

impl std::str::FromStr for ContiguityOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "submission" | "input" => Ok(ContiguityOrder::Submission),
            "chronological" | "sorted" => Ok(ContiguityOrder::Chronological),
            other => Err(ConfigError::InvalidValue(format!(
                "contiguity '{}'. Valid options: submission, chronological",
                other
            ))),
        }
    }
}

// =============================================================================
// Sale Rules
// =============================================================================

/// Rules shared by every validator in this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRules {
    /// Absolute tolerance when a percentage total is compared with 100.
    pub percent_epsilon: f64,

    /// Offset applied to naive form dates.
    pub input_offset: FixedOffset,

    /// Neighbour ordering for the schedule gap check.
    pub contiguity: ContiguityOrder,
}

impl Default for SaleRules {
    fn default() -> Self {
        SaleRules {
            percent_epsilon: DEFAULT_PERCENT_EPSILON,
            input_offset: jst(),
            contiguity: ContiguityOrder::Submission,
        }
    }
}

/// On-disk shape of [`SaleRules`]; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesFile {
    percent_epsilon: Option<f64>,
    input_utc_offset: Option<String>,
    contiguity: Option<ContiguityOrder>,
}

/// Override key for [`SaleRules::percent_epsilon`].
pub const ENV_PERCENT_EPSILON: &str = "ICO_PERCENT_EPSILON";
/// Override key for [`SaleRules::input_offset`].
pub const ENV_INPUT_UTC_OFFSET: &str = "ICO_INPUT_UTC_OFFSET";
/// Override key for [`SaleRules::contiguity`].
pub const ENV_CONTIGUITY: &str = "ICO_CONTIGUITY";

impl SaleRules {
    /// Parse rules from a TOML document, falling back to defaults.
    ///
    /// ## Example
    /// ```rust
    /// use ico_core::{ContiguityOrder, SaleRules};
    ///
    /// let rules = SaleRules::from_toml_str(r#"contiguity = "chronological""#).unwrap();
    /// assert_eq!(rules.contiguity, ContiguityOrder::Chronological);
    /// assert_eq!(rules.percent_epsilon, 0.01);
    /// ```
    pub fn from_toml_str(doc: &str) -> Result<Self, ConfigError> {
        let file: RulesFile =
            toml::from_str(doc).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut rules = SaleRules::default();
        if let Some(epsilon) = file.percent_epsilon {
            rules.percent_epsilon = checked_epsilon(epsilon, "percent_epsilon")?;
        }
        if let Some(offset) = file.input_utc_offset {
            rules.input_offset = parse_offset(&offset)
                .ok_or_else(|| ConfigError::InvalidValue("input_utc_offset".to_string()))?;
        }
        if let Some(order) = file.contiguity {
            rules.contiguity = order;
        }

        debug!(?rules, "Loaded sale rules from TOML");
        Ok(rules.finish())
    }

    /// Apply `ICO_*` overrides on top of `self`.
    ///
    /// `lookup` maps a key to its raw value; pass `|k| std::env::var(k).ok()`
    /// to read the process environment.
    ///
    /// ## Example
    /// ```rust
    /// use ico_core::SaleRules;
    ///
    /// let rules = SaleRules::default()
    ///     .with_overrides(|key| (key == "ICO_PERCENT_EPSILON").then(|| "0.5".to_string()))
    ///     .unwrap();
    /// assert_eq!(rules.percent_epsilon, 0.5);
    /// ```
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_PERCENT_EPSILON) {
            let epsilon: f64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(ENV_PERCENT_EPSILON.to_string()))?;
            self.percent_epsilon = checked_epsilon(epsilon, ENV_PERCENT_EPSILON)?;
        }

        if let Some(raw) = lookup(ENV_INPUT_UTC_OFFSET) {
            self.input_offset = parse_offset(&raw)
                .ok_or_else(|| ConfigError::InvalidValue(ENV_INPUT_UTC_OFFSET.to_string()))?;
        }

        if let Some(raw) = lookup(ENV_CONTIGUITY) {
            self.contiguity = raw.parse()?;
        }

        Ok(self.finish())
    }

    /// Whether the percent tolerance is loose enough to hide a bad total.
    pub fn is_loose(&self) -> bool {
        self.percent_epsilon > 1.0
    }

    fn finish(self) -> Self {
        if self.is_loose() {
            warn!(
                epsilon = self.percent_epsilon,
                "Percent tolerance above 1% accepts visibly wrong vesting totals"
            );
        }
        self
    }
}

fn checked_epsilon(epsilon: f64, name: &str) -> Result<f64, ConfigError> {
    if epsilon.is_finite() && epsilon >= 0.0 {
        Ok(epsilon)
    } else {
        Err(ConfigError::InvalidValue(name.to_string()))
    }
}

// =============================================================================
// Config Error
// =============================================================================

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Could not parse rules file: {0}")]
    Parse(String),
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let rules = SaleRules::default();
        assert_eq!(rules.percent_epsilon, 0.01);
        assert_eq!(rules.input_offset.local_minus_utc(), 9 * 3600);
        assert_eq!(rules.contiguity, ContiguityOrder::Submission);
    }

    #[test]
    fn test_toml_overrides() {
        let rules = SaleRules::from_toml_str(
            r#"
            percent_epsilon = 0.001
            input_utc_offset = "+00:00"
            contiguity = "chronological"
            "#,
        )
        .unwrap();
        assert_eq!(rules.percent_epsilon, 0.001);
        assert_eq!(rules.input_offset.local_minus_utc(), 0);
        assert_eq!(rules.contiguity, ContiguityOrder::Chronological);
    }

    #[test]
    fn test_toml_rejects_bad_values() {
        assert!(matches!(
            SaleRules::from_toml_str("percent_epsilon = -1.0"),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            SaleRules::from_toml_str(r#"input_utc_offset = "JST""#),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            SaleRules::from_toml_str(r#"input_utc_offset = "+-1:00""#),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            SaleRules::from_toml_str(r#"input_utc_offset = "-+9:00""#),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            SaleRules::from_toml_str("unknown_key = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_overrides_apply_each_key() {
        let rules = SaleRules::default()
            .with_overrides(lookup(&[
                ("ICO_PERCENT_EPSILON", " 0.25 "),
                ("ICO_INPUT_UTC_OFFSET", "-05:30"),
                ("ICO_CONTIGUITY", "sorted"),
            ]))
            .unwrap();
        assert_eq!(rules.percent_epsilon, 0.25);
        assert_eq!(rules.input_offset.local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert_eq!(rules.contiguity, ContiguityOrder::Chronological);
    }

    #[test]
    fn test_no_overrides_keeps_rules() {
        let base = SaleRules::from_toml_str(r#"contiguity = "chronological""#).unwrap();
        assert_eq!(base.clone().with_overrides(lookup(&[])).unwrap(), base);
    }

    #[test]
    fn test_overrides_win_over_toml() {
        let rules = SaleRules::from_toml_str(
            r#"
            percent_epsilon = 0.001
            input_utc_offset = "+00:00"
            "#,
        )
        .unwrap()
        .with_overrides(lookup(&[("ICO_INPUT_UTC_OFFSET", "+09:00")]))
        .unwrap();
        // File value survives where no override is set.
        assert_eq!(rules.percent_epsilon, 0.001);
        assert_eq!(rules.input_offset.local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_overrides_reject_bad_values() {
        let bad = [
            ("ICO_PERCENT_EPSILON", "abc"),
            ("ICO_PERCENT_EPSILON", "-0.5"),
            ("ICO_PERCENT_EPSILON", "NaN"),
            ("ICO_INPUT_UTC_OFFSET", "+-1:00"),
            ("ICO_INPUT_UTC_OFFSET", "JST"),
            ("ICO_CONTIGUITY", "random"),
        ];
        for (key, value) in bad {
            let result = SaleRules::default().with_overrides(lookup(&[(key, value)]));
            assert!(
                matches!(result, Err(ConfigError::InvalidValue(_))),
                "{}={} should be rejected",
                key,
                value
            );
        }
    }

    #[test]
    fn test_loose_epsilon_is_flagged_from_any_source() {
        let from_toml = SaleRules::from_toml_str("percent_epsilon = 2.0").unwrap();
        assert!(from_toml.is_loose());

        let from_override = SaleRules::default()
            .with_overrides(lookup(&[("ICO_PERCENT_EPSILON", "2")]))
            .unwrap();
        assert!(from_override.is_loose());
        assert!(!SaleRules::default().is_loose());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(SaleRules::from_toml_str("").unwrap(), SaleRules::default());
    }

    #[test]
    fn test_contiguity_from_str() {
        assert_eq!(
            "Chronological".parse::<ContiguityOrder>().unwrap(),
            ContiguityOrder::Chronological
        );
        assert!("random".parse::<ContiguityOrder>().is_err());
    }
}
