//! Configuration Validation - Rule/Policy Separation
//!
//! Rules produce structured violations.
//! Policy: errors block a run, warnings are reported and the run proceeds.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::GeneratorConfig;
use crate::pipeline::Strategy;

/// Layers the pairwise strategy reads: background, right card, left card.
pub const PAIRWISE_LAYER_COUNT: usize = 3;

const PERCENT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub remediation: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub strategy: Strategy,
    pub violations: Vec<ValidationViolation>,
}

impl ValidationResult {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.violations
            .iter()
            .filter(|v| v.severity == ViolationSeverity::Error)
            .map(|v| format!("{}: {}", v.rule, v.message))
            .collect()
    }
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, config: &GeneratorConfig, strategy: Strategy) -> Vec<ValidationViolation>;
}

// --- Concrete Rules ---

pub struct EditionRangeRule;

impl ValidationRule for EditionRangeRule {
    fn name(&self) -> &'static str { "edition_range" }

    fn validate(&self, config: &GeneratorConfig, _strategy: Strategy) -> Vec<ValidationViolation> {
        if config.start_edition_from >= 1 && config.start_edition_from <= config.edition_size {
            return vec![];
        }
        vec![ValidationViolation {
            rule: self.name().to_string(),
            severity: ViolationSeverity::Error,
            message: "Edition range is empty or starts below 1".to_string(),
            expected: Some("1 <= startEditionFrom <= editionSize".to_string()),
            actual: Some(format!(
                "startEditionFrom={}, editionSize={}",
                config.start_edition_from, config.edition_size
            )),
            remediation: vec!["Adjust startEditionFrom or editionSize".to_string()],
        }]
    }
}

pub struct LayerCountRule;

impl ValidationRule for LayerCountRule {
    fn name(&self) -> &'static str { "layer_count" }

    fn validate(&self, config: &GeneratorConfig, strategy: Strategy) -> Vec<ValidationViolation> {
        let required = match strategy {
            Strategy::Pairwise => PAIRWISE_LAYER_COUNT,
            Strategy::Rarity => 1,
        };
        if config.layers.len() >= required {
            return vec![];
        }
        vec![ValidationViolation {
            rule: self.name().to_string(),
            severity: ViolationSeverity::Error,
            message: format!("Too few layers for the {} strategy", strategy),
            expected: Some(format!("at least {} layers", required)),
            actual: Some(format!("{} layers", config.layers.len())),
            remediation: vec!["Add layer definitions to the configuration".to_string()],
        }]
    }
}

pub struct BackgroundCycleRule;

impl ValidationRule for BackgroundCycleRule {
    fn name(&self) -> &'static str { "background_cycle" }

    fn validate(&self, config: &GeneratorConfig, strategy: Strategy) -> Vec<ValidationViolation> {
        if strategy != Strategy::Pairwise || config.background_cycle > 0 {
            return vec![];
        }
        vec![ValidationViolation {
            rule: self.name().to_string(),
            severity: ViolationSeverity::Error,
            message: "Background cycle must be positive".to_string(),
            expected: Some(">= 1".to_string()),
            actual: Some("0".to_string()),
            remediation: vec!["Set backgroundCycle to the number of backgrounds".to_string()],
        }]
    }
}

pub struct RarityCoverageRule;

impl ValidationRule for RarityCoverageRule {
    fn name(&self) -> &'static str { "rarity_coverage" }

    fn validate(&self, config: &GeneratorConfig, strategy: Strategy) -> Vec<ValidationViolation> {
        if strategy != Strategy::Rarity {
            return vec![];
        }

        let mut violations = vec![];
        for weight in config.rarity_weights.iter().filter(|w| w.from > w.to) {
            violations.push(ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Warning,
                message: format!("Rarity '{}' covers no editions", weight.value),
                expected: Some("from <= to".to_string()),
                actual: Some(format!("from={}, to={}", weight.from, weight.to)),
                remediation: vec!["Fix the rarity band bounds".to_string()],
            });
        }

        let slots: u64 = config
            .rarity_weights
            .iter()
            .map(|w| (w.to as u64 + 1).saturating_sub(w.from as u64))
            .sum();
        let needed = (config.edition_size as u64 + 1).saturating_sub(config.start_edition_from as u64);
        if slots < needed {
            violations.push(ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Error,
                message: "Rarity bands do not cover every edition".to_string(),
                expected: Some(format!("{} slots", needed)),
                actual: Some(format!("{} slots", slots)),
                remediation: vec!["Extend the rarity weight ranges".to_string()],
            });
        }

        violations
    }
}

pub struct RarityPercentRule;

impl ValidationRule for RarityPercentRule {
    fn name(&self) -> &'static str { "rarity_percent" }

    fn validate(&self, config: &GeneratorConfig, strategy: Strategy) -> Vec<ValidationViolation> {
        if strategy != Strategy::Rarity {
            return vec![];
        }

        let mut violations = vec![];
        for weight in &config.rarity_weights {
            for (layer_id, options) in &weight.layer_percent {
                let total: f64 = options.iter().map(|o| o.percent).sum();
                if (total - 100.0).abs() > PERCENT_TOLERANCE {
                    violations.push(ValidationViolation {
                        rule: self.name().to_string(),
                        severity: ViolationSeverity::Warning,
                        message: format!(
                            "Layer {} options for rarity '{}' do not sum to 100",
                            layer_id, weight.value
                        ),
                        expected: Some("100".to_string()),
                        actual: Some(format!("{:.2}", total)),
                        remediation: vec!["Rebalance the layerPercent options".to_string()],
                    });
                }
            }
        }
        violations
    }
}

/// Validator orchestrates rules and applies policy
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(EditionRangeRule),
                Box::new(LayerCountRule),
                Box::new(BackgroundCycleRule),
                Box::new(RarityCoverageRule),
                Box::new(RarityPercentRule),
            ],
        }
    }

    pub fn validate(&self, config: &GeneratorConfig, strategy: Strategy) -> ValidationResult {
        let mut violations = vec![];
        for rule in &self.rules {
            violations.extend(rule.validate(config, strategy));
        }

        for v in violations.iter().filter(|v| v.severity == ViolationSeverity::Warning) {
            warn!(rule = %v.rule, "{}", v.message);
        }

        let valid = !violations.iter().any(|v| v.severity == ViolationSeverity::Error);
        ValidationResult {
            valid,
            strategy,
            violations,
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
