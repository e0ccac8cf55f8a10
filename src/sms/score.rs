//! Confidence scoring for extracted fields.
//!
//! A score is the base confidence plus the weight of every rule whose
//! evidence is present, clamped to `[0, 1]`. Each rule is evaluated on its
//! own, so the score for any message can be explained rule by rule.

use serde::{Deserialize, Serialize};

/// A piece of evidence that a message is a genuine transaction notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Evidence {
    /// A currency-marked amount was found.
    AmountFound,
    /// A debit or credit keyword was found.
    DirectionFound,
    /// A merchant was found.
    MerchantFound,
}

/// Which fields the extractor managed to find in a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    /// Whether an amount was found.
    pub amount: bool,
    /// Whether a direction was found.
    pub direction: bool,
    /// Whether a merchant was found.
    pub merchant: bool,
}

impl Evidence {
    /// Whether this evidence is present in `signals`.
    pub fn is_present(&self, signals: &Signals) -> bool {
        match self {
            Evidence::AmountFound => signals.amount,
            Evidence::DirectionFound => signals.direction,
            Evidence::MerchantFound => signals.merchant,
        }
    }
}

/// A weighted piece of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRule {
    /// The evidence this rule rewards.
    pub evidence: Evidence,
    /// The amount added to the score when the evidence is present.
    pub weight: f64,
}

impl ScoreRule {
    /// Create a rule that adds `weight` when `evidence` is present.
    pub fn new(evidence: Evidence, weight: f64) -> Self {
        Self { evidence, weight }
    }

    /// The contribution of this rule to the score of `signals`.
    pub fn contribution(&self, signals: &Signals) -> f64 {
        if self.evidence.is_present(signals) {
            self.weight
        } else {
            0.0
        }
    }
}

/// The starting confidence before any evidence is counted.
pub const DEFAULT_BASE_CONFIDENCE: f64 = 0.5;

/// The default rules, in the order their evidence is gathered.
pub fn default_score_rules() -> Vec<ScoreRule> {
    vec![
        ScoreRule::new(Evidence::AmountFound, 0.3),
        ScoreRule::new(Evidence::DirectionFound, 0.2),
        ScoreRule::new(Evidence::MerchantFound, 0.1),
    ]
}

/// Sum `base` and the contribution of every rule, clamped to `[0, 1]`.
pub fn score(base: f64, rules: &[ScoreRule], signals: &Signals) -> f64 {
    let total = rules
        .iter()
        .fold(base, |total, rule| total + rule.contribution(signals));

    if total.is_nan() {
        return 0.0;
    }

    total.clamp(0.0, 1.0)
}
