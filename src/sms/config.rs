//! The rule tables that drive SMS extraction.
//!
//! The tables are plain data. An [ExtractorConfig] is built once, validated,
//! and handed to [crate::sms::Extractor::new]; nothing reads it from global
//! state, so tests can swap in their own tables.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    sms::{
        CategoryRule, ScoreRule, default_category_rules, default_score_rules,
        score::DEFAULT_BASE_CONFIDENCE,
    },
};

/// Rule tables for the SMS extractor.
///
/// Fields missing from a JSON rules file fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Sender codes of known banks. A sender matches if it contains any of
    /// these, ignoring case.
    pub bank_senders: Vec<String>,
    /// Currency markers that may appear before or after an amount.
    pub currency_markers: Vec<String>,
    /// Keywords that mark a debit. Checked before the credit keywords.
    pub debit_keywords: Vec<String>,
    /// Keywords that mark a credit.
    pub credit_keywords: Vec<String>,
    /// Merchant guesses starting with one of these words are discarded,
    /// e.g. "your account" in "credited to your account".
    pub merchant_stop_words: Vec<String>,
    /// Ordered keyword groups for category inference.
    pub category_rules: Vec<CategoryRule>,
    /// The confidence before any evidence is counted.
    pub base_confidence: f64,
    /// Weighted evidence added to the base confidence.
    pub score_rules: Vec<ScoreRule>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            bank_senders: to_strings(&[
                "HDFCBK", "ICICIBK", "SBIIN", "AXISBK", "KOTAKBK", "PNBSMS", "BOIIND", "UNIBKS",
                "IDFCFB", "YESBNK",
            ]),
            currency_markers: to_strings(&["rs.", "rs", "inr", "₹"]),
            debit_keywords: to_strings(&[
                "debited",
                "withdrawn",
                "spent",
                "paid",
                "purchase",
                "debit",
            ]),
            credit_keywords: to_strings(&["credited", "received", "deposited", "refund", "credit"]),
            merchant_stop_words: to_strings(&["your", "my", "a/c", "account"]),
            category_rules: default_category_rules(),
            base_confidence: DEFAULT_BASE_CONFIDENCE,
            score_rules: default_score_rules(),
        }
    }
}

impl ExtractorConfig {
    /// Load a config from a JSON file and validate it.
    ///
    /// # Errors
    /// Returns [Error::InvalidConfig] if the file cannot be read, is not valid
    /// JSON, or fails [ExtractorConfig::validate].
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|error| {
            Error::InvalidConfig(format!("could not read {}: {error}", path.display()))
        })?;

        Self::from_json(&text)
    }

    /// Parse a config from a JSON string and validate it.
    ///
    /// # Errors
    /// Returns [Error::InvalidConfig] if `text` is not a valid config.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(text)
            .map_err(|error| Error::InvalidConfig(format!("invalid rules JSON: {error}")))?;

        config.validate()?;

        Ok(config)
    }

    /// Check that the tables can drive an extractor.
    ///
    /// # Errors
    /// Returns [Error::InvalidConfig] if there are no bank senders or currency
    /// markers, any entry is blank, a category group has no keywords, or the
    /// base confidence is outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), Error> {
        if self.bank_senders.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one bank sender is required".to_owned(),
            ));
        }

        if self.currency_markers.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one currency marker is required".to_owned(),
            ));
        }

        let lists = [
            ("bank_senders", &self.bank_senders),
            ("currency_markers", &self.currency_markers),
            ("debit_keywords", &self.debit_keywords),
            ("credit_keywords", &self.credit_keywords),
            ("merchant_stop_words", &self.merchant_stop_words),
        ];

        for (name, list) in lists {
            if list.iter().any(|entry| entry.trim().is_empty()) {
                return Err(Error::InvalidConfig(format!(
                    "{name} cannot contain blank entries"
                )));
            }
        }

        for rule in &self.category_rules {
            if rule.keywords.is_empty() || rule.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(Error::InvalidConfig(format!(
                    "category {} needs at least one non-blank keyword",
                    rule.category
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.base_confidence) {
            return Err(Error::InvalidConfig(format!(
                "base_confidence must be between 0 and 1, got {}",
                self.base_confidence
            )));
        }

        if self.score_rules.iter().any(|rule| !rule.weight.is_finite()) {
            return Err(Error::InvalidConfig(
                "score rule weights must be finite".to_owned(),
            ));
        }

        Ok(())
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}
