//! Extracts transaction fields from bank SMS notifications.
//!
//! Extraction is a two stage gate: the sender must be a known bank, then the
//! text must contain a currency-marked amount. Everything after the amount
//! (direction, merchant, account hint, category) is best effort.
//!
//! The patterns are heuristics tuned for Indian bank notifications. Known
//! misses:
//!
//! - Merchant names containing punctuation fail to match (e.g. "McDonald's"
//!   stops at the apostrophe).
//! - "at", "to" and "from" are matched anywhere, including at the end of a
//!   longer word, so "paid for auto rickshaw" reports the merchant "rickshaw".
//! - Amounts written without a currency marker are not found.
//! - Amounts too large for [Decimal] (29 or more integer digits) count as no
//!   amount.

use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;

use crate::{
    Error,
    sms::{
        Direction, ExtractionResult, ExtractorConfig, InboundMessage, Signals, infer_category,
        is_bank_sender, score::score,
    },
};

const AMOUNT: &str = r"([0-9,]+(?:\.[0-9]{2})?)";
const MERCHANT_PATTERN: &str =
    r"(?i)(?:at|to|from)\s+([a-z0-9\s]+?)(?:\s+on|\s+a/c|\s+xx|\s+ref|\.|,|$)";
const ACCOUNT_HINT_PATTERN: &str = r"(?i)(?:a/c|ac|account|card)[\s*x]*(\d{4})";

/// Turns bank SMS messages into [ExtractionResult]s.
///
/// An extractor is immutable once built and can be shared between threads.
#[derive(Debug, Clone)]
pub struct Extractor {
    config: ExtractorConfig,
    marker_then_amount: Regex,
    amount_then_marker: Regex,
    merchant: Regex,
    account_hint: Regex,
}

impl Extractor {
    /// Build an extractor from validated rule tables.
    ///
    /// # Errors
    /// Returns [Error::InvalidConfig] if `config` fails validation or its
    /// currency markers cannot be compiled into a pattern.
    pub fn new(config: ExtractorConfig) -> Result<Self, Error> {
        config.validate()?;

        let markers = marker_alternation(&config.currency_markers);

        Ok(Self {
            marker_then_amount: compile(&format!(r"(?i)(?:{markers})\s*{AMOUNT}"))?,
            amount_then_marker: compile(&format!(r"(?i){AMOUNT}\s*(?:{markers})"))?,
            merchant: compile(MERCHANT_PATTERN)?,
            account_hint: compile(ACCOUNT_HINT_PATTERN)?,
            config,
        })
    }

    /// The rule tables this extractor was built with.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Whether `sender_id` belongs to a known bank.
    pub fn is_bank_sender(&self, sender_id: &str) -> bool {
        is_bank_sender(sender_id, &self.config.bank_senders)
    }

    /// Extract a transaction from `message`.
    ///
    /// Returns `None` if the sender is not a known bank or the text has no
    /// currency-marked amount. Both are normal outcomes, not errors.
    pub fn extract(&self, message: &InboundMessage) -> Option<ExtractionResult> {
        if !self.is_bank_sender(&message.sender_id) {
            tracing::debug!("ignoring SMS from non-bank sender {:?}", message.sender_id);
            return None;
        }

        let result = self.extract_fields(&message.text);

        if !result.is_transaction() {
            tracing::debug!(
                "SMS from {:?} has no amount, not a transaction",
                message.sender_id
            );
            return None;
        }

        Some(result)
    }

    /// Run every field pass over `text` without checking the sender.
    ///
    /// If no amount is found the remaining passes are skipped and the result
    /// only carries the base confidence.
    pub fn extract_fields(&self, text: &str) -> ExtractionResult {
        let text = text.to_lowercase();

        let amount = self.find_amount(&text);
        if amount.is_none() {
            return ExtractionResult {
                amount: None,
                direction: None,
                merchant: None,
                category: None,
                account_hint: None,
                confidence: self.score(&Signals::default()),
            };
        }

        let direction = self.find_direction(&text);
        let merchant = self.find_merchant(&text);
        let account_hint = self.find_account_hint(&text);
        let category = merchant
            .as_deref()
            .and_then(|merchant| infer_category(merchant, &self.config.category_rules));

        let signals = Signals {
            amount: true,
            direction: direction.is_some(),
            merchant: merchant.is_some(),
        };

        ExtractionResult {
            amount,
            direction,
            merchant,
            category,
            account_hint,
            confidence: self.score(&signals),
        }
    }

    fn score(&self, signals: &Signals) -> f64 {
        score(
            self.config.base_confidence,
            &self.config.score_rules,
            signals,
        )
    }

    /// The first currency-marked amount, trying "Rs 500" before "500 Rs".
    ///
    /// A marked token that does not parse, or parses to zero, counts as no
    /// amount; the second pattern is only tried when the first finds no token.
    fn find_amount(&self, text: &str) -> Option<Decimal> {
        let captures = self
            .marker_then_amount
            .captures(text)
            .or_else(|| self.amount_then_marker.captures(text))?;

        let digits: String = captures
            .get(1)?
            .as_str()
            .chars()
            .filter(|c| *c != ',')
            .collect();

        match Decimal::from_str(&digits) {
            Ok(amount) if !amount.is_zero() => Some(amount),
            _ => None,
        }
    }

    /// Debit keywords are checked first, so a message mentioning both a
    /// debit and a credit is a debit.
    fn find_direction(&self, text: &str) -> Option<Direction> {
        let contains_any =
            |keywords: &[String]| keywords.iter().any(|kw| text.contains(&kw.to_lowercase()));

        if contains_any(self.config.debit_keywords.as_slice()) {
            Some(Direction::Debit)
        } else if contains_any(self.config.credit_keywords.as_slice()) {
            Some(Direction::Credit)
        } else {
            None
        }
    }

    fn find_merchant(&self, text: &str) -> Option<String> {
        let merchant = self.merchant.captures(text)?.get(1)?.as_str().trim();

        if merchant.is_empty() {
            return None;
        }

        let first_word = merchant.split_whitespace().next()?;
        let is_stop_word = self
            .config
            .merchant_stop_words
            .iter()
            .any(|word| word.eq_ignore_ascii_case(first_word));

        if is_stop_word {
            return None;
        }

        Some(merchant.to_owned())
    }

    fn find_account_hint(&self, text: &str) -> Option<String> {
        self.account_hint
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|digits| digits.as_str().to_owned())
    }
}

/// Join markers into a regex alternation, longest first so "rs." wins over "rs".
fn marker_alternation(markers: &[String]) -> String {
    let mut markers: Vec<String> = markers
        .iter()
        .map(|marker| marker.trim().to_lowercase())
        .collect();
    markers.sort_by_key(|marker| std::cmp::Reverse(marker.chars().count()));
    markers.dedup();

    markers
        .iter()
        .map(|marker| regex::escape(marker))
        .collect::<Vec<_>>()
        .join("|")
}

fn compile(pattern: &str) -> Result<Regex, Error> {
    Regex::new(pattern)
        .map_err(|error| Error::InvalidConfig(format!("could not compile pattern: {error}")))
}

#[cfg(test)]
mod extractor_tests {
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    use crate::sms::{
        Category, Direction, ExtractionResult, Extractor, ExtractorConfig, InboundMessage,
    };

    fn extractor() -> Extractor {
        Extractor::new(ExtractorConfig::default()).expect("Could not build extractor")
    }

    fn message(text: &str, sender: &str) -> InboundMessage {
        InboundMessage::new(text, sender, datetime!(2025-01-12 10:30 UTC))
    }

    fn must_extract(text: &str, sender: &str) -> ExtractionResult {
        extractor()
            .extract(&message(text, sender))
            .expect("Expected a transaction")
    }

    fn assert_close(got: f64, want: f64) {
        assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
    }

    #[test]
    fn extracts_debit_with_merchant_and_category() {
        let result = must_extract("Rs.1,234.50 debited at Swiggy Bangalore on 12-01", "HDFCBK");

        assert_eq!(result.amount, Some(dec!(1234.50)));
        assert_eq!(result.direction, Some(Direction::Debit));
        assert_eq!(result.merchant.as_deref(), Some("swiggy bangalore"));
        assert_eq!(result.category, Some(Category::Food));
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn extracts_credit_without_merchant() {
        let result = must_extract("₹500 credited to your account", "ICICIBK");

        assert_eq!(result.amount, Some(dec!(500)));
        assert_eq!(result.direction, Some(Direction::Credit));
        assert_eq!(result.merchant, None);
        assert_eq!(result.category, None);
        assert_close(result.confidence, 1.0);
    }

    #[test]
    fn non_bank_sender_is_rejected_regardless_of_content() {
        let extractor = extractor();
        let texts = [
            "Rs.1,234.50 debited at Swiggy Bangalore on 12-01",
            "₹500 credited to your account",
            "hello",
        ];

        for text in texts {
            assert_eq!(extractor.extract(&message(text, "MOM")), None, "{text}");
            assert_eq!(extractor.extract(&message(text, "")), None, "{text}");
        }
    }

    #[test]
    fn bank_message_without_amount_is_rejected() {
        let extractor = extractor();
        let texts = [
            "Your OTP for login is 482913. Do not share it with anyone.",
            "Your account has been debited",
            "",
            "Rs. , debited",
        ];

        for text in texts {
            assert_eq!(extractor.extract(&message(text, "HDFCBK")), None, "{text}");
        }
    }

    #[test]
    fn zero_amount_is_not_a_transaction() {
        assert_eq!(
            extractor().extract(&message("Rs 0.00 debited at bank charges", "SBIIN")),
            None
        );
    }

    #[test]
    fn amount_before_marker_is_found() {
        let result = must_extract("2,500.00 INR withdrawn from ATM", "AXISBK");

        assert_eq!(result.amount, Some(dec!(2500.00)));
        assert_eq!(result.direction, Some(Direction::Debit));
    }

    #[test]
    fn first_amount_wins() {
        let result = must_extract(
            "Rs 500 debited from A/c XX1234. Avl Bal Rs 10,000.00",
            "HDFCBK",
        );

        assert_eq!(result.amount, Some(dec!(500)));
    }

    #[test]
    fn marker_is_case_insensitive() {
        let result = must_extract("INR 99 spent on your card", "KOTAKBK");

        assert_eq!(result.amount, Some(dec!(99)));
        assert_eq!(
            must_extract("inr 99 spent", "KOTAKBK").amount,
            Some(dec!(99))
        );
    }

    #[test]
    fn extracts_account_hint_and_skips_masked_account_as_merchant() {
        let result = must_extract(
            "Rs 250 debited from A/c XX1234 to Zomato on 01-02",
            "HDFCBK",
        );

        assert_eq!(result.account_hint.as_deref(), Some("1234"));
        assert_eq!(result.merchant.as_deref(), Some("zomato"));
        assert_eq!(result.category, Some(Category::Food));
    }

    #[test]
    fn account_hint_does_not_affect_confidence() {
        let with_hint = must_extract("Rs 75 received in card 4321", "YESBNK");
        let without_hint = must_extract("Rs 75 received", "YESBNK");

        assert_eq!(with_hint.account_hint.as_deref(), Some("4321"));
        assert_eq!(without_hint.account_hint, None);
        assert_close(with_hint.confidence, without_hint.confidence);
    }

    #[test]
    fn debit_wins_when_both_directions_appear() {
        let result = must_extract(
            "Refund of Rs 100 credited after debit reversal",
            "HDFCBK",
        );

        assert_eq!(result.direction, Some(Direction::Debit));
    }

    #[test]
    fn missing_direction_scores_lower() {
        let result = must_extract("Txn of Rs 300 at Uber on 05-03", "HDFCBK");

        assert_eq!(result.direction, None);
        assert_eq!(result.merchant.as_deref(), Some("uber"));
        assert_eq!(result.category, Some(Category::Transportation));
        assert_close(result.confidence, 0.9);
    }

    #[test]
    fn amount_only_scores_point_eight() {
        let result = must_extract("Balance update Rs 300", "HDFCBK");

        assert_eq!(result.direction, None);
        assert_eq!(result.merchant, None);
        assert_close(result.confidence, 0.8);
    }

    #[test]
    fn merchant_without_category() {
        let result = must_extract("Rs 1,000 paid to John Doe on 02-02", "PNBSMS");

        assert_eq!(result.merchant.as_deref(), Some("john doe"));
        assert_eq!(result.category, None);
    }

    #[test]
    fn merchant_stops_at_punctuation() {
        let result = must_extract("Rs 450 spent at McDonald's Andheri.", "HDFCBK");

        assert_eq!(result.merchant.as_deref(), None);
        assert_eq!(result.category, None);
    }

    #[test]
    fn merchant_stops_at_masked_account() {
        let result = must_extract("Rs 500 paid to Ramesh XX1234", "HDFCBK");

        assert_eq!(result.merchant.as_deref(), Some("ramesh"));
    }

    #[test]
    fn merchant_stops_at_account_keyword() {
        let result = must_extract("Rs 80 sent to Ravi a/c 5678", "SBIIN");

        assert_eq!(result.merchant.as_deref(), Some("ravi"));
        assert_eq!(result.account_hint.as_deref(), Some("5678"));
    }

    #[test]
    fn merchant_stops_at_reference() {
        let result = must_extract("Rs 120 debited to Ramesh ref 99812", "HDFCBK");

        assert_eq!(result.merchant.as_deref(), Some("ramesh"));
    }

    #[test]
    fn merchant_stops_at_full_stop() {
        let result = must_extract("Rs 300 spent at DMart. Avl bal Rs 5,000", "ICICIBK");

        assert_eq!(result.merchant.as_deref(), Some("dmart"));
        assert_eq!(result.category, Some(Category::Groceries));
    }

    #[test]
    fn merchant_stops_at_comma() {
        let result = must_extract("INR 10 refund received from Amazon, ref 1234", "SBIIN");

        assert_eq!(result.merchant.as_deref(), Some("amazon"));
        assert_eq!(result.category, Some(Category::Shopping));
        assert_eq!(result.direction, Some(Direction::Credit));
    }

    #[test]
    fn merchant_runs_to_end_of_text() {
        let result = must_extract("Rs 99 spent at PVR Inox", "HDFCBK");

        assert_eq!(result.merchant.as_deref(), Some("pvr inox"));
        assert_eq!(result.category, Some(Category::Entertainment));
    }

    #[test]
    fn preposition_at_end_of_word_starts_merchant() {
        let result = must_extract("Rs 50 paid for auto rickshaw on 01-02", "HDFCBK");

        assert_eq!(result.merchant.as_deref(), Some("rickshaw"));
        assert_eq!(result.category, None);
        assert_close(result.confidence, 1.0);
    }

    #[test]
    fn amount_too_large_for_decimal_is_not_a_transaction() {
        let text = "Rs 12345678901234567890123456789012345 credited";

        assert_eq!(extractor().extract(&message(text, "HDFCBK")), None);
    }

    #[test]
    fn confidence_is_always_within_bounds() {
        let extractor = extractor();
        let texts = [
            "",
            "Rs 5",
            "Rs.1,234.50 debited at Swiggy Bangalore on 12-01",
            "₹500 credited to your account",
            "INR 10 refund received from Amazon, ref 1234",
            "debit credit at at to from Rs Rs Rs 1 2 3",
        ];

        for text in texts {
            let result = extractor.extract_fields(text);
            assert!(
                (0.0..=1.0).contains(&result.confidence),
                "{text}: {}",
                result.confidence
            );
        }
    }

    #[test]
    fn extraction_is_idempotent() {
        let extractor = extractor();
        let message = message("INR 10 refund received from Amazon, ref 1234", "SBIIN");

        let first = extractor.extract(&message);
        let second = extractor.extract(&message);

        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn sender_case_does_not_change_result() {
        let extractor = extractor();
        let text = "Rs 42 debited at Metro card recharge";

        assert_eq!(
            extractor.extract(&message(text, "hdfcbk")),
            extractor.extract(&message(text, "HDFCBK"))
        );
    }

    #[test]
    fn uses_injected_config() {
        let config = ExtractorConfig {
            bank_senders: vec!["KIWIBK".to_owned()],
            currency_markers: vec!["$".to_owned(), "nzd".to_owned()],
            ..Default::default()
        };
        let extractor = Extractor::new(config.clone()).expect("Could not build extractor");
        assert_eq!(extractor.config(), &config);

        let result = extractor
            .extract(&message("$25.00 spent at Countdown on 03-03", "KIWIBK"))
            .expect("Expected a transaction");

        assert_eq!(result.amount, Some(dec!(25.00)));
        assert_eq!(result.merchant.as_deref(), Some("countdown"));
        assert_eq!(
            extractor.extract(&message("Rs 25 spent", "HDFCBK")),
            None
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ExtractorConfig {
            bank_senders: Vec::new(),
            ..Default::default()
        };

        assert!(Extractor::new(config).is_err());
    }

    #[test]
    fn extractor_can_be_shared_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<Extractor>();
    }
}
