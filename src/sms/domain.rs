//! Core SMS domain types.

use std::fmt::Display;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, sms::Category};

/// A raw text message as forwarded by the mobile client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// The body of the text message.
    pub text: String,
    /// The short code of the sender, e.g. "VM-HDFCBK".
    pub sender_id: String,
    /// When the phone received the message.
    #[serde(with = "time::serde::rfc3339")]
    pub received_at: OffsetDateTime,
}

impl InboundMessage {
    /// Create a new inbound message.
    pub fn new(text: &str, sender_id: &str, received_at: OffsetDateTime) -> Self {
        Self {
            text: text.to_owned(),
            sender_id: sender_id.to_owned(),
            received_at,
        }
    }
}

/// Whether money left the account or entered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Money left the account.
    Debit,
    /// Money entered the account.
    Credit,
}

impl Direction {
    /// The string used when the direction is stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Debit => "DEBIT",
            Direction::Credit => "CREDIT",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Direction {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "DEBIT" => Ok(Direction::Debit),
            "CREDIT" => Ok(Direction::Credit),
            other => Err(Error::InvalidDirection(other.to_owned())),
        }
    }
}

/// The fields pulled out of a bank SMS.
///
/// The extractor only ever hands out results that have an amount. A result
/// without one means "not a transaction" and must never be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// The transaction amount in the account currency.
    pub amount: Option<Decimal>,
    /// Whether the transaction was a debit or a credit.
    pub direction: Option<Direction>,
    /// The text following "at", "to" or "from", if any.
    pub merchant: Option<String>,
    /// A category guessed from the merchant.
    pub category: Option<Category>,
    /// The last four digits of the account or card, if mentioned.
    pub account_hint: Option<String>,
    /// Ordinal confidence in `[0, 1]`. Not a probability.
    pub confidence: f64,
}

impl ExtractionResult {
    /// Whether the result describes a transaction, i.e. an amount was found.
    pub fn is_transaction(&self) -> bool {
        self.amount.is_some()
    }
}
