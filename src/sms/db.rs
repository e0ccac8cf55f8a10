//! Database operations for SMS transaction candidates.
//!
//! A candidate is stored unprocessed when an SMS is extracted. A separate
//! reconciliation step later links it to a confirmed transaction and marks it
//! processed.

use std::str::FromStr;

use rusqlite::{Connection, Row, types::Type};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    sms::{Category, Direction, ExtractionResult, InboundMessage},
    user::UserID,
};

/// Database identifier for a stored SMS transaction.
pub type SmsTransactionId = i64;

/// An extracted SMS stored for later reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsTransaction {
    /// The ID of the stored candidate.
    pub id: SmsTransactionId,
    /// The user whose phone received the SMS.
    pub user_id: UserID,
    /// The SMS text exactly as received.
    pub raw_sms: String,
    /// The sender ID the SMS arrived from, e.g. "VM-HDFCBK".
    pub sender: String,
    /// When the phone received the SMS, in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub received_at: OffsetDateTime,
    /// The transaction amount. Always greater than zero.
    pub amount: Decimal,
    /// Whether money left or entered the account, if the text says.
    pub direction: Option<Direction>,
    /// The merchant or counterparty, lower-case.
    pub merchant: Option<String>,
    /// The category guessed from the merchant.
    pub category: Option<Category>,
    /// The last four digits of the account or card.
    pub account_hint: Option<String>,
    /// How likely the SMS is a genuine transaction, in `[0, 1]`.
    pub confidence: f64,
    /// Whether the candidate has been turned into a confirmed transaction.
    pub is_processed: bool,
    /// The confirmed transaction, set once processed.
    pub transaction_id: Option<i64>,
}

const COLUMNS: &str = "id, user_id, raw_sms, sender, received_at, amount, direction, merchant, \
    category, account_hint, confidence, is_processed, transaction_id";

/// Store an extraction result as an unprocessed candidate.
///
/// `received_at` is stored in UTC.
///
/// # Errors
/// Returns [Error::MissingAmount] if `result` has no amount, since such a
/// result is not a transaction, or an SQL error.
pub fn create_sms_transaction(
    user_id: UserID,
    message: &InboundMessage,
    result: &ExtractionResult,
    connection: &Connection,
) -> Result<SmsTransaction, Error> {
    let amount = result.amount.ok_or(Error::MissingAmount)?;
    let received_at = message.received_at.to_offset(UtcOffset::UTC);

    connection.execute(
        "INSERT INTO sms_transaction (
            user_id, raw_sms, sender, received_at, amount, direction, merchant, category,
            account_hint, confidence, is_processed
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0);",
        (
            user_id.as_i64(),
            &message.text,
            &message.sender_id,
            received_at,
            amount.to_string(),
            result.direction.map(|direction| direction.as_str()),
            result.merchant.as_deref(),
            result.category.map(|category| category.as_str()),
            result.account_hint.as_deref(),
            result.confidence,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(SmsTransaction {
        id,
        user_id,
        raw_sms: message.text.clone(),
        sender: message.sender_id.clone(),
        received_at,
        amount,
        direction: result.direction,
        merchant: result.merchant.clone(),
        category: result.category,
        account_hint: result.account_hint.clone(),
        confidence: result.confidence,
        is_processed: false,
        transaction_id: None,
    })
}

/// Retrieve a single SMS transaction by ID.
pub fn get_sms_transaction(
    id: SmsTransactionId,
    connection: &Connection,
) -> Result<SmsTransaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {COLUMNS} FROM sms_transaction WHERE id = :id;"
        ))?
        .query_row(&[(":id", &id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve a user's unprocessed SMS transactions, most recently received first.
pub fn get_unprocessed_sms_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<SmsTransaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {COLUMNS} FROM sms_transaction
            WHERE user_id = :user_id AND is_processed = 0
            ORDER BY received_at DESC, id DESC;"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_sms| maybe_sms.map_err(|error| error.into()))
        .collect()
}

/// Link an SMS transaction to a confirmed transaction and mark it processed.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not exist, or
/// [Error::AlreadyProcessed] if it was processed before.
pub fn mark_sms_transaction_processed(
    id: SmsTransactionId,
    transaction_id: i64,
    connection: &Connection,
) -> Result<SmsTransaction, Error> {
    let rows_affected = connection.execute(
        "UPDATE sms_transaction SET is_processed = 1, transaction_id = ?2
        WHERE id = ?1 AND is_processed = 0",
        (id, transaction_id),
    )?;

    if rows_affected == 0 {
        // Distinguish a missing row from one that was already processed.
        get_sms_transaction(id, connection)?;
        return Err(Error::AlreadyProcessed(id));
    }

    get_sms_transaction(id, connection)
}

/// Initialize the SMS transaction table and indexes.
pub fn create_sms_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS sms_transaction (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            raw_sms TEXT NOT NULL,
            sender TEXT NOT NULL,
            received_at TEXT NOT NULL,
            amount TEXT NOT NULL,
            direction TEXT,
            merchant TEXT,
            category TEXT,
            account_hint TEXT,
            confidence REAL NOT NULL,
            is_processed INTEGER NOT NULL DEFAULT 0,
            transaction_id INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_sms_transaction_user_processed
            ON sms_transaction(user_id, is_processed);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<SmsTransaction, rusqlite::Error> {
    let raw_amount: String = row.get(5)?;
    let amount = Decimal::from_str(&raw_amount)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(error)))?;

    let direction = row
        .get::<_, Option<String>>(6)?
        .map(|raw| Direction::try_from(raw.as_str()))
        .transpose()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(error)))?;

    let category = row
        .get::<_, Option<String>>(8)?
        .map(|raw| Category::try_from(raw.as_str()))
        .transpose()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(error)))?;

    Ok(SmsTransaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        raw_sms: row.get(2)?,
        sender: row.get(3)?,
        received_at: row.get(4)?,
        amount,
        direction,
        merchant: row.get(7)?,
        category,
        account_hint: row.get(9)?,
        confidence: row.get(10)?,
        is_processed: row.get(11)?,
        transaction_id: row.get(12)?,
    })
}
