//! Database setup for the application.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{Error, sms::create_sms_transaction_table};

/// Create the tables for the domain models if they do not exist.
///
/// All tables are created in a single exclusive transaction, so a failure
/// leaves the database untouched.
///
/// # Errors
/// Returns an [Error::SqlError] if any table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_sms_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
