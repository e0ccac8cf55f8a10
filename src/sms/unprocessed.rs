//! Lists SMS transactions waiting to be reconciled.

use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    sms::{SmsState, SmsTransaction, get_unprocessed_sms_transactions},
    user::UserID,
};

/// The response body for a user's unprocessed SMS transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnprocessedSmsResponse {
    /// The unprocessed SMS transactions, newest first.
    pub sms_transactions: Vec<SmsTransaction>,
    /// The number of entries in `sms_transactions`.
    pub total: usize,
}

/// Return a user's unprocessed SMS transactions, newest first.
pub async fn get_unprocessed_sms_endpoint(
    State(state): State<SmsState>,
    user_id: Result<Path<i64>, PathRejection>,
) -> Response {
    let Path(user_id) = match user_id {
        Ok(user_id) => user_id,
        Err(rejection) => return Error::InvalidSms(rejection.body_text()).into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_unprocessed_sms_transactions(UserID::new(user_id), &connection) {
        Ok(sms_transactions) => Json(UnprocessedSmsResponse {
            total: sms_transactions.len(),
            sms_transactions,
        })
        .into_response(),
        Err(error) => {
            tracing::error!("Could not get unprocessed SMS transactions: {error}");

            error.into_response()
        }
    }
}
