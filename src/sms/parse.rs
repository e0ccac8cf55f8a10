//! The endpoint that parses an SMS forwarded by the mobile client.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    Error,
    sms::{InboundMessage, SmsState, SmsTransaction, create_sms_transaction},
    user::UserID,
};

/// The request body for parsing an SMS.
///
/// All three fields are required. An empty `message` or `sender` is valid
/// and simply classifies as "not a transaction".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseSmsRequest {
    /// The SMS text.
    pub message: String,
    /// The sender ID the SMS arrived from.
    pub sender: String,
    /// When the phone received the SMS, as an RFC 3339 date-time.
    pub timestamp: String,
}

impl ParseSmsRequest {
    /// Convert the request into an [InboundMessage].
    ///
    /// # Errors
    /// Returns [Error::InvalidSms] if the timestamp is not RFC 3339.
    pub fn into_message(self) -> Result<InboundMessage, Error> {
        let received_at = OffsetDateTime::parse(&self.timestamp, &Rfc3339).map_err(|error| {
            Error::InvalidSms(format!(
                "timestamp \"{}\" is not an RFC 3339 date-time: {error}",
                self.timestamp
            ))
        })?;

        Ok(InboundMessage {
            text: self.message,
            sender_id: self.sender,
            received_at,
        })
    }
}

/// The response body for a parsed SMS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseSmsResponse {
    /// The stored candidate, or `null` if the SMS is not a transaction.
    pub parsed: Option<SmsTransaction>,
    /// A short description of the outcome.
    pub message: String,
}

/// Parse an SMS and store it as an unprocessed candidate if it is a bank
/// transaction.
///
/// A message that is not a transaction is a normal outcome and returns 200
/// with `parsed: null`. Only malformed requests are errors.
pub async fn parse_sms_endpoint(
    State(state): State<SmsState>,
    user_id: Result<Path<i64>, PathRejection>,
    request: Result<Json<ParseSmsRequest>, JsonRejection>,
) -> Response {
    let Path(user_id) = match user_id {
        Ok(user_id) => user_id,
        Err(rejection) => return Error::InvalidSms(rejection.body_text()).into_response(),
    };

    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return Error::InvalidSms(rejection.body_text()).into_response(),
    };

    let message = match request.into_message() {
        Ok(message) => message,
        Err(error) => return error.into_response(),
    };

    let result = match state.extractor.extract(&message) {
        Some(result) => result,
        None => {
            return Json(ParseSmsResponse {
                parsed: None,
                message: "SMS is not a transaction message".to_owned(),
            })
            .into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_sms_transaction(UserID::new(user_id), &message, &result, &connection) {
        Ok(sms) => {
            tracing::info!(
                "Stored SMS transaction {} for user {} with confidence {:.2}",
                sms.id,
                sms.user_id,
                sms.confidence
            );

            Json(ParseSmsResponse {
                parsed: Some(sms),
                message: "SMS parsed successfully".to_owned(),
            })
            .into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while storing an SMS transaction: {error}");

            error.into_response()
        }
    }
}
