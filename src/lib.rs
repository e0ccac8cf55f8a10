//! SMS Ledger turns bank SMS notifications into candidate transactions.
//!
//! The mobile client forwards each SMS it receives. The server decides
//! whether the message came from a bank, extracts the amount, direction,
//! merchant and a category guess, and stores the result until a
//! reconciliation step turns it into a confirmed transaction.
//!
//! This library provides the extractor and a JSON REST API around it.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod db;
pub mod endpoints;
mod logging;
mod not_found;
mod routing;
pub mod sms;
pub mod user;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;

use crate::sms::SmsTransactionId;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
///
/// An SMS that is not a transaction is not an error; see
/// [sms::Extractor::extract].
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request to parse an SMS was malformed, e.g. a required field is
    /// missing or the timestamp is not RFC 3339.
    #[error("invalid SMS request: {0}")]
    InvalidSms(String),

    /// The extractor's rule tables could not be loaded or are unusable.
    #[error("invalid extractor config: {0}")]
    InvalidConfig(String),

    /// Tried to store an extraction result that has no amount.
    ///
    /// A result without an amount is not a transaction and must be discarded.
    #[error("cannot store an SMS transaction without an amount")]
    MissingAmount,

    /// A stored direction string did not match a known direction.
    #[error("unknown transaction direction \"{0}\"")]
    InvalidDirection(String),

    /// A stored category string did not match a known category.
    #[error("unknown category \"{0}\"")]
    InvalidCategory(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The SMS transaction has already been linked to a transaction.
    #[error("SMS transaction {0} has already been processed")]
    AlreadyProcessed(SmsTransactionId),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Error::InvalidSms(_) | Error::MissingAmount => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            Error::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Error::AlreadyProcessed(_) => (StatusCode::CONFLICT, "ALREADY_PROCESSED"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Any errors that are not handled above are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (
            status,
            Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                }
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod error_response_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::Error;

    async fn body_json(error: Error) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_error_is_bad_request_with_details() {
        let (status, body) = body_json(Error::InvalidSms("missing field `message`".to_owned())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(
            body["error"]["message"]
                .as_str()
                .unwrap()
                .contains("missing field")
        );
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, body) = body_json(Error::InvalidCategory("SNACKS".to_owned())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["error"]["message"].as_str().unwrap().contains("SNACKS"));
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }
}
