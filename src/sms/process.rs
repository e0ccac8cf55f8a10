//! Marks an SMS transaction as reconciled with a confirmed transaction.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    sms::{SmsState, SmsTransaction, SmsTransactionId, mark_sms_transaction_processed},
};

/// The request body for marking an SMS transaction as processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessSmsRequest {
    /// The confirmed transaction created from the SMS.
    pub transaction_id: i64,
}

/// The response body for a processed SMS transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSmsResponse {
    /// The SMS transaction after it was marked processed.
    pub sms_transaction: SmsTransaction,
}

/// Link an SMS transaction to the transaction created from it.
pub async fn process_sms_endpoint(
    State(state): State<SmsState>,
    sms_id: Result<Path<SmsTransactionId>, PathRejection>,
    request: Result<Json<ProcessSmsRequest>, JsonRejection>,
) -> Response {
    let Path(sms_id) = match sms_id {
        Ok(sms_id) => sms_id,
        Err(rejection) => return Error::InvalidSms(rejection.body_text()).into_response(),
    };

    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return Error::InvalidSms(rejection.body_text()).into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match mark_sms_transaction_processed(sms_id, request.transaction_id, &connection) {
        Ok(sms_transaction) => {
            tracing::info!(
                "SMS transaction {sms_id} processed into transaction {}",
                request.transaction_id
            );

            Json(ProcessSmsResponse { sms_transaction }).into_response()
        }
        Err(error) => {
            tracing::warn!("Could not process SMS transaction {sms_id}: {error}");

            error.into_response()
        }
    }
}

#[cfg(test)]
mod process_sms_endpoint_tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};
    use time::macros::datetime;

    use crate::{
        endpoints::{self, format_endpoint},
        sms::{
            ExtractionResult, InboundMessage, SmsState, SmsTransaction, create_sms_transaction,
            process::ProcessSmsResponse, process_sms_endpoint, state::test_sms_state,
        },
        user::UserID,
    };

    fn state_with_sms() -> (SmsState, SmsTransaction) {
        let state = test_sms_state();
        let sms = {
            let connection = state.db_connection.lock().unwrap();
            create_sms_transaction(
                UserID::new(1),
                &InboundMessage::new("Rs 10 spent", "HDFCBK", datetime!(2025-01-12 10:30 UTC)),
                &ExtractionResult {
                    amount: Some(dec!(10)),
                    direction: None,
                    merchant: None,
                    category: None,
                    account_hint: None,
                    confidence: 0.8,
                },
                &connection,
            )
            .unwrap()
        };

        (state, sms)
    }

    fn get_test_server(state: SmsState) -> TestServer {
        let app = Router::new()
            .route(endpoints::PROCESS_SMS, post(process_sms_endpoint))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn marks_sms_processed() {
        let (state, sms) = state_with_sms();
        let server = get_test_server(state);

        let response = server
            .post(&format_endpoint(endpoints::PROCESS_SMS, sms.id))
            .json(&json!({ "transaction_id": 99 }))
            .await;

        response.assert_status_ok();
        let body: ProcessSmsResponse = response.json();
        assert!(body.sms_transaction.is_processed);
        assert_eq!(body.sms_transaction.transaction_id, Some(99));
    }

    #[tokio::test]
    async fn processing_twice_is_a_conflict() {
        let (state, sms) = state_with_sms();
        let server = get_test_server(state);
        let path = format_endpoint(endpoints::PROCESS_SMS, sms.id);

        server
            .post(&path)
            .json(&json!({ "transaction_id": 99 }))
            .await
            .assert_status_ok();
        let response = server
            .post(&path)
            .json(&json!({ "transaction_id": 100 }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "ALREADY_PROCESSED");
    }

    #[tokio::test]
    async fn missing_sms_is_not_found() {
        let server = get_test_server(test_sms_state());

        let response = server
            .post(&format_endpoint(endpoints::PROCESS_SMS, 12345))
            .json(&json!({ "transaction_id": 1 }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_transaction_id_is_a_validation_error() {
        let (state, sms) = state_with_sms();
        let server = get_test_server(state);

        let response = server
            .post(&format_endpoint(endpoints::PROCESS_SMS, sms.id))
            .json(&json!({}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
