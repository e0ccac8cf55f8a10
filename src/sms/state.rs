use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{AppState, sms::Extractor};

/// Unified state for all SMS-related endpoints.
#[derive(Debug, Clone)]
pub struct SmsState {
    /// The database connection for storing SMS transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The extractor shared by all requests.
    pub extractor: Arc<Extractor>,
}

impl FromRef<AppState> for SmsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            extractor: state.extractor.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_sms_state() -> SmsState {
    use crate::{db::initialize, sms::ExtractorConfig};

    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    SmsState {
        db_connection: Arc::new(Mutex::new(connection)),
        extractor: Arc::new(
            Extractor::new(ExtractorConfig::default()).expect("Could not build extractor"),
        ),
    }
}
