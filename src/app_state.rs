//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error,
    db::initialize,
    sms::{Extractor, ExtractorConfig},
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The SMS extractor shared by all request handlers.
    pub extractor: Arc<Extractor>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection and the
    /// rule tables for SMS extraction.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized or `extractor_config` is invalid.
    pub fn new(db_connection: Connection, extractor_config: ExtractorConfig) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let extractor = Extractor::new(extractor_config)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            extractor: Arc::new(extractor),
        })
    }
}
