//! Extraction of bank transactions from SMS notifications, and storage of
//! the extracted candidates until they are reconciled.

mod category;
mod config;
mod db;
mod domain;
mod extract;
mod parse;
mod process;
mod score;
mod sender;
mod state;
mod unprocessed;

pub use category::{Category, CategoryRule, default_category_rules, infer_category};
pub use config::ExtractorConfig;
pub use db::{
    SmsTransaction, SmsTransactionId, create_sms_transaction, create_sms_transaction_table,
    get_sms_transaction, get_unprocessed_sms_transactions, mark_sms_transaction_processed,
};
pub use domain::{Direction, ExtractionResult, InboundMessage};
pub use extract::Extractor;
pub use parse::{ParseSmsRequest, ParseSmsResponse, parse_sms_endpoint};
pub use process::{ProcessSmsRequest, ProcessSmsResponse, process_sms_endpoint};
pub use score::{DEFAULT_BASE_CONFIDENCE, Evidence, ScoreRule, Signals, default_score_rules};
pub use sender::is_bank_sender;
pub use state::SmsState;
pub use unprocessed::{UnprocessedSmsResponse, get_unprocessed_sms_endpoint};
