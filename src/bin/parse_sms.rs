use std::{error::Error, path::PathBuf, process::exit};

use clap::Parser;
use time::OffsetDateTime;

use sms_ledger::sms::{Extractor, ExtractorConfig, InboundMessage};

/// A utility for checking how the extraction rules handle an SMS.
///
/// Prints the extraction result as JSON, or a note if the message is not a
/// transaction. Nothing is written to the database.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The sender code of the SMS, e.g. "VM-HDFCBK".
    #[arg(long)]
    sender: String,

    /// The SMS text.
    #[arg(long)]
    message: String,

    /// File path to a JSON file that overrides the default extraction rules.
    #[arg(long)]
    rules: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let config = match &args.rules {
        Some(path) => ExtractorConfig::from_json_file(path)?,
        None => ExtractorConfig::default(),
    };
    let extractor = Extractor::new(config)?;

    let message = InboundMessage::new(&args.message, &args.sender, OffsetDateTime::now_utc());

    match extractor.extract(&message) {
        Some(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        None if !extractor.is_bank_sender(&args.sender) => {
            eprintln!("Not a transaction: {:?} is not a known bank sender.", args.sender);
            exit(2);
        }
        None => {
            eprintln!(
                "Not a transaction: no amount marked with any of {:?}.",
                extractor.config().currency_markers
            );
            exit(2);
        }
    }
}
