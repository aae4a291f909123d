pub mod coerce;
pub mod config;
pub mod error;
pub mod fields;
pub mod fmt;
pub mod grid;
pub mod locator;
pub mod logging;
pub mod models;
pub mod parser;
pub mod settings;
pub mod table;
pub mod workbook;

pub use config::{StatementConfig, StatementType};
pub use error::{Result, StatementError};
pub use models::{AccountStatement, TransactionInfo, TransactionRecord};
pub use parser::{extract_file, parse_file, StatementParser};
