use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatementError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported statement type: {0}")]
    UnsupportedStatementType(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("No transactions found: {0}")]
    NoTransactionsFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, StatementError>;

/// A single cell that could not be coerced to its configured type.
///
/// Never aborts a parse: the message is folded into the record's `error`
/// string and the raw text is kept as the field value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoercionError {
    #[error("Error parsing {0} as integer value.")]
    Int(String),

    #[error("Error parsing {0} as date value.")]
    Date(String),

    #[error("Error parsing {0} as decimal value.")]
    Decimal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coercion_messages_carry_raw_text() {
        assert_eq!(
            CoercionError::Int("12a".into()).to_string(),
            "Error parsing 12a as integer value."
        );
        assert_eq!(
            CoercionError::Date("05/03/24".into()).to_string(),
            "Error parsing 05/03/24 as date value."
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StatementError = io.into();
        assert!(err.to_string().starts_with("IO error:"));
    }
}
