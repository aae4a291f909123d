use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::config::DataType;
use crate::error::CoercionError;
use crate::models::TransactionRecord;

/// Reserved key the merged row uses for its concatenated field errors.
pub const ERROR_KEY: &str = "error";

const ERROR_SEPARATOR: char = '|';

// Date layouts tried in order. The shape check pins the year to four digits.
static DATE_FORMATS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"^\d{2}/\d{2}/\d{4}$", "%d/%m/%Y"),
        (r"^\d{2}-\d{2}-\d{4}$", "%d-%m-%Y"),
        (r"^\d{4}-\d{2}-\d{2}$", "%Y-%m-%d"),
        (r"^\d{1,2}/\d{1,2}/\d{4}$", "%d/%m/%Y"),
    ]
    .iter()
    .filter_map(|(shape, fmt)| Regex::new(shape).ok().map(|re| (re, *fmt)))
    .collect()
});

static CURRENCY_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)INR|RS|CR|DR").expect("Failed to compile CURRENCY_TOKENS"));

// ---------------------------------------------------------------------------
// Scalar parsers
// ---------------------------------------------------------------------------

pub fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .filter(|(shape, _)| shape.is_match(raw))
        .find_map(|(_, fmt)| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Bank-formatted amount to a fixed-point decimal.
///
/// Drops `₹` and the `INR`/`RS`/`CR`/`DR` markers, reads `(…)` as negative and
/// ignores thousands separators. Blank input is zero.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let s = raw.trim().replace('\u{20B9}', "");
    let s = CURRENCY_TOKENS.replace_all(&s, "");
    let mut s = s.trim();
    let mut negative = false;
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        negative = true;
        s = inner;
    }
    let cleaned: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Some(Decimal::ZERO);
    }
    let value = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()?;
    Some(if negative { -value } else { value })
}

// ---------------------------------------------------------------------------
// Typed field values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Int(i64),
    Date(NaiveDate),
    Decimal(Decimal),
    /// Verbatim text: string columns, and raw text kept after a failed coercion.
    Text(String),
}

impl FieldValue {
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(d) => Some(*d),
            Self::Int(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Result of coercing one cell: the value, plus the failure if the raw text was kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    pub value: FieldValue,
    pub error: Option<CoercionError>,
}

impl Coerced {
    fn ok(value: FieldValue) -> Self {
        Self { value, error: None }
    }

    fn failed(raw: &str, error: CoercionError) -> Self {
        Self {
            value: FieldValue::Text(raw.to_string()),
            error: Some(error),
        }
    }
}

pub fn coerce(raw: &str, data_type: DataType) -> Coerced {
    match data_type {
        DataType::Int => match parse_int(raw) {
            Some(i) => Coerced::ok(FieldValue::Int(i)),
            None => Coerced::failed(raw, CoercionError::Int(raw.to_string())),
        },
        DataType::Date => match parse_date(raw) {
            Some(d) => Coerced::ok(FieldValue::Date(d)),
            None => Coerced::failed(raw, CoercionError::Date(raw.to_string())),
        },
        DataType::Decimal => match parse_decimal(raw) {
            Some(d) => Coerced::ok(FieldValue::Decimal(d)),
            None => Coerced::failed(raw, CoercionError::Decimal(raw.to_string())),
        },
        DataType::Text => Coerced::ok(FieldValue::Text(raw.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Per-row merge
// ---------------------------------------------------------------------------

/// One table row folded from its columns: first value per key wins, errors
/// accumulate as a `|`-joined string in column order.
#[derive(Debug, Clone, Default)]
pub struct RowFields {
    values: IndexMap<String, FieldValue>,
    error: Option<String>,
}

impl RowFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, key: &str, coerced: Coerced) {
        if let Some(err) = coerced.error {
            let msg = err.to_string();
            match &mut self.error {
                Some(existing) => {
                    existing.push(ERROR_SEPARATOR);
                    existing.push_str(&msg);
                }
                None => self.error = Some(msg),
            }
        }
        if key != ERROR_KEY {
            self.values.entry(key.to_string()).or_insert(coerced.value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn error_segments(&self) -> usize {
        self.error
            .as_deref()
            .map_or(0, |e| e.split(ERROR_SEPARATOR).count())
    }

    /// How many of `keys` hold a non-blank value.
    pub fn non_blank_count<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> usize {
        keys.into_iter()
            .filter(|k| self.values.get(*k).is_some_and(|v| !v.is_blank()))
            .count()
    }

    pub fn into_record(self) -> TransactionRecord {
        let text = |key: &str| {
            self.values
                .get(key)
                .map(FieldValue::to_string)
                .filter(|s| !s.trim().is_empty())
        };
        TransactionRecord {
            serial_number: self.get("serialNumber").and_then(FieldValue::as_int),
            value_date: self.get("valueDate").and_then(FieldValue::as_date),
            transaction_date: self.get("transactionDate").and_then(FieldValue::as_date),
            check_number: text("checkNumber"),
            transaction_remarks: text("transactionRemarks"),
            withdrawal_amount: self.get("withdrawalAmount").and_then(FieldValue::as_decimal),
            deposit_amount: self.get("depositAmount").and_then(FieldValue::as_decimal),
            balance: self.get("balance").and_then(FieldValue::as_decimal),
            error: self.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_decimal_strips_currency_markers() {
        let clean = parse_decimal("1234.50").unwrap();
        assert_eq!(parse_decimal("\u{20B9}1,234.50"), Some(clean));
        assert_eq!(parse_decimal("INR 1,234.50"), Some(clean));
        assert_eq!(parse_decimal("1,234.50 Cr"), Some(clean));
        assert_eq!(parse_decimal("1,234.50 DR"), Some(clean));
        assert!(parse_decimal("Rs. 1,234.50").is_none());
        assert_eq!(parse_decimal("Rs 1,234.50"), Some(clean));
    }

    #[test]
    fn test_decimal_parentheses_negate() {
        assert_eq!(parse_decimal("(500.00)"), Some(dec("-500.00")));
        assert_eq!(parse_decimal("(1,234.56)"), Some(dec("-1234.56")));
    }

    #[test]
    fn test_decimal_blank_is_zero() {
        assert_eq!(parse_decimal(""), Some(Decimal::ZERO));
        assert_eq!(parse_decimal("   "), Some(Decimal::ZERO));
        assert_eq!(parse_decimal("\u{20B9}"), Some(Decimal::ZERO));
        let c = coerce("", DataType::Decimal);
        assert!(c.error.is_none());
        assert_eq!(c.value, FieldValue::Decimal(Decimal::ZERO));
    }

    #[test]
    fn test_decimal_failure_keeps_raw_text() {
        let c = coerce("n/a", DataType::Decimal);
        assert_eq!(c.value, FieldValue::Text("n/a".into()));
        assert_eq!(c.error, Some(CoercionError::Decimal("n/a".into())));
    }

    #[test]
    fn test_decimal_is_fixed_point() {
        let total = parse_decimal("0.1").unwrap() + parse_decimal("0.2").unwrap();
        assert_eq!(total, dec("0.3"));
        assert_eq!(Decimal::from_f64(0.5), parse_decimal("0.50"));
    }

    #[test]
    fn test_date_formats_in_order() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(parse_date("05/03/2024"), Some(expected));
        assert_eq!(parse_date("05-03-2024"), Some(expected));
        assert_eq!(parse_date("2024-03-05"), Some(expected));
        assert_eq!(parse_date("5/3/2024"), Some(expected));
    }

    #[test]
    fn test_date_two_digit_year_fails() {
        let c = coerce("05/03/24", DataType::Date);
        assert_eq!(c.value, FieldValue::Text("05/03/24".into()));
        assert_eq!(
            c.error.unwrap().to_string(),
            "Error parsing 05/03/24 as date value."
        );
        assert!(parse_date("31/02/2024").is_none());
    }

    #[test]
    fn test_int_coercion() {
        assert_eq!(coerce("42", DataType::Int).value, FieldValue::Int(42));
        let c = coerce("4a", DataType::Int);
        assert_eq!(c.value, FieldValue::Text("4a".into()));
        assert_eq!(
            c.error.unwrap().to_string(),
            "Error parsing 4a as integer value."
        );
    }

    #[test]
    fn test_string_passes_through() {
        let c = coerce("  UPI/1234 ", DataType::Text);
        assert_eq!(c.value, FieldValue::Text("  UPI/1234 ".into()));
        assert!(c.error.is_none());
    }

    #[test]
    fn test_merge_first_value_wins_and_errors_concatenate() {
        let mut row = RowFields::new();
        row.merge("balance", coerce("100", DataType::Decimal));
        row.merge("balance", coerce("200", DataType::Decimal));
        row.merge("serialNumber", coerce("x", DataType::Int));
        row.merge("valueDate", coerce("bad", DataType::Date));
        assert_eq!(row.get("balance"), Some(&FieldValue::Decimal(dec("100"))));
        assert_eq!(
            row.error(),
            Some("Error parsing x as integer value.|Error parsing bad as date value.")
        );
        assert_eq!(row.error_segments(), 2);
    }

    #[test]
    fn test_non_blank_count() {
        let mut row = RowFields::new();
        row.merge("a", coerce("", DataType::Text));
        row.merge("b", coerce("", DataType::Decimal));
        row.merge("c", coerce("x", DataType::Text));
        assert_eq!(row.non_blank_count(["a", "b", "c", "missing"]), 2);
    }

    #[test]
    fn test_into_record_drops_failed_typed_fields() {
        let mut row = RowFields::new();
        row.merge("serialNumber", coerce("7", DataType::Int));
        row.merge("valueDate", coerce("05/03/24", DataType::Date));
        row.merge("transactionDate", coerce("05/03/2024", DataType::Date));
        row.merge("checkNumber", coerce("", DataType::Text));
        row.merge("transactionRemarks", coerce("NEFT-ACME", DataType::Text));
        row.merge("withdrawalAmount", coerce("", DataType::Decimal));
        row.merge("depositAmount", coerce("1,000.00", DataType::Decimal));
        row.merge("balance", coerce("5,000.00", DataType::Decimal));
        let record = row.into_record();
        assert_eq!(record.serial_number, Some(7));
        assert_eq!(record.value_date, None);
        assert_eq!(record.transaction_date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(record.check_number, None);
        assert_eq!(record.transaction_remarks.as_deref(), Some("NEFT-ACME"));
        assert_eq!(record.withdrawal_amount, Some(Decimal::ZERO));
        assert_eq!(record.deposit_amount, Some(dec("1000.00")));
        assert_eq!(record.error.as_deref(), Some("Error parsing 05/03/24 as date value."));
    }
}
