use chrono::NaiveDate;
use indexmap::{IndexMap, IndexSet};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::coerce::parse_date;

/// Account metadata taken from the statement's search-criteria block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
    pub account_number: Option<String>,
    pub full_name: Option<String>,
    pub currency: Option<String>,
    #[serde(default, with = "date_format")]
    pub transaction_from: Option<NaiveDate>,
    #[serde(default, with = "date_format")]
    pub transaction_to: Option<NaiveDate>,
}

impl TransactionInfo {
    /// Builds the info from parsed `name -> value` fields. Unknown keys are ignored.
    pub fn from_fields(fields: &IndexMap<String, String>) -> Self {
        let text = |key: &str| {
            fields
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            account_number: text("accountNumber"),
            full_name: text("fullName"),
            currency: text("currency"),
            transaction_from: fields.get("transactionFrom").and_then(|v| parse_date(v)),
            transaction_to: fields.get("transactionTo").and_then(|v| parse_date(v)),
        }
    }
}

/// One ledger row. Equality covers every field, so identical rows collapse in a set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub serial_number: Option<i64>,
    #[serde(default, with = "date_format")]
    pub value_date: Option<NaiveDate>,
    #[serde(default, with = "date_format")]
    pub transaction_date: Option<NaiveDate>,
    pub check_number: Option<String>,
    pub transaction_remarks: Option<String>,
    pub withdrawal_amount: Option<Decimal>,
    pub deposit_amount: Option<Decimal>,
    pub balance: Option<Decimal>,
    /// `|`-joined field coercion errors, if any.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatement {
    pub transaction_info: TransactionInfo,
    pub transaction_records: IndexSet<TransactionRecord>,
}

impl AccountStatement {
    pub fn new(transaction_info: TransactionInfo, transaction_records: IndexSet<TransactionRecord>) -> Self {
        Self {
            transaction_info,
            transaction_records,
        }
    }

    pub fn error_count(&self) -> usize {
        self.transaction_records
            .iter()
            .filter(|r| r.error.is_some())
            .count()
    }
}

/// Dates serialize as `yyyy-MM-dd`; reading also accepts legacy `dd/MM/yyyy`.
pub mod date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const ISO: &str = "%Y-%m-%d";
    const LEGACY: &str = "%d/%m/%Y";

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format(ISO).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, ISO)
                .or_else(|_| NaiveDate::parse_from_str(s, LEGACY))
                .map(Some)
                .map_err(|e| serde::de::Error::custom(format!("invalid date {s:?}: {e}"))),
        }
    }
}
