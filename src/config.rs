use std::fmt;
use std::path::Path;
use std::str::FromStr;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatementError};

/// Configuration shipped with the binary and written out by `stmtx init`.
pub const BUNDLED_EXCEL_CONFIG: &str = include_str!("../config/excelStatementConfig.json");

// ---------------------------------------------------------------------------
// Statement types — enum dispatch, resolved from a key
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFamily {
    Excel,
}

impl FileFamily {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Excel => "excel",
        }
    }

    pub fn extensions(&self) -> &[&'static str] {
        match self {
            Self::Excel => &["xls", "xlsx"],
        }
    }

    pub fn config_file_name(&self) -> String {
        format!("{}StatementConfig.json", self.type_name())
    }

    pub fn bundled_config(&self) -> &'static str {
        match self {
            Self::Excel => BUNDLED_EXCEL_CONFIG,
        }
    }

    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions().iter().any(|x| x.eq_ignore_ascii_case(ext)))
    }
}

pub const ALL_FILE_FAMILIES: &[FileFamily] = &[FileFamily::Excel];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementType {
    #[default]
    IciciBankSearchStatement,
}

impl StatementType {
    pub fn key(&self) -> &'static str {
        match self {
            Self::IciciBankSearchStatement => "icici_search",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::IciciBankSearchStatement => "ICICI Bank search statement",
        }
    }

    /// Top-level key of this statement's block inside the configuration file.
    pub fn config_root(&self) -> &'static str {
        match self {
            Self::IciciBankSearchStatement => "iciciBankSearchStatementConfig",
        }
    }

    pub fn file_family(&self) -> FileFamily {
        match self {
            Self::IciciBankSearchStatement => FileFamily::Excel,
        }
    }
}

pub const ALL_STATEMENT_TYPES: &[StatementType] = &[StatementType::IciciBankSearchStatement];

pub fn get_by_key(key: &str) -> Option<StatementType> {
    ALL_STATEMENT_TYPES.iter().find(|t| t.key() == key).copied()
}

impl FromStr for StatementType {
    type Err = StatementError;

    fn from_str(s: &str) -> Result<Self> {
        get_by_key(s).ok_or_else(|| StatementError::UnsupportedStatementType(s.to_string()))
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Section model
// ---------------------------------------------------------------------------

/// Behavior of a section, resolved from its `id`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum SectionKind {
    Header,
    SearchCriteria,
    AdvanceSearch,
    TransactionsTable,
    Unknown(String),
}

impl SectionKind {
    pub fn id(&self) -> &str {
        match self {
            Self::Header => "header",
            Self::SearchCriteria => "search_criteria",
            Self::AdvanceSearch => "advance_search",
            Self::TransactionsTable => "transactions_table",
            Self::Unknown(id) => id,
        }
    }
}

impl From<String> for SectionKind {
    fn from(id: String) -> Self {
        match id.as_str() {
            "header" => Self::Header,
            "search_criteria" => Self::SearchCriteria,
            "advance_search" => Self::AdvanceSearch,
            "transactions_table" => Self::TransactionsTable,
            _ => Self::Unknown(id),
        }
    }
}

/// Maximum offsets from the cursor a search may reach. `{0, 0}` is the cursor cell only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SearchRange {
    pub rows: usize,
    pub columns: usize,
}

/// A field pattern, anchored so it has to match the whole value.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct FieldPattern {
    source: String,
    regex: Regex,
    named_groups: Vec<String>,
}

impl FieldPattern {
    pub fn new(source: &str) -> std::result::Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        let named_groups = regex.capture_names().flatten().map(str::to_string).collect();
        Ok(Self {
            source: source.to_string(),
            regex,
            named_groups,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn named_groups(&self) -> &[String] {
        &self.named_groups
    }

    pub fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.regex.captures(text)
    }
}

impl TryFrom<String> for FieldPattern {
    type Error = String;

    fn try_from(source: String) -> std::result::Result<Self, Self::Error> {
        FieldPattern::new(&source).map_err(|e| format!("invalid pattern {source:?}: {e}"))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub pattern: Option<FieldPattern>,
    #[serde(default)]
    pub pattern_mapped_fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "int", alias = "Integer")]
    Int,
    #[serde(rename = "date", alias = "LocalDate")]
    Date,
    #[serde(rename = "decimal", alias = "BigDecimal")]
    Decimal,
    #[serde(rename = "string", alias = "String")]
    Text,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Int => "int",
            Self::Date => "date",
            Self::Decimal => "decimal",
            Self::Text => "string",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnField {
    pub display_name: String,
    pub mapped_to: String,
    pub data_type: DataType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    /// Carried from configuration; header detection does not use it.
    #[serde(default)]
    pub header_row_offset: i64,
    pub columns: Vec<ColumnField>,
}

impl TableConfig {
    pub fn display_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.display_name.clone()).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionConfig {
    #[serde(rename = "id")]
    pub kind: SectionKind,
    pub title: String,
    pub order: i64,
    #[serde(default)]
    pub mapped_to: Option<String>,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub search_keywords: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub table: Option<TableConfig>,
    #[serde(default, rename = "relativeSearchRange")]
    pub search_range: SearchRange,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StatementConfig {
    statement_type: StatementType,
    sections: Vec<SectionConfig>,
}

impl StatementConfig {
    /// Reads `<config_dir>/<family>StatementConfig.json`.
    pub fn load(config_dir: &Path, statement_type: StatementType) -> Result<Self> {
        let file_name = statement_type.file_family().config_file_name();
        let path = config_dir.join(&file_name);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            StatementError::Config(format!(
                "Could not read configuration file {}: {e}",
                path.display()
            ))
        })?;
        let config = Self::from_json_str(&content, statement_type)?;
        tracing::info!(
            statement_type = %statement_type,
            file = %path.display(),
            sections = ?config.section_titles(),
            "loaded statement configuration"
        );
        Ok(config)
    }

    /// The configuration compiled into the binary for this statement type.
    pub fn bundled(statement_type: StatementType) -> Result<Self> {
        Self::from_json_str(statement_type.file_family().bundled_config(), statement_type)
    }

    pub fn from_json_str(json: &str, statement_type: StatementType) -> Result<Self> {
        let mut root: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| StatementError::Config(format!("Malformed configuration JSON: {e}")))?;
        let root_key = statement_type.config_root();
        let sections = root
            .get_mut(root_key)
            .ok_or_else(|| {
                StatementError::Config(format!("Missing configuration root key {root_key}"))
            })?
            .get_mut("sections")
            .map(serde_json::Value::take)
            .ok_or_else(|| {
                StatementError::Config(format!("Configuration {root_key} has no sections"))
            })?;
        let mut sections: Vec<SectionConfig> = serde_json::from_value(sections)
            .map_err(|e| StatementError::Config(format!("Invalid section configuration: {e}")))?;

        for section in &sections {
            if section.kind == SectionKind::TransactionsTable && section.table.is_none() {
                return Err(StatementError::Config(format!(
                    "Section {:?} is a transactions table without a table definition",
                    section.title
                )));
            }
        }
        sections.sort_by_key(|s| s.order);

        Ok(Self {
            statement_type,
            sections,
        })
    }

    pub fn statement_type(&self) -> StatementType {
        self.statement_type
    }

    /// Sections in ascending `order`.
    pub fn sections(&self) -> &[SectionConfig] {
        &self.sections
    }

    pub fn section_titles(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.title.as_str()).collect()
    }
}
