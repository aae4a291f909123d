use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::config::{SectionConfig, SectionKind, StatementConfig, StatementType};
use crate::error::{Result, StatementError};
use crate::fields::resolve_fields;
use crate::grid::{Cursor, Sheet};
use crate::locator::locate_header;
use crate::models::{AccountStatement, TransactionInfo, TransactionRecord};
use crate::table::{locate_table, read_transactions};
use crate::workbook::Workbook;

/// One section as found on the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSection {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapped_to: Option<String>,
    /// `R{row}C{col}` of the cell the section was recognized by, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_reference: Option<String>,
    pub fields: IndexMap<String, String>,
}

impl ParsedSection {
    fn from_config(section: &SectionConfig) -> Self {
        Self {
            id: section.kind.id().to_string(),
            title: section.title.clone(),
            mapped_to: section.mapped_to.clone(),
            cell_reference: None,
            fields: IndexMap::new(),
        }
    }
}

/// Everything a parse found: key-value sections by id, plus the transactions.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub sections: IndexMap<String, ParsedSection>,
    pub transactions: IndexSet<TransactionRecord>,
}

impl Extraction {
    pub fn section(&self, kind: &SectionKind) -> Option<&ParsedSection> {
        self.sections.get(kind.id())
    }

    /// Account info comes from the search-criteria section; a statement without one
    /// gets empty info.
    pub fn into_statement(self) -> AccountStatement {
        let info = self
            .section(&SectionKind::SearchCriteria)
            .map(|s| TransactionInfo::from_fields(&s.fields))
            .unwrap_or_default();
        AccountStatement::new(info, self.transactions)
    }
}

pub struct StatementParser<'a> {
    config: &'a StatementConfig,
}

impl<'a> StatementParser<'a> {
    pub fn new(config: &'a StatementConfig) -> Self {
        Self { config }
    }

    pub fn extract(&self, sheet: &Sheet) -> Result<Extraction> {
        let origin = sheet.first_populated().ok_or_else(|| {
            StatementError::EmptyInput(format!("sheet {:?} has no populated cells", sheet.name()))
        })?;
        let mut cursor = Cursor::at(origin);
        let mut extraction = Extraction::default();

        for section in self.config.sections() {
            if section.skip {
                tracing::debug!(section = section.kind.id(), "section skipped by configuration");
                continue;
            }
            match &section.kind {
                SectionKind::Header => {
                    match locate_header(
                        sheet,
                        &mut cursor,
                        &section.search_keywords,
                        section.search_range,
                    ) {
                        Some(found) => {
                            let mut parsed = ParsedSection::from_config(section);
                            parsed.title = found.text.trim().to_string();
                            parsed.cell_reference = Some(found.address.r1c1());
                            extraction.sections.insert(parsed.id.clone(), parsed);
                        }
                        None => tracing::warn!(
                            keywords = ?section.search_keywords,
                            "could not find statement header"
                        ),
                    }
                }
                SectionKind::SearchCriteria | SectionKind::AdvanceSearch => {
                    let mut parsed = ParsedSection::from_config(section);
                    parsed.fields = resolve_fields(sheet, &mut cursor, &section.fields);
                    extraction.sections.insert(parsed.id.clone(), parsed);
                }
                SectionKind::TransactionsTable => {
                    let table = section.table.as_ref().ok_or_else(|| {
                        StatementError::Config(format!(
                            "section {:?} has no table definition",
                            section.title
                        ))
                    })?;
                    let layout = locate_table(sheet, &mut cursor, &section.search_keywords, table)?;
                    extraction.transactions.extend(read_transactions(sheet, &layout));
                }
                SectionKind::Unknown(id) => {
                    tracing::info!(section = %id, "no handler for section, ignoring");
                }
            }
        }
        Ok(extraction)
    }

    pub fn parse(&self, sheet: &Sheet) -> Result<AccountStatement> {
        let statement = self.extract(sheet)?.into_statement();
        tracing::info!(
            sheet = sheet.name(),
            records = statement.transaction_records.len(),
            with_errors = statement.error_count(),
            "parsed statement"
        );
        Ok(statement)
    }
}

/// Opens `path` and extracts the first worksheet with the configuration for
/// `statement_type` read from `config_dir`.
pub fn extract_file(
    path: &Path,
    statement_type: StatementType,
    config_dir: &Path,
) -> Result<Extraction> {
    let family = statement_type.file_family();
    if !family.accepts(path) {
        return Err(StatementError::InvalidFileFormat(format!(
            "{} is not one of {:?}",
            path.display(),
            family.extensions()
        )));
    }
    let config = StatementConfig::load(config_dir, statement_type)?;
    let mut workbook = Workbook::open(path)?;
    if workbook.sheet_count() == 0 {
        return Err(StatementError::EmptyInput(format!(
            "no worksheet found in {}",
            path.display()
        )));
    }
    let sheet = workbook.sheet(0)?;
    StatementParser::new(&config).extract(&sheet)
}

pub fn parse_file(
    path: &Path,
    statement_type: StatementType,
    config_dir: &Path,
) -> Result<AccountStatement> {
    let statement = extract_file(path, statement_type, config_dir)?.into_statement();
    tracing::info!(
        file = %path.display(),
        records = statement.transaction_records.len(),
        with_errors = statement.error_count(),
        "parsed statement"
    );
    Ok(statement)
}
