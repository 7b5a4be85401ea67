//! Excel workbook extraction.
//!
//! Only the first worksheet is converted, to CSV. When the workbook has more
//! sheets, the output opens with a `# ` comment line naming the ones that
//! were skipped so the loss is visible in the sanitized file.

use crate::{
    config::ExtractorConfig,
    error::{ExtractError, Result},
    format::DocumentFormat,
    ooxml::{self, attr, Archive, XmlEvent, XmlTokens},
    ExtractResult, Extractor,
};
use std::collections::HashMap;
use tracing::debug;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// A sheet listed in the workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub rel_id: Option<String>,
}

/// Excel (`.xlsx`) extractor
pub struct SpreadsheetExtractor {
    config: ExtractorConfig,
}

impl SpreadsheetExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    fn read(&self, archive: &mut Archive<'_>, name: &str) -> Result<String> {
        ooxml::read_part(archive, name, self.config.max_part_size)
    }

    /// Resolve the part path of a sheet through the workbook relationships
    fn sheet_path(&self, archive: &mut Archive<'_>, sheet: &SheetEntry) -> String {
        let fallback = "xl/worksheets/sheet1.xml".to_string();
        let Some(rel_id) = &sheet.rel_id else {
            return fallback;
        };

        let rels = match self.read(archive, WORKBOOK_RELS_PART) {
            Ok(rels) => rels,
            Err(e) => {
                debug!(error = %e, "Workbook relationships unreadable, assuming sheet1.xml");
                return fallback;
            }
        };

        relationship_targets(&rels)
            .remove(rel_id)
            .map(|target| resolve_target(&target))
            .unwrap_or(fallback)
    }
}

impl Extractor for SpreadsheetExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Spreadsheet
    }

    fn extract(&self, bytes: &[u8]) -> Result<ExtractResult> {
        let mut archive = ooxml::open_archive(bytes)?;

        let sheets = parse_sheet_list(&self.read(&mut archive, WORKBOOK_PART)?)?;
        let Some(first) = sheets.first() else {
            return Err(ExtractError::Parse("workbook has no sheets".to_string()));
        };

        let shared = match self.read(&mut archive, SHARED_STRINGS_PART) {
            Ok(xml) => parse_shared_strings(&xml)?,
            Err(ExtractError::MissingPart(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        let path = self.sheet_path(&mut archive, first);
        let rows = parse_sheet_rows(&self.read(&mut archive, &path)?, &shared)?;

        let skipped: Vec<&str> = sheets[1..].iter().map(|s| s.name.as_str()).collect();
        let mut text = String::new();
        if !skipped.is_empty() {
            text.push_str(&format!(
                "# Only the first sheet ({}) was converted; skipped sheets: {}\n",
                first.name,
                skipped.join(", ")
            ));
        }
        text.push_str(&rows_to_csv(&rows)?);

        let mut result = ExtractResult::new(text, self.format())
            .with_metadata("sheet_name", first.name.clone())
            .with_metadata("sheet_count", sheets.len().to_string())
            .with_metadata("row_count", rows.len().to_string());
        if !skipped.is_empty() {
            result = result.with_metadata("skipped_sheets", skipped.join(","));
        }
        Ok(result)
    }
}

/// Sheets in workbook order
pub fn parse_sheet_list(xml: &str) -> Result<Vec<SheetEntry>> {
    let mut sheets = Vec::new();
    for event in XmlTokens::new(xml) {
        if let XmlEvent::Start { name, attrs, .. } = event? {
            if ooxml::local_name(name) == "sheet" {
                sheets.push(SheetEntry {
                    name: attr(attrs, "name").map(|n| n.into_owned()).unwrap_or_default(),
                    rel_id: attr(attrs, "r:id").map(|id| id.into_owned()),
                });
            }
        }
    }
    Ok(sheets)
}

/// Map of relationship id to target
fn relationship_targets(xml: &str) -> HashMap<String, String> {
    XmlTokens::new(xml)
        .filter_map(|event| match event {
            Ok(XmlEvent::Start { name, attrs, .. }) if ooxml::local_name(name) == "Relationship" => {
                Some((attr(attrs, "Id")?.into_owned(), attr(attrs, "Target")?.into_owned()))
            }
            _ => None,
        })
        .collect()
}

/// Targets are relative to `xl/` unless absolute within the package
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target.trim_start_matches("./")),
    }
}

/// Shared string table; rich-text runs are concatenated, phonetic hints dropped
pub fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut in_phonetic = false;

    for event in XmlTokens::new(xml) {
        let event = event?;
        match (&event, event.local_name()) {
            (XmlEvent::Start { empty, .. }, Some("si")) => {
                if *empty {
                    strings.push(String::new());
                } else {
                    current = Some(String::new());
                }
            }
            (XmlEvent::End { .. }, Some("si")) => strings.push(current.take().unwrap_or_default()),
            (XmlEvent::Start { empty: false, .. }, Some("rPh")) => in_phonetic = true,
            (XmlEvent::End { .. }, Some("rPh")) => in_phonetic = false,
            (XmlEvent::Start { empty: false, .. }, Some("t")) => in_text = true,
            (XmlEvent::End { .. }, Some("t")) => in_text = false,
            (XmlEvent::Text(text), None) if in_text && !in_phonetic => {
                if let Some(s) = current.as_mut() {
                    s.push_str(text);
                }
            }
            _ => {}
        }
    }
    Ok(strings)
}

/// Widest sheet Excel can produce (`XFD`)
pub const MAX_COLUMNS: usize = 16_384;

/// Zero-based column index from a cell reference such as `AB12`.
///
/// `None` when the reference has no column letters or lies past [`MAX_COLUMNS`].
pub fn column_index(cell_ref: &str) -> Option<usize> {
    let letters = cell_ref
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .count();
    if letters == 0 || letters > 3 {
        return None;
    }
    let index = cell_ref.bytes().take(letters).try_fold(0usize, |acc, b| {
        let digit = (b.to_ascii_uppercase() - b'A' + 1) as usize;
        acc.checked_mul(26)?.checked_add(digit)
    })?;
    (index <= MAX_COLUMNS).then(|| index - 1)
}

#[derive(Default)]
struct CellState {
    column: usize,
    kind: String,
    value: String,
    in_value: bool,
    in_inline_text: bool,
}

impl CellState {
    fn resolve(&self, shared: &[String]) -> String {
        match self.kind.as_str() {
            "s" => self
                .value
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|i| shared.get(i).cloned())
                .unwrap_or_default(),
            "b" => match self.value.trim() {
                "1" => "TRUE".to_string(),
                "0" => "FALSE".to_string(),
                other => other.to_string(),
            },
            _ => self.value.clone(),
        }
    }
}

/// Cell values of a worksheet, row by row. Gaps between cells become empty
/// fields; empty rows are dropped.
pub fn parse_sheet_rows(xml: &str, shared: &[String]) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell: Option<CellState> = None;

    for event in XmlTokens::new(xml) {
        let event = event?;
        match (&event, event.local_name()) {
            (XmlEvent::Start { empty, .. }, Some("row")) => {
                row.clear();
                if *empty {
                    continue;
                }
            }
            (XmlEvent::End { .. }, Some("row")) => {
                if row.iter().any(|v| !v.is_empty()) {
                    rows.push(std::mem::take(&mut row));
                }
            }
            (XmlEvent::Start { attrs, empty, .. }, Some("c")) => {
                let column = match attr(attrs, "r") {
                    Some(r) => column_index(&r).ok_or_else(|| {
                        ExtractError::Parse(format!("cell reference out of range: {r}"))
                    })?,
                    None if row.len() < MAX_COLUMNS => row.len(),
                    None => {
                        return Err(ExtractError::Parse(format!(
                            "row wider than {MAX_COLUMNS} columns"
                        )))
                    }
                };
                let state = CellState {
                    column,
                    kind: attr(attrs, "t").map(|t| t.into_owned()).unwrap_or_default(),
                    ..CellState::default()
                };
                if *empty {
                    place(&mut row, state.column, String::new());
                } else {
                    cell = Some(state);
                }
            }
            (XmlEvent::End { .. }, Some("c")) => {
                if let Some(state) = cell.take() {
                    place(&mut row, state.column, state.resolve(shared));
                }
            }
            (XmlEvent::Start { empty: false, .. }, Some("v")) => {
                if let Some(state) = cell.as_mut() {
                    state.in_value = true;
                }
            }
            (XmlEvent::End { .. }, Some("v")) => {
                if let Some(state) = cell.as_mut() {
                    state.in_value = false;
                }
            }
            (XmlEvent::Start { empty: false, .. }, Some("t")) => {
                if let Some(state) = cell.as_mut() {
                    state.in_inline_text = true;
                }
            }
            (XmlEvent::End { .. }, Some("t")) => {
                if let Some(state) = cell.as_mut() {
                    state.in_inline_text = false;
                }
            }
            (XmlEvent::Text(text), None) => {
                if let Some(state) = cell.as_mut() {
                    if state.in_value || state.in_inline_text {
                        state.value.push_str(text);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(rows)
}

fn place(row: &mut Vec<String>, column: usize, value: String) {
    if row.len() <= column {
        row.resize(column + 1, String::new());
    }
    row[column] = value;
}

fn rows_to_csv(rows: &[Vec<String>]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExtractError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
