//! Spreadsheet parser.

use super::{read_bytes, DocumentParser};
use crate::error::{LoadError, LoadResult};
use calamine::{Data, Reader, Sheets};
use docqa_core::{LoadedUnit, SourceFile, UnitLocation};
use std::io::{Cursor, Read, Seek};

/// Parser for `.xlsx` workbooks. Each non-empty sheet becomes one unit with
/// its rows rendered as `a | b | c`.
pub struct XlsxParser;

impl XlsxParser {
    /// Create a new spreadsheet parser.
    pub fn new() -> Self {
        Self
    }

    /// Render every sheet of an open workbook.
    pub(crate) fn sheets_to_units<RS: Read + Seek>(
        workbook: &mut Sheets<RS>,
        source: &str,
        strategy: &str,
    ) -> Result<Vec<LoadedUnit>, String> {
        let sheet_names = workbook.sheet_names();
        let total_sheets = sheet_names.len();
        let mut units = Vec::new();

        for sheet_name in sheet_names {
            let range = workbook
                .worksheet_range(&sheet_name)
                .map_err(|e| format!("sheet '{}': {}", sheet_name, e))?;

            let mut rows = 0usize;
            let mut body = String::new();
            for row in range.rows() {
                let cells: Vec<String> = row.iter().map(render_cell).collect();
                if cells.iter().all(|c| c.is_empty()) {
                    continue;
                }
                body.push_str(&cells.join(" | "));
                body.push('\n');
                rows += 1;
            }

            if rows == 0 {
                continue;
            }

            let metadata = serde_json::json!({
                "format": "xlsx",
                "strategy": strategy,
                "sheet": sheet_name,
                "rows": rows,
                "total_sheets": total_sheets,
            });

            units.push(
                LoadedUnit::new(source, format!("Sheet: {}\n{}", sheet_name, body.trim_end()))
                    .with_location(UnitLocation::Sheet { name: sheet_name })
                    .with_metadata(metadata),
            );
        }

        Ok(units)
    }
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

impl Default for XlsxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for XlsxParser {
    fn parse(&self, file: &SourceFile) -> LoadResult<Vec<LoadedUnit>> {
        let bytes = read_bytes(file)?;
        let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
            LoadError::parse(&file.path, format!("Failed to open workbook: {}", e))
        })?;

        Self::sheets_to_units(&mut workbook, &file.file_name, "xlsx").map_err(|e| {
            LoadError::parse(&file.path, format!("Failed to read workbook: {}", e))
        })
    }
}
