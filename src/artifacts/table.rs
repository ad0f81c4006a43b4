//! Data table parsing
//!
//! Table rows live six levels deep: `raw[0][0][0][0][4][2]`. Each row is
//! `[start, end, [cells...]]` and each cell is an arbitrarily nested array
//! mixing integer position markers with string text fragments. Cell text
//! extraction is a depth-capped recursive concatenation of string leaves;
//! the cap is a required bound against adversarial or corrupted payloads,
//! not a safety margin.

use std::path::Path;

use serde_json::Value;

use crate::artifacts::views::parse_error;
use crate::error::Result;

/// Maximum recursion depth for cell text extraction.
pub const MAX_CELL_DEPTH: usize = 100;

const TYPE_NAME: &str = "data_table";

/// Recursively extract text from a nested cell structure.
///
/// Strings are stripped and concatenated with single spaces; numeric
/// leaves are position markers and are skipped; anything nested past
/// [`MAX_CELL_DEPTH`] is dropped.
pub fn extract_cell_text(cell: &Value) -> String {
    extract_cell_text_at(cell, 0)
}

fn extract_cell_text_at(cell: &Value, depth: usize) -> String {
    if depth > MAX_CELL_DEPTH {
        return String::new();
    }
    match cell {
        Value::Null | Value::Number(_) => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| extract_cell_text_at(item, depth + 1))
                .filter(|text| !text.is_empty())
                .collect();
            parts.join(" ")
        }
        other => other.to_string(),
    }
}

/// Parse the raw table payload into `(headers, rows)`.
///
/// The first row is the header row. Subsequent rows are padded with empty
/// strings or truncated to the header's column count when they disagree
/// (documented leniency). An empty header row, an empty rows array, and a
/// failed navigation are distinct parse errors.
pub fn parse_data_table(raw: &Value) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let rows_array = navigate_to_rows(raw)?;
    if rows_array.is_empty() {
        return Err(parse_error(
            TYPE_NAME,
            "empty rows array - data table contains no data",
        ));
    }

    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut skipped_rows = 0usize;

    for (i, row_section) in rows_array.iter().enumerate() {
        // Row format: [start_pos, end_pos, [cells...]]
        let Some(cells) = row_section
            .as_array()
            .filter(|r| r.len() >= 3)
            .and_then(|r| r[2].as_array())
        else {
            skipped_rows += 1;
            continue;
        };

        let mut values: Vec<String> = cells.iter().map(extract_cell_text).collect();

        if i == 0 {
            if values.is_empty() || values.iter().all(String::is_empty) {
                return Err(parse_error(
                    TYPE_NAME,
                    "first row (headers) is empty - table must have column headers",
                ));
            }
            headers = values;
        } else {
            if values.len() < headers.len() {
                values.resize(headers.len(), String::new());
            } else if values.len() > headers.len() {
                values.truncate(headers.len());
            }
            rows.push(values);
        }
    }

    if headers.is_empty() {
        return Err(parse_error(
            TYPE_NAME,
            "failed to extract headers - first row may be malformed",
        ));
    }
    if rows.is_empty() {
        return Err(parse_error(
            TYPE_NAME,
            format!(
                "no data rows extracted (skipped {} malformed rows)",
                skipped_rows
            ),
        ));
    }

    Ok((headers, rows))
}

/// Navigate `raw[0][0][0][0][4][2]`, reporting the exact failing hop.
fn navigate_to_rows(raw: &Value) -> Result<&Vec<Value>> {
    let mut current = raw;
    for (hop, at) in [
        (0usize, "raw[0]"),
        (0, "raw[0][0]"),
        (0, "raw[0][0][0]"),
        (0, "raw[0][0][0][0]"),
    ] {
        current = current
            .as_array()
            .filter(|items| !items.is_empty())
            .map(|items| &items[hop])
            .ok_or_else(|| parse_error(TYPE_NAME, format!("expected non-empty array at {}", at)))?;
    }

    // [4] is the table content section [type, flags, rows_array]
    let section = current
        .as_array()
        .filter(|items| items.len() >= 5)
        .map(|items| &items[4])
        .ok_or_else(|| {
            parse_error(
                TYPE_NAME,
                "expected at least 5 elements at raw[0][0][0][0]",
            )
        })?;

    let rows = section
        .as_array()
        .filter(|items| items.len() >= 3)
        .and_then(|items| items[2].as_array())
        .ok_or_else(|| {
            parse_error(
                TYPE_NAME,
                "expected rows array at raw[0][0][0][0][4][2]",
            )
        })?;

    Ok(rows)
}

/// Write headers and rows to a CSV file with a UTF-8 BOM (the counterpart's
/// own exports carry one, and spreadsheet apps rely on it).
pub fn write_csv(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut out = String::from("\u{feff}");
    push_csv_row(&mut out, headers);
    for row in rows {
        push_csv_row(&mut out, row);
    }
    std::fs::write(path, out)?;
    Ok(())
}

fn push_csv_row(out: &mut String, fields: &[String]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push_str("\r\n");
}
