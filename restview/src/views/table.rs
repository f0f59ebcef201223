//! CSV bodies rendered as typed tables.

use csv::{ReaderBuilder, StringRecord};

use log::debug;

use super::text::decode;
use crate::artifact::{Artifact, Cell, Column, ColumnType, Table};
use crate::view::Rendering;
use crate::{Error, Response};

/// Parse the body as CSV with a header row. Every column's type is inferred
/// from its non-empty cells; empty cells become [`Cell::Null`].
///
/// The body is first decoded with the response's effective text encoding.
/// If that encoding is unsupported or does not fit the body, the raw bytes
/// are parsed and must be UTF-8.
pub fn render_csv(response: &Response) -> Result<Rendering, Error> {
    let decoded = response
        .encoding()
        .and_then(|encoding| decode(response.body(), &encoding));
    if decoded.is_none() {
        debug!("Parsing CSV body without decoding it first");
    }
    let input = decoded
        .as_ref()
        .map(|text| text.as_bytes())
        .unwrap_or_else(|| response.body());
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(input);
    let headers = reader.headers()?.clone();
    let records = reader
        .records()
        .collect::<Result<Vec<StringRecord>, csv::Error>>()?;
    Ok(Artifact::Table(build_table(&headers, &records)).into())
}

fn build_table(headers: &StringRecord, records: &[StringRecord]) -> Table {
    let kinds = (0..headers.len())
        .map(|i| infer_column_type(records.iter().filter_map(|r| r.get(i))))
        .collect::<Vec<ColumnType>>();
    let columns = headers
        .iter()
        .zip(kinds.iter())
        .map(|(name, kind)| Column {
            name: name.to_string(),
            kind: *kind,
        })
        .collect();
    let rows = records
        .iter()
        .map(|record| {
            record
                .iter()
                .zip(kinds.iter())
                .map(|(field, kind)| parse_cell(field, *kind))
                .collect()
        })
        .collect();
    Table { columns, rows }
}

/// The narrowest type that every non-empty value in the column parses as.
/// Columns without any values are text.
fn infer_column_type<'a, I>(values: I) -> ColumnType
where
    I: Iterator<Item = &'a str>,
{
    let mut integer = true;
    let mut float = true;
    let mut boolean = true;
    let mut seen = false;
    for value in values.map(str::trim).filter(|v| !v.is_empty()) {
        seen = true;
        integer = integer && value.parse::<i64>().is_ok();
        float = float && value.parse::<f64>().is_ok();
        boolean = boolean && parse_bool(value).is_some();
    }
    if !seen {
        ColumnType::Text
    } else if integer {
        ColumnType::Integer
    } else if float {
        ColumnType::Float
    } else if boolean {
        ColumnType::Boolean
    } else {
        ColumnType::Text
    }
}

fn parse_cell(field: &str, kind: ColumnType) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Cell::Null;
    }
    // The column type was inferred from these very values, so parsing
    // cannot fail here.
    match kind {
        ColumnType::Integer => trimmed.parse().map(Cell::Integer).unwrap_or(Cell::Null),
        ColumnType::Float => trimmed.parse().map(Cell::Float).unwrap_or(Cell::Null),
        ColumnType::Boolean => parse_bool(trimmed).map(Cell::Boolean).unwrap_or(Cell::Null),
        ColumnType::Text => Cell::Text(field.to_string()),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}
