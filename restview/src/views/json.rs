use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value as JsonValue;

use crate::artifact::{Artifact, Text, TextFormat};
use crate::view::Rendering;
use crate::{Error, Response};

/// Parse the body as JSON and pretty-print it. Invalid JSON is an error.
pub fn render_json(response: &Response, indent: usize, max_rows: usize) -> Result<Rendering, Error> {
    let value: JsonValue = serde_json::from_slice(response.body())?;
    let body = to_pretty_string(&value, indent)?;
    Ok(Artifact::Text(Text::new(TextFormat::Json, body, max_rows)).into())
}

/// Serialize a value as JSON, indenting nested structures by `indent`
/// spaces.
pub fn to_pretty_string<T: Serialize>(value: &T, indent: usize) -> Result<String, Error> {
    let indent = " ".repeat(indent);
    let mut out = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
    value.serialize(&mut ser)?;
    // serde_json only ever writes valid UTF-8.
    Ok(String::from_utf8_lossy(&out).into_owned())
}
