//! The displayable results produced by views.
//!
//! Artifacts are plain data. How each one is presented (a text area, a grid,
//! a map canvas...) is up to the host application.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::geometry::LatLon;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    Text(Text),
    Table(Table),
    Image(Image),
    Map(Map),
    PointCloud(PointCloud),
    Message(Message),
}

impl Artifact {
    /// A short name for the kind of artifact, for display purposes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Table(_) => "table",
            Self::Image(_) => "image",
            Self::Map(_) => "map",
            Self::PointCloud(_) => "point_cloud",
            Self::Message(_) => "message",
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    Plain,
    Json,
    Html,
    Svg,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub format: TextFormat,
    pub body: String,
    /// Suggested number of visible rows when shown in a text area.
    pub rows: usize,
}

impl Text {
    /// The row hint is one more than the number of newlines, capped at
    /// `max_rows`.
    pub fn new<S: Into<String>>(format: TextFormat, body: S, max_rows: usize) -> Self {
        let body = body.into();
        let rows = max_rows.min(body.matches('\n').count() + 1);
        Self { format, body, rows }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ColumnType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Rows of typed cells. Every row has exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image subtype taken from the content type, e.g. `png`.
    pub format: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layer", rename_all = "snake_case")]
pub enum Layer {
    GeoJson { data: JsonValue },
    Polyline { locations: Vec<LatLon>, fill: bool },
    CircleMarker { location: LatLon, radius: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Map {
    pub center: LatLon,
    pub zoom: u8,
    pub layers: Vec<Layer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    Sphere,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub size: f64,
    pub marker: Marker,
}

impl PointCloud {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// A decoded binary message, rendered as structured text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub type_name: String,
    pub text: String,
}

/// A human-readable rendition of an artifact, for terminals.
impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(t) => write!(f, "{}", t.body),
            Self::Table(t) => {
                let names = t.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
                writeln!(f, "{}", names.join("\t"))?;
                for row in &t.rows {
                    let cells = row.iter().map(Cell::to_string).collect::<Vec<_>>();
                    writeln!(f, "{}", cells.join("\t"))?;
                }
                Ok(())
            }
            Self::Image(img) => write!(f, "<{} image, {} bytes>", img.format, img.data.len()),
            Self::Map(m) => write!(
                f,
                "<map centered at ({}, {}), zoom {}, {} layer(s)>",
                m.center.lat,
                m.center.lon,
                m.zoom,
                m.layers.len()
            ),
            Self::PointCloud(pc) => write!(f, "<3-D scatter plot, {} point(s)>", pc.len()),
            Self::Message(m) => write!(f, "{}", m.text),
        }
    }
}
