//! The built-in views.
//!
//! Each view lives in its own module as a plain render function. [`builtin`]
//! wires them up with their MIME type patterns and with the configuration
//! values they need.

mod image;
mod json;
mod map;
mod protobuf;
mod scatter;
mod table;
mod text;

pub use self::image::render_image;
pub use self::json::{render_json, to_pretty_string};
pub use self::map::{render_geojson, render_gpx};
pub use self::protobuf::{render_message, render_protobuf, PERSON, PHONE_NUMBER, PHONE_TYPE};
pub use self::scatter::render_scatter;
pub use self::table::render_csv;
pub use self::text::{byte_repr, decode, render_html, render_raw, render_svg};

use crate::{Config, Error, ViewDescriptor};

pub const RAW: &str = "Raw";
pub const HTML: &str = "HTML";
pub const SVG: &str = "SVG";
pub const IMAGE: &str = "Image";
pub const JSON: &str = "JSON";
pub const CSV: &str = "CSV";
pub const GEOJSON: &str = "GeoJSON";
pub const GPX: &str = "GPX";
pub const SCATTER_3D: &str = "Scatter-3D";
pub const PROTOBUF: &str = "Protobuf";

/// All built-in views, in the order in which they are dispatched. Raw comes
/// first and matches everything.
pub fn builtin(config: &Config) -> Result<Vec<ViewDescriptor>, Error> {
    let max_rows = config.max_text_rows;
    let json_indent = config.json_indent;
    let zoom_offset = config.zoom_offset;
    let marker_radius = config.marker_radius;
    let point_size = config.point_size;
    Ok(vec![
        ViewDescriptor::new(RAW, &[".*"], move |r| render_raw(r, max_rows))?,
        ViewDescriptor::new(HTML, &["text/html.*"], move |r| render_html(r, max_rows))?,
        ViewDescriptor::new(SVG, &[r"image/svg\+xml.*"], move |r| {
            render_svg(r, max_rows)
        })?,
        ViewDescriptor::new(IMAGE, &["image/.*"], render_image)?,
        ViewDescriptor::new(
            JSON,
            &["application/json.*", r"application/vnd\..*\+json.*"],
            move |r| render_json(r, json_indent, max_rows),
        )?,
        ViewDescriptor::new(CSV, &["text/csv.*"], render_csv)?,
        ViewDescriptor::new(GEOJSON, &[r"application/vnd\.geo\+json.*"], move |r| {
            render_geojson(r, zoom_offset)
        })?,
        ViewDescriptor::new(GPX, &[r"application/gpx\+xml.*"], move |r| {
            render_gpx(r, zoom_offset, marker_radius)
        })?,
        ViewDescriptor::new(SCATTER_3D, &[r"application/vnd\.3d\+txt.*"], move |r| {
            render_scatter(r, point_size)
        })?,
        ViewDescriptor::new(PROTOBUF, &[r"application/x\-protobuf.*"], render_protobuf)?,
    ])
}
