//! Map-based views for GeoJSON and GPX bodies.

use log::debug;
use serde_json::Value as JsonValue;
use xml::reader::{EventReader, XmlEvent};

use crate::artifact::{Artifact, Layer, Map};
use crate::geometry::{geojson_bbox, BoundingBox, LatLon};
use crate::view::Rendering;
use crate::{Error, Response};

/// Render a GeoJSON `FeatureCollection` as a map with a single GeoJSON layer.
/// Any other GeoJSON object is not shown.
pub fn render_geojson(response: &Response, zoom_offset: u8) -> Result<Rendering, Error> {
    let value: JsonValue = serde_json::from_slice(response.body())?;
    if value.get("type").and_then(JsonValue::as_str) != Some("FeatureCollection") {
        debug!("GeoJSON body is not a FeatureCollection, not rendering a map");
        return Ok(Rendering::Absent);
    }
    let bbox = geojson_bbox(&value)?;
    Ok(Artifact::Map(Map {
        center: center_of(&bbox),
        zoom: bbox.zoom().saturating_add(zoom_offset),
        layers: vec![Layer::GeoJson { data: value }],
    })
    .into())
}

/// Render the track points of a GPX document as a map with an unfilled
/// polyline through all points and a circle marker on each point.
///
/// Bodies that are not well-formed XML are not shown at all.
pub fn render_gpx(
    response: &Response,
    zoom_offset: u8,
    marker_radius: u32,
) -> Result<Rendering, Error> {
    let text = response.text()?;
    if let Err(reason) = check_well_formed(text) {
        debug!("GPX body is not well-formed XML ({}), not rendering a map", reason);
        return Ok(Rendering::Absent);
    }
    let gpx = gpx::read(text.as_bytes())?;
    let locations = gpx
        .tracks
        .iter()
        .flat_map(|track| track.segments.iter())
        .flat_map(|segment| segment.points.iter())
        .map(|waypoint| {
            let point = waypoint.point();
            LatLon::new(point.y(), point.x())
        })
        .collect::<Vec<LatLon>>();
    let bbox = BoundingBox::from_coords(locations.iter().map(|loc| (loc.lon, loc.lat)))?;

    let mut layers = Vec::with_capacity(locations.len() + 1);
    layers.push(Layer::Polyline {
        locations: locations.clone(),
        fill: false,
    });
    layers.extend(locations.into_iter().map(|location| Layer::CircleMarker {
        location,
        radius: marker_radius,
    }));
    Ok(Artifact::Map(Map {
        center: center_of(&bbox),
        zoom: bbox.zoom().saturating_add(zoom_offset),
        layers,
    })
    .into())
}

fn center_of(bbox: &BoundingBox) -> LatLon {
    let (lon, lat) = bbox.center();
    LatLon::new(lat, lon)
}

/// Checks that the given text is a single well-formed XML document, using
/// the same XML reader the GPX parser is built on. Anything that reader
/// rejects (unbalanced tags, bad attributes, undefined entities, malformed
/// names) is reported here, as is a document with more than one root.
fn check_well_formed(text: &str) -> Result<(), String> {
    let mut reader = EventReader::from_str(text);
    let mut depth = 0_usize;
    let mut roots = 0_usize;
    loop {
        match reader.next().map_err(|e| e.to_string())? {
            XmlEvent::EndDocument => break,
            XmlEvent::StartElement { .. } => {
                if depth == 0 {
                    roots += 1;
                }
                depth += 1;
            }
            XmlEvent::EndElement { .. } => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    match roots {
        1 => Ok(()),
        0 => Err("no root element".to_string()),
        _ => Err("more than one root element".to_string()),
    }
}
