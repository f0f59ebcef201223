//! Geometry helpers for map-based views: bounding boxes, their centers and
//! a matching map zoom level.
//!
//! Coordinates are `(lon, lat)` pairs in degrees, as in GeoJSON.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::Error;

/// Boxes smaller than this (in degrees) get the maximum zoom level.
const POINT_LIKE_DIFF: f64 = 360.0 / (1 << 20) as f64;

pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 21;

/// A geographic position in the order map widgets expect it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// `((min_lon, min_lat), (max_lon, max_lat))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: (f64, f64),
    pub max: (f64, f64),
}

impl BoundingBox {
    /// Component-wise minimum and maximum of the given coordinates. Fails if
    /// there are no coordinates at all.
    pub fn from_coords<I>(coords: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut coords = coords.into_iter();
        let (lon, lat) = coords.next().ok_or(Error::EmptyGeometry)?;
        let mut bbox = Self {
            min: (lon, lat),
            max: (lon, lat),
        };
        for (lon, lat) in coords {
            bbox.min = (bbox.min.0.min(lon), bbox.min.1.min(lat));
            bbox.max = (bbox.max.0.max(lon), bbox.max.1.max(lat));
        }
        Ok(bbox)
    }

    /// Midpoint of the two corners, as `(lon, lat)`.
    pub fn center(&self) -> (f64, f64) {
        center(self.min, self.max)
    }

    pub fn zoom(&self) -> u8 {
        zoom_for_bbox(self.min.0, self.min.1, self.max.0, self.max.1)
    }
}

/// The point halfway between `p` and `q`.
pub fn center(p: (f64, f64), q: (f64, f64)) -> (f64, f64) {
    (p.0 + (q.0 - p.0) / 2.0, p.1 + (q.1 - p.1) / 2.0)
}

/// Estimate the map zoom level at which a box of the given extent roughly
/// fills one tile of a power-of-two tile pyramid.
///
/// The result is in `1..=21`. The fractional zoom is truncated toward zero,
/// not rounded.
pub fn zoom_for_bbox(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> u8 {
    let lat_diff = (lat_max - lat_min).abs();
    let lon_diff = (lon_max - lon_min).abs();
    let max_diff = lon_diff.max(lat_diff);

    if max_diff < POINT_LIKE_DIFF {
        return MAX_ZOOM;
    }
    let ln2 = 2.0_f64.ln();
    let zoom = -((max_diff.ln() / ln2) - (360.0_f64.ln() / ln2));
    // `as` truncates toward zero.
    let zoom = zoom as i64;
    if zoom < MIN_ZOOM as i64 {
        MIN_ZOOM
    } else {
        zoom as u8
    }
}

/// Collect every position in a GeoJSON object, descending through feature
/// collections, features, geometry collections and nested coordinate arrays.
pub fn geojson_coords(value: &JsonValue) -> Vec<(f64, f64)> {
    let mut coords = Vec::new();
    collect_geojson_coords(value, &mut coords);
    coords
}

/// Bounding box over all positions in a GeoJSON object.
pub fn geojson_bbox(value: &JsonValue) -> Result<BoundingBox, Error> {
    BoundingBox::from_coords(geojson_coords(value))
}

fn collect_geojson_coords(value: &JsonValue, coords: &mut Vec<(f64, f64)>) {
    match value.get("type").and_then(JsonValue::as_str) {
        Some("FeatureCollection") => {
            for feature in value
                .get("features")
                .and_then(JsonValue::as_array)
                .into_iter()
                .flatten()
            {
                collect_geojson_coords(feature, coords);
            }
        }
        Some("Feature") => {
            if let Some(geometry) = value.get("geometry") {
                collect_geojson_coords(geometry, coords);
            }
        }
        Some("GeometryCollection") => {
            for geometry in value
                .get("geometries")
                .and_then(JsonValue::as_array)
                .into_iter()
                .flatten()
            {
                collect_geojson_coords(geometry, coords);
            }
        }
        _ => {
            if let Some(positions) = value.get("coordinates") {
                collect_positions(positions, coords);
            }
        }
    }
}

fn collect_positions(value: &JsonValue, coords: &mut Vec<(f64, f64)>) {
    let arr = match value.as_array() {
        Some(arr) => arr,
        None => return,
    };
    // A position is an array of at least two numbers; any altitude is ignored.
    if let (Some(lon), Some(lat)) = (
        arr.get(0).and_then(JsonValue::as_f64),
        arr.get(1).and_then(JsonValue::as_f64),
    ) {
        coords.push((lon, lat));
        return;
    }
    for inner in arr {
        collect_positions(inner, coords);
    }
}
