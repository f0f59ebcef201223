//! Configuration-related functionality for restview.

use std::fs;
use std::path::Path;

use eyre::{Result, WrapErr};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::Error;

/// The default summary line template, in
/// [Handlebars](https://handlebarsjs.com/) format.
pub const DEFAULT_SUMMARY_TEMPLATE: &str = "Status: {{code}}/{{reason}}, Encoding: {{encoding}}, \
     Time: {{elapsed}} secs, Length: {{length}} Bytes, Cached: {{cached}}";

/// Tunables for the built-in views and the response summary.
///
/// Every field has a default, so configuration files only need to specify
/// the values they want to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Added to the computed map zoom level so that maps are zoomed in a
    /// little further than the bare fit.
    pub zoom_offset: u8,
    /// Radius of the circle markers placed on GPX track points.
    pub marker_radius: u32,
    /// Upper bound for the row hint of text artifacts.
    pub max_text_rows: usize,
    /// Indentation width used when pretty-printing JSON.
    pub json_indent: usize,
    /// Marker size of 3-D scatter points.
    pub point_size: f64,
    pub summary_template: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zoom_offset: 1,
            marker_radius: 5,
            max_text_rows: 10,
            json_indent: 2,
            point_size: 1.0,
            summary_template: DEFAULT_SUMMARY_TEMPLATE.to_string(),
        }
    }
}

impl Config {
    pub fn with_zoom_offset(mut self, zoom_offset: u8) -> Self {
        self.zoom_offset = zoom_offset;
        self
    }

    pub fn with_marker_radius(mut self, marker_radius: u32) -> Self {
        self.marker_radius = marker_radius;
        self
    }

    pub fn with_max_text_rows(mut self, max_text_rows: usize) -> Self {
        self.max_text_rows = max_text_rows;
        self
    }

    pub fn with_json_indent(mut self, json_indent: usize) -> Self {
        self.json_indent = json_indent;
        self
    }

    pub fn with_point_size(mut self, point_size: f64) -> Self {
        self.point_size = point_size;
        self
    }

    pub fn with_summary_template<S: AsRef<str>>(mut self, template: S) -> Self {
        self.summary_template = template.as_ref().to_string();
        self
    }

    /// Parse configuration from a string in the given format (`json`, `yml`
    /// or `yaml`).
    pub fn parse<S: AsRef<str>>(content: S, format: &str) -> Result<Self, Error> {
        let content = content.as_ref();
        match format {
            "json" => Ok(serde_json::from_str(content)?),
            "yml" | "yaml" => Ok(serde_yaml::from_str(content)?),
            _ => Err(Error::UnsupportedFileType(format.to_string())),
        }
    }

    /// Load configuration from the given file, whose format is determined by
    /// its extension.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| Error::CannotDetermineFileType(path.to_path_buf()))?;
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Io(path.display().to_string(), e))
            .wrap_err_with(|| Error::FailedToLoadConfig(path.to_path_buf()))?;
        let config = Self::parse(content, ext)
            .wrap_err_with(|| Error::FailedToLoadConfig(path.to_path_buf()))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration from the given file if it exists, otherwise fall
    /// back to the defaults.
    pub fn load_or_default<P: AsRef<Path>>(maybe_config_file: P) -> Result<Self> {
        let path = maybe_config_file.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!(
                "No such configuration file, skipping configuration file loading: {}",
                path.display()
            );
            Ok(Self::default())
        }
    }
}
