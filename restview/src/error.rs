use std::path::PathBuf;

use thiserror::Error;

/// The primary error type that can be produced by restview.
#[derive(Debug, Error)]
pub enum Error {
    #[error("response has no Content-Type header")]
    MissingContentType,
    #[error("malformed Content-Type header: \"{0}\"")]
    MalformedContentType(String),
    #[error("invalid MIME type pattern for view \"{0}\": {1}")]
    InvalidPattern(String, regex::Error),
    #[error("geometry contains no coordinates")]
    EmptyGeometry,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("GPX error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
    #[error("response body is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),
    #[error("expected at least 3 columns of point data, but found {0}")]
    TooFewColumns(usize),
    #[error("failed to parse point data on line {0}: {1}")]
    Scatter(usize, String),
    #[error("Protobuf decoding error: {0}")]
    Protobuf(#[from] protowire::DecodeError),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid summary template: {0}")]
    Template(#[from] handlebars::TemplateError),
    #[error("failed to render summary: {0}")]
    TemplateRender(#[from] handlebars::RenderError),
    #[error("I/O error {0}: {1}")]
    Io(String, std::io::Error),
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("cannot determine file type of file: {0}")]
    CannotDetermineFileType(PathBuf),
    #[error("failed to load configuration from {0}")]
    FailedToLoadConfig(PathBuf),
    #[error("failed to load cassette from {0}")]
    FailedToLoadCassette(PathBuf),
    #[error("failed to save cassette to {0}")]
    FailedToSaveCassette(PathBuf),
    #[error("failed to parse cassette path pattern \"{0}\": {1}")]
    CassettePattern(String, glob::PatternError),
    #[error("cassette path iteration failed: {0}")]
    CassetteIter(#[from] glob::GlobError),
    #[error("no recorded interaction matches {0} {1}")]
    NoSuchInteraction(String, String),
    #[error("no cassettes found")]
    NoCassettesFound,
}
