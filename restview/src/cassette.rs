//! Recorded HTTP interactions ("cassettes") that can be replayed as
//! [`Response`]s.
//!
//! Cassettes are YAML files laid out as follows:
//!
//! ```yaml
//! version: 1
//! interactions:
//! - request:
//!     method: GET
//!     uri: http://localhost:5000/get_json
//!     headers:
//!       Accept: ['*/*']
//!     body: null
//!   response:
//!     status: {code: 200, message: OK}
//!     headers:
//!       Content-Type: [application/json]
//!     body: {string: '{"a": 1}'}
//! ```
//!
//! Interactions are matched on their method and URI.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use eyre::{Result, WrapErr};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Error, Headers, Response};

pub const CASSETTE_VERSION: u32 = 1;

/// File formats cassettes can be stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedFormat {
    Yaml,
}

impl FromStr for SupportedFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Ok(match lower.as_ref() {
            "yaml" | "yml" => Self::Yaml,
            _ => return Err(Error::UnsupportedFileType(s.to_string())),
        })
    }
}

impl SupportedFormat {
    /// Determine the format of the given file from its extension.
    pub fn of_path(path: &Path) -> Result<Self, Error> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| Error::CannotDetermineFileType(path.to_path_buf()))?;
        Self::from_str(ext)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRequest {
    pub method: String,
    pub uri: String,
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub body: Option<String>,
}

impl RecordedRequest {
    pub fn new<M, U>(method: M, uri: U) -> Self
    where
        M: AsRef<str>,
        U: AsRef<str>,
    {
        Self {
            method: method.as_ref().to_uppercase(),
            uri: uri.as_ref().to_string(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Whether this request has the given method (compared without regard to
    /// case) and URI.
    pub fn matches(&self, method: &str, uri: &str) -> bool {
        self.method.eq_ignore_ascii_case(method) && self.uri == uri
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub string: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedResponse {
    pub status: Status,
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub body: Body,
}

impl RecordedResponse {
    /// Rebuild the recorded response. Elapsed time is not recorded, so it is
    /// zero.
    pub fn to_response(&self) -> Response {
        let headers = self
            .headers
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |value| (name, value)))
            .collect::<Headers>();
        Response::new(self.status.code)
            .with_reason(&self.status.message)
            .with_headers(headers)
            .with_body(self.body.string.as_bytes())
    }
}

/// Bodies that are not valid UTF-8 are recorded lossily.
impl From<&Response> for RecordedResponse {
    fn from(response: &Response) -> Self {
        let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in response.headers().iter() {
            headers
                .entry(name.to_string())
                .or_default()
                .push(value.to_string());
        }
        Self {
            status: Status {
                code: response.status(),
                message: response.reason().to_string(),
            },
            headers,
            body: Body {
                string: String::from_utf8_lossy(response.body()).into_owned(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub request: RecordedRequest,
    pub response: RecordedResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cassette {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

fn default_version() -> u32 {
    CASSETTE_VERSION
}

impl Default for Cassette {
    fn default() -> Self {
        Self {
            version: CASSETTE_VERSION,
            interactions: Vec::new(),
        }
    }
}

impl Cassette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse<S: AsRef<str>>(content: S) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(content.as_ref())?)
    }

    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load a cassette from the given YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Attempting to load cassette from: {}", path.display());
        let _ = SupportedFormat::of_path(path)?;
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Io(path.display().to_string(), e))
            .wrap_err_with(|| Error::FailedToLoadCassette(path.to_path_buf()))?;
        let cassette =
            Self::parse(content).wrap_err_with(|| Error::FailedToLoadCassette(path.to_path_buf()))?;
        debug!(
            "Loaded {} interaction(s) from {}",
            cassette.len(),
            path.display()
        );
        Ok(cassette)
    }

    /// Write this cassette to the given YAML file, replacing any existing
    /// file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let _ = SupportedFormat::of_path(path)?;
        let content = self
            .to_yaml()
            .wrap_err_with(|| Error::FailedToSaveCassette(path.to_path_buf()))?;
        fs::write(path, content)
            .map_err(|e| Error::Io(path.display().to_string(), e))
            .wrap_err_with(|| Error::FailedToSaveCassette(path.to_path_buf()))?;
        debug!("Saved {} interaction(s) to {}", self.len(), path.display());
        Ok(())
    }

    /// The first interaction whose request has the given method and URI.
    pub fn find(&self, method: &str, uri: &str) -> Option<&Interaction> {
        self.interactions
            .iter()
            .find(|i| i.request.matches(method, uri))
    }

    /// Whether a matching interaction has already been recorded.
    pub fn contains(&self, method: &str, uri: &str) -> bool {
        self.find(method, uri).is_some()
    }

    /// Replay the first interaction matching the given method and URI.
    pub fn replay(&self, method: &str, uri: &str) -> Result<Response, Error> {
        self.find(method, uri)
            .map(|i| i.response.to_response())
            .ok_or_else(|| Error::NoSuchInteraction(method.to_uppercase(), uri.to_string()))
    }

    /// Record an interaction unless one with the same method and URI is
    /// already present. Returns whether the interaction was added.
    pub fn record(&mut self, request: RecordedRequest, response: &Response) -> bool {
        if self.contains(&request.method, &request.uri) {
            debug!(
                "Interaction {} {} already recorded, keeping the existing one",
                request.method, request.uri
            );
            return false;
        }
        self.interactions.push(Interaction {
            request,
            response: response.into(),
        });
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interaction> {
        self.interactions.iter()
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }
}

/// A set of cassettes loaded from the file system.
#[derive(Debug, Clone, Default)]
pub struct CassetteLibrary {
    cassettes: Vec<(PathBuf, Cassette)>,
}

impl CassetteLibrary {
    /// Load all cassette files matching any of the given glob patterns.
    /// Fails if no cassette files match at all.
    pub fn load<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut cassettes = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let paths = glob::glob(pattern)
                .map_err(|e| Error::CassettePattern(pattern.to_string(), e))?;
            for entry_result in paths {
                let entry = entry_result.map_err(Error::from)?;
                if entry.is_file() {
                    let cassette = Cassette::load(&entry)?;
                    cassettes.push((entry, cassette));
                }
            }
        }
        if cassettes.is_empty() {
            Err(Error::NoCassettesFound.into())
        } else {
            Ok(Self { cassettes })
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.cassettes.iter().map(|(path, _)| path.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Cassette)> {
        self.cassettes
            .iter()
            .map(|(path, cassette)| (path.as_path(), cassette))
    }

    /// The first matching interaction across all cassettes, in load order.
    pub fn find(&self, method: &str, uri: &str) -> Option<&Interaction> {
        self.cassettes
            .iter()
            .find_map(|(_, cassette)| cassette.find(method, uri))
    }

    pub fn replay(&self, method: &str, uri: &str) -> Result<Response, Error> {
        self.find(method, uri)
            .map(|i| i.response.to_response())
            .ok_or_else(|| Error::NoSuchInteraction(method.to_uppercase(), uri.to_string()))
    }

    pub fn len(&self) -> usize {
        self.cassettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cassettes.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CASSETTE: &str = r#"
interactions:
- request:
    body: null
    headers:
      Accept: ['*/*']
    method: GET
    uri: http://localhost:5000/get_json
  response:
    body: {string: '{"a": 1}'}
    headers:
      Content-Type: [application/json]
      Set-Cookie: [a=1, b=2]
    status: {code: 200, message: OK}
- request:
    method: POST
    uri: http://localhost:5000/get_json
  response:
    body: {string: ''}
    status: {code: 405, message: METHOD NOT ALLOWED}
version: 1
"#;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("restview-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn parse_and_find() {
        let cassette = Cassette::parse(CASSETTE).unwrap();
        assert_eq!(cassette.version, 1);
        assert_eq!(cassette.len(), 2);
        let interaction = cassette
            .find("get", "http://localhost:5000/get_json")
            .unwrap();
        assert_eq!(interaction.response.status.code, 200);
        assert_eq!(
            cassette
                .find("Post", "http://localhost:5000/get_json")
                .unwrap()
                .response
                .status
                .code,
            405
        );
        assert!(cassette.find("GET", "http://localhost:5000/other").is_none());
    }

    #[test]
    fn replay_builds_response() {
        let cassette = Cassette::parse(CASSETTE).unwrap();
        let resp = cassette
            .replay("GET", "http://localhost:5000/get_json")
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.reason(), "OK");
        assert_eq!(resp.content_type(), Some("application/json"));
        assert_eq!(
            resp.headers().get_all("set-cookie").collect::<Vec<_>>(),
            vec!["a=1", "b=2"]
        );
        assert_eq!(resp.body(), b"{\"a\": 1}");

        match cassette.replay("DELETE", "http://localhost:5000/get_json") {
            Err(Error::NoSuchInteraction(method, uri)) => {
                assert_eq!(method, "DELETE");
                assert_eq!(uri, "http://localhost:5000/get_json");
            }
            other => panic!("expected a missing interaction, got {:?}", other),
        }
    }

    #[test]
    fn record_save_and_reload() {
        let dir = temp_dir("cassette");
        let path = dir.join("recorded.yaml");

        let mut cassette = Cassette::new();
        let resp = Response::new(201)
            .with_reason("Created")
            .with_content_type("text/plain")
            .with_body("done");
        assert!(cassette.record(RecordedRequest::new("post", "http://example.com/items"), &resp));
        // Already recorded: the existing interaction is kept.
        let other = Response::new(500).with_body("oops");
        assert!(!cassette.record(RecordedRequest::new("POST", "http://example.com/items"), &other));
        cassette.save(&path).unwrap();

        let reloaded = Cassette::load(&path).unwrap();
        assert_eq!(reloaded, cassette);
        let replayed = reloaded.replay("POST", "http://example.com/items").unwrap();
        assert_eq!(replayed.status(), 201);
        assert_eq!(replayed.reason(), "Created");
        assert_eq!(replayed.content_type(), Some("text/plain"));
        assert_eq!(replayed.body(), b"done");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unsupported_extension() {
        let err = Cassette::load("cassette.json").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnsupportedFileType(ext)) if ext == "json"
        ));
    }

    #[test]
    fn library_from_globs() {
        let dir = temp_dir("library");
        fs::write(dir.join("one.yaml"), CASSETTE).unwrap();
        let mut second = Cassette::new();
        second.record(
            RecordedRequest::new("GET", "http://localhost:5000/get_csv"),
            &Response::new(200).with_content_type("text/csv").with_body("a,b\n1,2\n"),
        );
        second.save(dir.join("two.yml")).unwrap();

        let patterns = vec![
            format!("{}/*.yaml", dir.display()),
            format!("{}/*.yml", dir.display()),
        ];
        let library = CassetteLibrary::load(&patterns).unwrap();
        assert_eq!(library.len(), 2);
        let resp = library.replay("get", "http://localhost:5000/get_csv").unwrap();
        assert_eq!(resp.content_type(), Some("text/csv"));
        assert!(library.find("GET", "http://localhost:5000/get_json").is_some());

        let none = CassetteLibrary::load(&[format!("{}/*.nothing", dir.display())]).unwrap_err();
        assert!(matches!(
            none.downcast_ref::<Error>(),
            Some(Error::NoCassettesFound)
        ));
        fs::remove_dir_all(&dir).unwrap();
    }
}
