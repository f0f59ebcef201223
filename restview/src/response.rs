//! The HTTP response model consumed by views.

use std::borrow::Cow;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::essence::{charset_of, Essence};
use crate::Error;

/// The encoding assumed for `text/*` responses that do not declare a charset.
pub const DEFAULT_TEXT_ENCODING: &str = "ISO-8859-1";

/// An ordered list of header entries whose names are compared without regard
/// to case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header. Existing entries with the same name are kept.
    pub fn insert<K, V>(&mut self, name: K, value: V)
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.0
            .push((name.as_ref().to_string(), value.as_ref().to_string()));
    }

    /// The value of the first header with the given name.
    pub fn get<K: AsRef<str>>(&self, name: K) -> Option<&str> {
        self.get_all(name).next()
    }

    /// All values of headers with the given name, in insertion order.
    pub fn get_all<K: AsRef<str>>(&self, name: K) -> impl Iterator<Item = &str> {
        let name = name.as_ref().to_string();
        self.0
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(&name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key<K: AsRef<str>>(&self, name: K) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries sorted by header name ignoring case, for display. Entries
    /// with the same name keep their insertion order.
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut entries = self.iter().collect::<Vec<_>>();
        entries.sort_by_cached_key(|(name, _)| name.to_ascii_lowercase());
        entries
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

/// A received HTTP response.
///
/// Responses are assembled once through the `with_*` builder methods and are
/// read-only from then on. Every view receives the same response.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    reason: String,
    headers: Headers,
    body: Vec<u8>,
    encoding: Option<String>,
    elapsed: Duration,
}

impl Response {
    /// Constructor.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            reason: String::new(),
            headers: Headers::new(),
            body: Vec::new(),
            encoding: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_reason<S: AsRef<str>>(mut self, reason: S) -> Self {
        self.reason = reason.as_ref().to_string();
        self
    }

    pub fn with_header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_content_type<S: AsRef<str>>(self, content_type: S) -> Self {
        self.with_header("Content-Type", content_type)
    }

    pub fn with_body<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    /// Explicitly declare the text encoding of the body, overriding whatever
    /// the `Content-Type` header says.
    pub fn with_encoding<S: AsRef<str>>(mut self, encoding: S) -> Self {
        self.encoding = Some(encoding.as_ref().to_string());
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("Content-Type")
    }

    /// Derive the essence of this response's content type. This is computed
    /// afresh on every call.
    pub fn essence(&self) -> Result<Essence, Error> {
        let content_type = self.content_type().ok_or(Error::MissingContentType)?;
        Essence::parse(content_type)
    }

    /// The effective text encoding of the body: an explicitly declared
    /// encoding, else the content type's `charset` parameter, else
    /// [`DEFAULT_TEXT_ENCODING`] for `text/*` content. Other content has no
    /// encoding.
    pub fn encoding(&self) -> Option<Cow<'_, str>> {
        if let Some(encoding) = &self.encoding {
            return Some(Cow::Borrowed(encoding.as_str()));
        }
        let content_type = self.content_type()?;
        if let Some(charset) = charset_of(content_type) {
            return Some(Cow::Owned(charset));
        }
        match Essence::parse(content_type) {
            Ok(essence) if essence.maintype() == "text" => {
                Some(Cow::Borrowed(DEFAULT_TEXT_ENCODING))
            }
            _ => None,
        }
    }

    /// The cookies set by this response as `(name, value)` pairs, in header
    /// order. Only the leading `name=value` of each `Set-Cookie` header is
    /// used; attributes such as `Path` or `Expires` are ignored, as are
    /// headers without a cookie name.
    pub fn cookies(&self) -> Vec<(&str, &str)> {
        self.headers
            .get_all("Set-Cookie")
            .filter_map(|header| {
                let pair = header.split(';').next().unwrap_or_default();
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    None
                } else {
                    Some((name, value.trim()))
                }
            })
            .collect()
    }

    /// The body as UTF-8 text.
    pub fn text(&self) -> Result<&str, Error> {
        Ok(std::str::from_utf8(&self.body)?)
    }
}
