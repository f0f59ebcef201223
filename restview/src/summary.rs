//! A one-line summary of a response's status and a display form of its
//! headers.

use handlebars::Handlebars;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::views::to_pretty_string;
use crate::{Config, Error, Response};

const TEMPLATE_NAME: &str = "summary";

/// The values available to the summary template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryFields {
    pub code: u16,
    pub reason: String,
    /// The effective text encoding, or `none`.
    pub encoding: String,
    /// Elapsed seconds with millisecond precision.
    pub elapsed: String,
    /// The `Content-Length` header, or `?` if there is none.
    pub length: String,
    pub cached: bool,
}

impl SummaryFields {
    pub fn new(response: &Response, cached: bool) -> Self {
        Self {
            code: response.status(),
            reason: response.reason().to_string(),
            encoding: response
                .encoding()
                .map(|e| e.into_owned())
                .unwrap_or_else(|| "none".to_string()),
            elapsed: format!("{:.3}", response.elapsed().as_secs_f64()),
            length: response
                .headers()
                .get("Content-Length")
                .unwrap_or("?")
                .to_string(),
            cached,
        }
    }
}

/// Renders response summaries through a
/// [Handlebars](https://handlebarsjs.com/) template.
pub struct Summary {
    hb: Handlebars<'static>,
}

impl Summary {
    /// Compile the given template. Fails if it is not a valid Handlebars
    /// template.
    pub fn new<S: AsRef<str>>(template: S) -> Result<Self, Error> {
        let mut hb = Handlebars::new();
        hb.set_strict_mode(true);
        // The summary is plain text.
        hb.register_escape_fn(handlebars::no_escape);
        hb.register_template_string(TEMPLATE_NAME, template.as_ref())?;
        Ok(Self { hb })
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Self::new(&config.summary_template)
    }

    pub fn render(&self, response: &Response, cached: bool) -> Result<String, Error> {
        self.render_fields(&SummaryFields::new(response, cached))
    }

    pub fn render_fields(&self, fields: &SummaryFields) -> Result<String, Error> {
        Ok(self.hb.render(TEMPLATE_NAME, fields)?)
    }
}

/// The response headers as a JSON object sorted by name, pretty-printed with
/// the given indent. Header names are compared ignoring case: repeated
/// headers are joined with `, ` under the first spelling seen.
pub fn headers_json(response: &Response, indent: usize) -> Result<String, Error> {
    let mut map = Map::new();
    for (name, value) in response.headers().sorted() {
        let existing = map
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, existing)| existing);
        match existing {
            Some(JsonValue::String(existing)) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            _ => {
                map.insert(name.to_string(), JsonValue::String(value.to_string()));
            }
        }
    }
    to_pretty_string(&JsonValue::Object(map), indent)
}

/// The cookies set by the response as a JSON object, pretty-printed with the
/// given indent. A cookie set more than once keeps its last value.
pub fn cookies_json(response: &Response, indent: usize) -> Result<String, Error> {
    let map = response
        .cookies()
        .into_iter()
        .map(|(name, value)| (name.to_string(), JsonValue::String(value.to_string())))
        .collect::<Map<String, JsonValue>>();
    to_pretty_string(&JsonValue::Object(map), indent)
}
