//! View descriptors: a named set of MIME type patterns plus the function that
//! renders a matching response.

use std::fmt;
use std::sync::Arc;

use log::trace;
use regex::Regex;

use crate::{Artifact, Error, Essence, Response};

/// The outcome of successfully running a view's render function.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendering {
    /// The view produced something to display.
    Rendered(Artifact),
    /// The view decided that it has nothing meaningful to display for this
    /// response, despite its MIME type matching. Not an error.
    Absent,
}

impl From<Artifact> for Rendering {
    fn from(artifact: Artifact) -> Self {
        Self::Rendered(artifact)
    }
}

pub type RenderFn = dyn Fn(&Response) -> Result<Rendering, Error> + Send + Sync;

/// A view is a name, an ordered list of MIME type patterns and a render
/// function.
///
/// Patterns are regular expressions matched against the response's
/// [`Essence`], anchored at the start but not at the end, so `text/html` also
/// matches `text/htmlx`.
#[derive(Clone)]
pub struct ViewDescriptor {
    name: String,
    patterns: Vec<String>,
    compiled: Vec<Regex>,
    render: Arc<RenderFn>,
}

impl ViewDescriptor {
    /// Constructor. Fails if any of the patterns is not a valid regular
    /// expression.
    pub fn new<N, P, F>(name: N, patterns: &[P], render: F) -> Result<Self, Error>
    where
        N: AsRef<str>,
        P: AsRef<str>,
        F: Fn(&Response) -> Result<Rendering, Error> + Send + Sync + 'static,
    {
        let name = name.as_ref().to_string();
        let patterns = patterns
            .iter()
            .map(|p| p.as_ref().to_string())
            .collect::<Vec<String>>();
        let compiled = patterns
            .iter()
            .map(|p| {
                Regex::new(&format!("^(?:{})", p))
                    .map_err(|e| Error::InvalidPattern(name.clone(), e))
            })
            .collect::<Result<Vec<Regex>, Error>>()?;
        Ok(Self {
            name,
            patterns,
            compiled,
            render: Arc::new(render),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The patterns as they were given to the constructor.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns the first of this view's patterns that matches the given
    /// essence, if any.
    pub fn matching_pattern(&self, essence: &Essence) -> Option<&str> {
        let essence = essence.to_string();
        self.compiled
            .iter()
            .zip(self.patterns.iter())
            .find(|(re, pattern)| {
                let is_match = re.is_match(&essence);
                trace!(
                    "View {} pattern {} vs {}: {}",
                    self.name,
                    pattern,
                    essence,
                    is_match
                );
                is_match
            })
            .map(|(_, pattern)| pattern.as_str())
    }

    pub fn matches(&self, essence: &Essence) -> bool {
        self.matching_pattern(essence).is_some()
    }

    /// Whether one of the patterns matches every essence, including none at
    /// all. Only such views render responses without a usable content type.
    pub fn accepts_any_content_type(&self) -> bool {
        self.compiled.iter().any(|re| re.is_match(""))
    }

    /// Run this view's render function against the given response.
    pub fn render(&self, response: &Response) -> Result<Rendering, Error> {
        (self.render)(response)
    }
}

impl fmt::Debug for ViewDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewDescriptor")
            .field("name", &self.name)
            .field("patterns", &self.patterns)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::artifact::{Text, TextFormat};

    fn noop(_: &Response) -> Result<Rendering, Error> {
        Ok(Rendering::Absent)
    }

    #[test]
    fn catch_all_patterns() {
        const TEST_CASES: &[(&[&str], bool)] = &[
            (&[".*"], true),
            (&["text/html", ".*"], true),
            (&["(text/.*)?"], true),
            (&["text/.*"], false),
            (&["image/.*", "application/json"], false),
            (&[], false),
        ];
        for (patterns, expected) in TEST_CASES {
            let view = ViewDescriptor::new("View", *patterns, noop).unwrap();
            assert_eq!(view.accepts_any_content_type(), *expected, "{:?}", patterns);
        }
    }

    #[test]
    fn patterns_are_anchored_at_start() {
        let view = ViewDescriptor::new("HTML", &["text/html.*"], noop).unwrap();
        const TEST_CASES: &[(&str, bool)] = &[
            ("text/html", true),
            ("text/htmlx", true),
            ("application/text/html", false),
            ("text/plain", false),
        ];
        for (essence, expected) in TEST_CASES {
            let essence = Essence::parse(essence).unwrap();
            assert_eq!(view.matches(&essence), *expected, "essence {}", essence);
        }
    }

    #[test]
    fn alternation_stays_anchored() {
        let view = ViewDescriptor::new("either", &["text|image"], noop).unwrap();
        assert!(view.matches(&Essence::parse("image/png").unwrap()));
        assert!(!view.matches(&Essence::parse("application/image").unwrap()));
    }

    #[test]
    fn first_matching_pattern() {
        let view = ViewDescriptor::new(
            "JSON",
            &["application/json.*", "application/vnd\\..*\\+json.*"],
            noop,
        )
        .unwrap();
        let essence = Essence::parse("application/vnd.geo+json").unwrap();
        assert_eq!(
            view.matching_pattern(&essence),
            Some("application/vnd\\..*\\+json.*")
        );
    }

    #[test]
    fn invalid_pattern() {
        match ViewDescriptor::new("broken", &["text/("], noop) {
            Err(Error::InvalidPattern(name, _)) => assert_eq!(name, "broken"),
            other => panic!("expected an invalid pattern error, got {:?}", other),
        }
    }

    #[test]
    fn render_calls_function() {
        let view = ViewDescriptor::new("Echo", &[".*"], |resp: &Response| {
            Ok(Artifact::Text(Text::new(
                TextFormat::Plain,
                resp.reason().to_string(),
                10,
            ))
            .into())
        })
        .unwrap();
        let resp = Response::new(200).with_reason("OK");
        match view.render(&resp).unwrap() {
            Rendering::Rendered(Artifact::Text(t)) => assert_eq!(t.body, "OK"),
            other => panic!("unexpected rendering: {:?}", other),
        }
    }
}
