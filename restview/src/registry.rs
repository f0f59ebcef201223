use log::{debug, trace, warn};

use crate::view::Rendering;
use crate::{views, Artifact, Config, Error, Essence, Response, ViewDescriptor};

/// An ordered collection of views.
///
/// Order is significant: views are dispatched in registration order, and
/// that is the order of the results. Names are not required to be unique.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    views: Vec<ViewDescriptor>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding all of the built-in views, configured from the
    /// given configuration.
    pub fn builtin(config: &Config) -> Result<Self, Error> {
        Ok(Self {
            views: views::builtin(config)?,
        })
    }

    /// Append the given views after the ones already registered.
    pub fn with_additional<I>(mut self, views: I) -> Self
    where
        I: IntoIterator<Item = ViewDescriptor>,
    {
        for view in views {
            self.push(view);
        }
        self
    }

    pub fn push(&mut self, view: ViewDescriptor) {
        if self.views.iter().any(|v| v.name() == view.name()) {
            warn!("Registering another view named {}", view.name());
        }
        debug!("Registered view {}", view.name());
        self.views.push(view);
    }

    /// The names of all registered views, in order.
    pub fn names(&self) -> Vec<&str> {
        self.views.iter().map(ViewDescriptor::name).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ViewDescriptor> {
        self.views.iter().find(|v| v.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewDescriptor> {
        self.views.iter()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Render the given response with every view whose patterns match its
    /// essence.
    ///
    /// Each matching view renders exactly once, even if several of its
    /// patterns match. Views that decline to render are left out of the
    /// result. A view that fails does not stop the remaining views from
    /// rendering; its error is recorded in the result instead.
    ///
    /// If the `Content-Type` header is missing or malformed there is no
    /// essence to match. Only views that accept any content type (such as
    /// Raw) render then, and the error is kept as the dispatch's essence.
    pub fn dispatch(&self, response: &Response) -> Dispatch {
        let essence = response.essence();
        match &essence {
            Ok(essence) => debug!("Dispatching response with essence {}", essence),
            Err(e) => warn!("Dispatching response without an essence: {}", e),
        }
        let mut outcomes = Vec::new();
        for view in self.views.iter() {
            match &essence {
                Ok(essence) => match view.matching_pattern(essence) {
                    Some(pattern) => {
                        debug!("View {} matched {} with {}", view.name(), essence, pattern)
                    }
                    None => {
                        trace!("View {} skipped", view.name());
                        continue;
                    }
                },
                Err(_) if view.accepts_any_content_type() => {
                    debug!("View {} accepts any content type", view.name())
                }
                Err(_) => {
                    trace!("View {} skipped", view.name());
                    continue;
                }
            }
            match view.render(response) {
                Ok(Rendering::Rendered(artifact)) => {
                    debug!("View {} rendered a {} artifact", view.name(), artifact.kind());
                    outcomes.push(Outcome {
                        view: view.name().to_string(),
                        result: Ok(artifact),
                    });
                }
                Ok(Rendering::Absent) => {
                    debug!("View {} has nothing to show", view.name());
                }
                Err(e) => {
                    warn!("View {} failed: {}", view.name(), e);
                    outcomes.push(Outcome {
                        view: view.name().to_string(),
                        result: Err(e),
                    });
                }
            }
        }
        Dispatch { essence, outcomes }
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a ViewDescriptor;
    type IntoIter = std::slice::Iter<'a, ViewDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.views.iter()
    }
}

/// The result of running one view.
#[derive(Debug)]
pub struct Outcome {
    pub view: String,
    pub result: Result<Artifact, Error>,
}

/// Everything a dispatch produced, in registry order.
#[derive(Debug)]
pub struct Dispatch {
    essence: Result<Essence, Error>,
    outcomes: Vec<Outcome>,
}

impl Dispatch {
    /// The essence the views were matched against, or the reason the
    /// response's `Content-Type` did not yield one.
    pub fn essence(&self) -> Result<&Essence, &Error> {
        self.essence.as_ref()
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<Outcome> {
        self.outcomes
    }

    /// The successfully rendered artifacts with the names of their views.
    pub fn artifacts(&self) -> impl Iterator<Item = (&str, &Artifact)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Ok(artifact) => Some((o.view.as_str(), artifact)),
            Err(_) => None,
        })
    }

    /// The views that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Ok(_) => None,
            Err(e) => Some((o.view.as_str(), e)),
        })
    }

    /// The outcome of the first view with the given name.
    pub fn get(&self, view: &str) -> Option<&Result<Artifact, Error>> {
        self.outcomes
            .iter()
            .find(|o| o.view == view)
            .map(|o| &o.result)
    }

    /// Names of all views that produced an outcome, in order.
    pub fn names(&self) -> Vec<&str> {
        self.outcomes.iter().map(|o| o.view.as_str()).collect()
    }

    /// The view that should be shown initially: the last one that rendered
    /// successfully.
    pub fn selected(&self) -> Option<&str> {
        self.artifacts().last().map(|(name, _)| name)
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::artifact::{Text, TextFormat};
    use crate::views::{GEOJSON, GPX, JSON, PROTOBUF, RAW};

    fn builtin() -> Registry {
        Registry::builtin(&Config::default()).unwrap()
    }

    fn only(names: &[&str]) -> Registry {
        let all = builtin();
        Registry::new().with_additional(names.iter().filter_map(|n| all.get(n).cloned()))
    }

    #[test]
    fn json_renders_under_json_and_raw() {
        let resp = Response::new(200)
            .with_content_type("application/json; charset=utf-8")
            .with_body(r#"{"a": [1, 2, {"b": null}]}"#);
        let dispatch = builtin().dispatch(&resp);
        assert_eq!(dispatch.essence().unwrap().to_string(), "application/json");
        assert_eq!(dispatch.names(), vec![RAW, JSON]);
        assert_eq!(dispatch.failures().count(), 0);
        assert_eq!(dispatch.selected(), Some(JSON));

        let pretty = match dispatch.get(JSON) {
            Some(Ok(Artifact::Text(t))) => t.body.clone(),
            other => panic!("expected JSON text, got {:?}", other),
        };
        let reparsed: serde_json::Value = serde_json::from_str(&pretty).unwrap();
        let original: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(reparsed, original);
    }

    #[test]
    fn non_collection_geojson_is_absent() {
        let resp = Response::new(200)
            .with_content_type("application/vnd.geo+json")
            .with_body(r#"{"type": "Point", "coordinates": [13.4, 52.5]}"#);
        let dispatch = only(&[RAW, GEOJSON]).dispatch(&resp);
        assert_eq!(dispatch.names(), vec![RAW]);
        assert!(dispatch.get(GEOJSON).is_none());
    }

    #[test]
    fn malformed_gpx_still_renders_raw() {
        let resp = Response::new(200)
            .with_content_type("application/gpx+xml")
            .with_body("<gpx><trk></gpx>");
        let dispatch = builtin().dispatch(&resp);
        assert_eq!(dispatch.names(), vec![RAW]);
        assert!(dispatch.get(GPX).is_none());
        assert!(matches!(dispatch.get(RAW), Some(Ok(Artifact::Text(_)))));
    }

    #[test]
    fn failing_view_is_isolated() {
        let resp = Response::new(200)
            .with_content_type("application/x-protobuf")
            .with_body(&b"\x08\x01garbage"[..]);
        let dispatch = builtin().dispatch(&resp);
        assert_eq!(dispatch.names(), vec![RAW, PROTOBUF]);
        assert!(matches!(dispatch.get(RAW), Some(Ok(Artifact::Text(_)))));
        let failures = dispatch.failures().collect::<Vec<_>>();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, PROTOBUF);
        assert!(matches!(failures[0].1, Error::Protobuf(_)));
        assert_eq!(dispatch.selected(), Some(RAW));
    }

    #[test]
    fn order_follows_registry() {
        let resp = Response::new(200)
            .with_content_type("application/json")
            .with_body("[]");
        let dispatch = only(&[RAW, JSON, GEOJSON]).dispatch(&resp);
        assert_eq!(dispatch.names(), vec![RAW, JSON]);

        let dispatch = only(&[JSON, RAW]).dispatch(&resp);
        assert_eq!(dispatch.names(), vec![JSON, RAW]);
    }

    #[test]
    fn renders_once_per_view() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let view = ViewDescriptor::new(
            "Counting",
            &["application/.*", "application/json", ".*"],
            move |_: &Response| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Rendering::Absent)
            },
        )
        .unwrap();
        let registry = Registry::new().with_additional(vec![view]);
        let resp = Response::new(200).with_content_type("application/json");
        let dispatch = registry.dispatch(&resp);
        assert!(dispatch.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_names_are_allowed() {
        let custom = ViewDescriptor::new(RAW, &["application/json"], |_: &Response| {
            Ok(Artifact::Text(Text::new(TextFormat::Plain, "custom", 10)).into())
        })
        .unwrap();
        let registry = only(&[RAW]).with_additional(vec![custom]);
        assert_eq!(registry.names(), vec![RAW, RAW]);
        let resp = Response::new(200)
            .with_content_type("application/json")
            .with_body("{}");
        let dispatch = registry.dispatch(&resp);
        assert_eq!(dispatch.artifacts().count(), 2);
        match dispatch.artifacts().last() {
            Some((_, Artifact::Text(t))) => assert_eq!(t.body, "custom"),
            other => panic!("unexpected artifact: {:?}", other),
        }
    }

    #[test]
    fn bad_content_type_renders_raw_only() {
        let registry = builtin();
        let missing = registry.dispatch(&Response::new(200).with_body("hello"));
        assert!(matches!(missing.essence(), Err(Error::MissingContentType)));
        assert_eq!(missing.names(), vec![RAW]);
        match missing.get(RAW) {
            Some(Ok(Artifact::Text(t))) => assert_eq!(t.body, "b'hello'"),
            other => panic!("expected raw text, got {:?}", other),
        }

        let malformed = registry.dispatch(
            &Response::new(200)
                .with_content_type("nonsense")
                .with_body("{}"),
        );
        assert!(matches!(
            malformed.essence(),
            Err(Error::MalformedContentType(_))
        ));
        assert_eq!(malformed.names(), vec![RAW]);
        assert_eq!(malformed.selected(), Some(RAW));
    }

    #[test]
    fn catch_all_views_render_without_essence() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let typed = ViewDescriptor::new("Typed", &["application/json"], move |_: &Response| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Rendering::Absent)
        })
        .unwrap();
        let any = ViewDescriptor::new("Any", &["application/json", ".*"], |_: &Response| {
            Ok(Artifact::Text(Text::new(TextFormat::Plain, "any", 10)).into())
        })
        .unwrap();
        let registry = Registry::new().with_additional(vec![typed, any]);
        let dispatch = registry.dispatch(&Response::new(204));
        assert_eq!(dispatch.names(), vec!["Any"]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
