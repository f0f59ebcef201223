//! Restview turns received HTTP responses into things worth looking at.
//!
//! A response's content type is reduced to its essence (e.g.
//! `application/json`) and matched against an ordered [`Registry`] of
//! views. Every matching view renders the response into an [`Artifact`]: a
//! pretty-printed document, a typed table, an image, a map, a point cloud or
//! a decoded message. How those artifacts are presented is up to the host
//! application; the `restview-cli` crate prints them to the terminal.
//!
//! ```
//! use restview::{Config, Registry, Response};
//!
//! let registry = Registry::builtin(&Config::default()).unwrap();
//! let response = Response::new(200)
//!     .with_content_type("application/json")
//!     .with_body(r#"{"hello": "world"}"#);
//! let dispatch = registry.dispatch(&response);
//! assert_eq!(dispatch.names(), vec!["Raw", "JSON"]);
//! ```

pub mod artifact;
pub mod cassette;
mod config;
mod error;
mod essence;
pub mod geometry;
mod registry;
mod response;
mod summary;
mod view;
pub mod views;

pub use artifact::Artifact;
pub use cassette::{Cassette, CassetteLibrary, Interaction, RecordedRequest};
pub use config::{Config, DEFAULT_SUMMARY_TEMPLATE};
pub use error::Error;
pub use essence::{charset_of, Essence};
pub use geometry::{BoundingBox, LatLon};
pub use registry::{Dispatch, Outcome, Registry};
pub use response::{Headers, Response, DEFAULT_TEXT_ENCODING};
pub use summary::{cookies_json, headers_json, Summary, SummaryFields};
pub use view::{RenderFn, Rendering, ViewDescriptor};
