//! Content type parsing.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::Error;

lazy_static! {
    static ref CONTENT_TYPE: Regex = Regex::new(r"^(\w+)/([.+\-\w]+)(;.*)?").unwrap();
    static ref CHARSET: Regex =
        Regex::new(r#"(?i);\s*charset\s*=\s*"?([^";\s]+)"?"#).unwrap();
}

/// The `maintype/subtype` part of a content type, with any parameters
/// stripped and normalized to lowercase.
///
/// Views match their MIME type patterns against this value and never against
/// the full header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Essence {
    maintype: String,
    subtype: String,
}

impl Essence {
    /// Parse the essence out of a `Content-Type` header value, e.g.
    /// `application/json; charset=utf-8` yields `application/json`.
    pub fn parse(content_type: &str) -> Result<Self, Error> {
        let captures = CONTENT_TYPE
            .captures(content_type.trim())
            .ok_or_else(|| Error::MalformedContentType(content_type.to_string()))?;
        Ok(Self {
            maintype: captures[1].to_lowercase(),
            subtype: captures[2].to_lowercase(),
        })
    }

    pub fn maintype(&self) -> &str {
        &self.maintype
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }
}

impl FromStr for Essence {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Essence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.maintype, self.subtype)
    }
}

/// Extract the value of the `charset` parameter from a `Content-Type` header
/// value, if there is one.
pub fn charset_of(content_type: &str) -> Option<String> {
    CHARSET
        .captures(content_type)
        .map(|captures| captures[1].to_lowercase())
}
