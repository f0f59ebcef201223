//! Views that show the response body as text: Raw, HTML and SVG.

use log::{debug, warn};

use crate::artifact::{Artifact, Text, TextFormat};
use crate::view::Rendering;
use crate::{Error, Response};

/// Render the body as text using its effective encoding. Bodies without an
/// encoding, or that cannot be decoded with it, are rendered as a byte
/// string literal instead. Never fails.
pub fn render_raw(response: &Response, max_rows: usize) -> Result<Rendering, Error> {
    let body = match response.encoding() {
        Some(encoding) => match decode(response.body(), &encoding) {
            Some(text) => text,
            None => {
                debug!(
                    "Failed to decode body as {}, showing raw bytes instead",
                    encoding
                );
                byte_repr(response.body())
            }
        },
        None => byte_repr(response.body()),
    };
    Ok(Artifact::Text(Text::new(TextFormat::Plain, body, max_rows)).into())
}

pub fn render_html(response: &Response, max_rows: usize) -> Result<Rendering, Error> {
    Ok(markup(response, TextFormat::Html, max_rows))
}

pub fn render_svg(response: &Response, max_rows: usize) -> Result<Rendering, Error> {
    Ok(markup(response, TextFormat::Svg, max_rows))
}

fn markup(response: &Response, format: TextFormat, max_rows: usize) -> Rendering {
    let body = match response.text() {
        Ok(text) => text.to_string(),
        Err(e) => {
            debug!("Markup body is not valid UTF-8 ({}), showing raw bytes", e);
            byte_repr(response.body())
        }
    };
    Artifact::Text(Text::new(format, body, max_rows)).into()
}

/// Decode the given bytes with the named text encoding. Returns `None` if the
/// encoding is not supported or the bytes are not valid in that encoding.
///
/// Supported encodings are UTF-8, ASCII and ISO-8859-1 (Latin-1), under
/// their common aliases.
pub fn decode(bytes: &[u8], encoding: &str) -> Option<String> {
    let normalized = encoding.trim().to_lowercase().replace('_', "-");
    match normalized.as_str() {
        "utf-8" | "utf8" | "u8" => std::str::from_utf8(bytes).ok().map(ToString::to_string),
        "ascii" | "us-ascii" | "646" => {
            if bytes.is_ascii() {
                Some(bytes.iter().map(|b| *b as char).collect())
            } else {
                None
            }
        }
        "iso-8859-1" | "iso8859-1" | "latin-1" | "latin1" | "l1" => {
            Some(bytes.iter().map(|b| *b as char).collect())
        }
        _ => {
            warn!("Unsupported text encoding: {}", encoding);
            None
        }
    }
}

/// A byte string literal representation of arbitrary bytes, e.g.
/// `b'caf\xc3\xa9\n'`.
///
/// Printable ASCII is kept as is, common control characters use their
/// escapes and everything else becomes a `\xNN` escape. The literal is
/// delimited with double quotes only when the bytes contain a single quote
/// but no double quote.
pub fn byte_repr(bytes: &[u8]) -> String {
    let quote = if bytes.contains(&b'\'') && !bytes.contains(&b'"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(bytes.len() + 3);
    out.push('b');
    out.push(quote);
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            _ if b as char == quote => {
                out.push('\\');
                out.push(quote);
            }
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out.push(quote);
    out
}

#[cfg(test)]
mod test {
    use super::*;

    fn body_of(rendering: Rendering) -> Text {
        match rendering {
            Rendering::Rendered(Artifact::Text(t)) => t,
            other => panic!("expected a text artifact, got {:?}", other),
        }
    }

    #[test]
    fn byte_reprs() {
        const TEST_CASES: &[(&[u8], &str)] = &[
            (b"", "b''"),
            (b"hello", "b'hello'"),
            (b"a\nb\tc\\", "b'a\\nb\\tc\\\\'"),
            (b"caf\xc3\xa9", "b'caf\\xc3\\xa9'"),
            (b"it's", "b\"it's\""),
            (b"it's \"quoted\"", "b'it\\'s \"quoted\"'"),
            (b"\x00\x7f", "b'\\x00\\x7f'"),
        ];
        for (input, expected) in TEST_CASES {
            assert_eq!(byte_repr(input), *expected);
        }
    }

    #[test]
    fn decode_with_encodings() {
        assert_eq!(decode(b"caf\xc3\xa9", "UTF-8").as_deref(), Some("café"));
        assert_eq!(decode(b"caf\xe9", "ISO-8859-1").as_deref(), Some("café"));
        assert_eq!(decode(b"caf\xe9", "latin_1").as_deref(), Some("café"));
        assert_eq!(decode(b"plain", "ascii").as_deref(), Some("plain"));
        assert_eq!(decode(b"caf\xe9", "ascii"), None);
        assert_eq!(decode(b"caf\xe9", "utf-8"), None);
        assert_eq!(decode(b"anything", "ebcdic"), None);
    }

    #[test]
    fn raw_uses_effective_encoding() {
        let resp = Response::new(200)
            .with_content_type("text/plain")
            .with_body(&b"caf\xe9\nline two"[..]);
        let text = body_of(render_raw(&resp, 10).unwrap());
        assert_eq!(text.format, TextFormat::Plain);
        assert_eq!(text.body, "café\nline two");
        assert_eq!(text.rows, 2);
    }

    #[test]
    fn raw_falls_back_to_bytes() {
        // No encoding at all for binary content.
        let resp = Response::new(200)
            .with_content_type("application/octet-stream")
            .with_body(vec![0xde, 0xad]);
        assert_eq!(body_of(render_raw(&resp, 10).unwrap()).body, "b'\\xde\\xad'");

        // Undecodable with the declared charset.
        let resp = Response::new(200)
            .with_content_type("application/json; charset=utf-8")
            .with_body(vec![b'{', 0xff, b'}']);
        assert_eq!(body_of(render_raw(&resp, 10).unwrap()).body, "b'{\\xff}'");

        // Unknown charset.
        let resp = Response::new(200)
            .with_content_type("text/plain; charset=klingon")
            .with_body("qapla'");
        assert_eq!(body_of(render_raw(&resp, 10).unwrap()).body, "b\"qapla'\"");
    }

    #[test]
    fn html_and_svg() {
        let resp = Response::new(200)
            .with_content_type("text/html")
            .with_body("<p>caf\u{e9}</p>");
        let text = body_of(render_html(&resp, 10).unwrap());
        assert_eq!(text.format, TextFormat::Html);
        assert_eq!(text.body, "<p>café</p>");

        let resp = Response::new(200)
            .with_content_type("image/svg+xml")
            .with_body(vec![b'<', 0xff, b'>']);
        let text = body_of(render_svg(&resp, 10).unwrap());
        assert_eq!(text.format, TextFormat::Svg);
        assert_eq!(text.body, "b'<\\xff>'");
    }
}
