//! Typed header codecs (C7, spec §4.3) built on the `headers` crate's
//! `Header` trait, which decodes/encodes directly against `http::HeaderValue`
//! and has no dependency on any particular HTTP transport or async runtime
//! -- unlike the teacher's own `typed_headers` shim (`src/typed_headers.rs`,
//! not carried into this crate), which existed only to give the old
//! hyper-0.x generation something to `typed_get`/`typed_insert` against.
//!
//! Grounded on the teacher's `src/davheaders.rs`: the same `Depth`,
//! `Destination`, `Overwrite`, `Timeout` header set. The old generation's
//! hand-rolled `If`-header state machine has no counterpart here: spec §4.3
//! only ever needs the first `<opaquelocktoken:...>` out of `Lock-Token` or
//! `If` (see `extract_opaque_token`, used from `request.rs`), not a full
//! RFC-4918 If-header grammar evaluator.

use std::fmt;

use headers::{Error as HeaderError, Header, HeaderName, HeaderValue};
use regex::Regex;

lazy_static! {
    static ref DEPTH_NAME: HeaderName = HeaderName::from_static("depth");
    static ref OVERWRITE_NAME: HeaderName = HeaderName::from_static("overwrite");
    static ref DESTINATION_NAME: HeaderName = HeaderName::from_static("destination");
    static ref TIMEOUT_NAME: HeaderName = HeaderName::from_static("timeout");
    static ref RE_ABSOLUTE_URL: Regex = Regex::new(r"^https?://[^/]*([^#?]*).*$").unwrap();
    static ref RE_OPAQUE_TOKEN: Regex = Regex::new(r"opaquelocktoken:([^>\s]+)").unwrap();
}

/// spec §4.3 `Depth`: `0`, `1`, or `infinity` -> sentinel 32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Zero,
    One,
    Infinity,
}

impl Depth {
    /// `infinity` collapses to 32, the traversal-depth cap spec §4.5/§8 invariant 11 requires.
    pub fn as_levels(self) -> u32 {
        match self {
            Depth::Zero => 0,
            Depth::One => 1,
            Depth::Infinity => 32,
        }
    }
}

impl Header for Depth {
    fn name() -> &'static HeaderName {
        &DEPTH_NAME
    }

    fn decode<'i, I: Iterator<Item = &'i HeaderValue>>(values: &mut I) -> Result<Self, HeaderError> {
        let value = values.next().ok_or_else(HeaderError::invalid)?;
        match value.as_bytes() {
            b"0" => Ok(Depth::Zero),
            b"1" => Ok(Depth::One),
            v if v.eq_ignore_ascii_case(b"infinity") => Ok(Depth::Infinity),
            _ => Err(HeaderError::invalid()),
        }
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        let s = match self {
            Depth::Zero => "0",
            Depth::One => "1",
            Depth::Infinity => "infinity",
        };
        values.extend(std::iter::once(HeaderValue::from_static(s)));
    }
}

/// spec §4.3 `Overwrite`: `T` -> true, anything else -> false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overwrite(pub bool);

impl Header for Overwrite {
    fn name() -> &'static HeaderName {
        &OVERWRITE_NAME
    }

    fn decode<'i, I: Iterator<Item = &'i HeaderValue>>(values: &mut I) -> Result<Self, HeaderError> {
        let value = values.next().ok_or_else(HeaderError::invalid)?;
        Ok(Overwrite(value.as_bytes() == b"T"))
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        let s = if self.0 { "T" } else { "F" };
        values.extend(std::iter::once(HeaderValue::from_static(s)));
    }
}

/// spec §4.3 `Destination`: parsed as a URL, only the (already-decoded by
/// the transport) path component is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination(pub String);

impl Header for Destination {
    fn name() -> &'static HeaderName {
        &DESTINATION_NAME
    }

    fn decode<'i, I: Iterator<Item = &'i HeaderValue>>(values: &mut I) -> Result<Self, HeaderError> {
        let value = values.next().ok_or_else(HeaderError::invalid)?;
        let s = value.to_str().map_err(|_| HeaderError::invalid())?;
        if s.starts_with('/') {
            return Ok(Destination(s.to_string()));
        }
        match RE_ABSOLUTE_URL.captures(s) {
            Some(caps) => Ok(Destination(caps.get(1).map_or("", |m| m.as_str()).to_string())),
            None => Err(HeaderError::invalid()),
        }
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        if let Ok(v) = HeaderValue::from_str(&self.0) {
            values.extend(std::iter::once(v));
        }
    }
}

/// A single `Timeout` header value (spec §6 "Second-300"; `Infinite` is a
/// valid client request but the server never grants it -- see
/// `lock::default_timeout`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DavTimeout {
    Seconds(u32),
    Infinite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeout(pub Vec<DavTimeout>);

impl Header for Timeout {
    fn name() -> &'static HeaderName {
        &TIMEOUT_NAME
    }

    fn decode<'i, I: Iterator<Item = &'i HeaderValue>>(values: &mut I) -> Result<Self, HeaderError> {
        let value = values.next().ok_or_else(HeaderError::invalid)?;
        let s = value.to_str().map_err(|_| HeaderError::invalid())?;
        let mut out = Vec::new();
        for word in s.split(',') {
            let word = word.trim();
            if word.eq_ignore_ascii_case("infinite") {
                out.push(DavTimeout::Infinite);
            } else if let Some(n) = word.strip_prefix("Second-") {
                out.push(DavTimeout::Seconds(n.parse().map_err(|_| HeaderError::invalid())?));
            } else {
                return Err(HeaderError::invalid());
            }
        }
        Ok(Timeout(out))
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        let rendered = self
            .0
            .iter()
            .map(|t| match t {
                DavTimeout::Infinite => "Infinite".to_string(),
                DavTimeout::Seconds(n) => format!("Second-{}", n),
            })
            .collect::<Vec<_>>()
            .join(", ");
        if let Ok(v) = HeaderValue::from_str(&rendered) {
            values.extend(std::iter::once(v));
        }
    }
}

/// Extracts the first `opaquelocktoken:...` out of a raw `Lock-Token` or
/// `If` header value (spec §4.3). Malformed/absent input yields `None`
/// rather than a parse error, matching the spec's "null fields" policy.
pub fn extract_opaque_token(raw: &str) -> Option<String> {
    RE_OPAQUE_TOKEN.captures(raw).map(|c| c[1].to_string())
}

/// Extracts the first `<D:href>...</D:href>` out of a `LOCK` request body
/// (spec §4.3 `lockowner`).
pub fn extract_lockowner(body: &str) -> Option<String> {
    lazy_static! {
        static ref RE_OWNER_HREF: Regex = Regex::new(r"(?s)<[A-Za-z0-9]*:?href>(.*?)</[A-Za-z0-9]*:?href>").unwrap();
    }
    RE_OWNER_HREF.captures(body).map(|c| c[1].trim().to_string())
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
