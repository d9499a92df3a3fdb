//! Request Model (C7, spec §4.3): turns a raw method/path/header-map/body
//! quadruplet into a single typed [`DavRequest`] the dispatcher matches on,
//! so no handler touches `http::HeaderMap` directly.
//!
//! Grounded on `original_source/webdavdlib/requests.py`'s `WebDAVRequest`:
//! the same flattened field list (`depth`, `overwrite`, `destination`,
//! `locktoken`, `lockowner`, `username`/`password`), computed once up front
//! instead of re-parsed by every handler. Malformed individual headers yield
//! `None`/defaults rather than failing the whole request (spec §4.3), the
//! one exception being the request path itself, which is parsed strictly
//! through [`crate::path::DavPath::new`].

use headers::authorization::{Authorization, Basic};
use headers::HeaderMapExt;
use http::HeaderMap;

use crate::error::DavResult;
use crate::headers::{extract_lockowner, extract_opaque_token, Depth, Destination, Overwrite, Timeout};
use crate::path::DavPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockScopeWanted {
    Exclusive,
    Shared,
}

/// A parsed request, independent of whatever transport (`tiny_http` in this
/// crate's demo binary) produced the method/path/headers/body it came from.
#[derive(Debug)]
pub struct DavRequest {
    pub method: String,
    pub path: DavPath,
    pub destination: Option<DavPath>,
    pub depth: Depth,
    pub overwrite: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub locktoken: Option<String>,
    pub lockowner: Option<String>,
    pub lockscope: Option<LockScopeWanted>,
    pub timeout: Option<Timeout>,
    pub is_excel: bool,
    pub body: Vec<u8>,
}

impl DavRequest {
    pub fn parse(method: &str, raw_path: &str, headers: &HeaderMap, body: Vec<u8>) -> DavResult<DavRequest> {
        let path = DavPath::new(raw_path)?;

        let destination = headers.typed_get::<Destination>().and_then(|d| DavPath::new(&d.0).ok());
        let depth = headers.typed_get::<Depth>().unwrap_or(Depth::Infinity);
        let overwrite = headers.typed_get::<Overwrite>().map(|o| o.0).unwrap_or(false);
        let timeout = headers.typed_get::<Timeout>();

        let (username, password) = match headers.typed_get::<Authorization<Basic>>() {
            Some(auth) => (Some(auth.username().to_string()), Some(auth.password().to_string())),
            None => (None, None),
        };

        let locktoken = headers
            .get("lock-token")
            .and_then(|v| v.to_str().ok())
            .and_then(extract_opaque_token)
            .or_else(|| headers.get("if").and_then(|v| v.to_str().ok()).and_then(extract_opaque_token));

        let is_lock = method.eq_ignore_ascii_case("LOCK");
        let body_str = if is_lock { String::from_utf8_lossy(&body).into_owned() } else { String::new() };
        let lockowner = if is_lock { extract_lockowner(&body_str) } else { None };
        let lockscope = if is_lock {
            Some(if body_str.to_lowercase().contains(":shared") {
                LockScopeWanted::Shared
            } else {
                LockScopeWanted::Exclusive
            })
        } else {
            None
        };

        let is_excel = headers
            .get(http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|ua| ua.contains("Excel") || ua.contains("MSOffice"))
            .unwrap_or(false);

        Ok(DavRequest {
            method: method.to_string(),
            path,
            destination,
            depth,
            overwrite,
            username,
            password,
            locktoken,
            lockowner,
            lockscope,
            timeout,
            is_excel,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers_with(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.insert(http::HeaderName::from_bytes(k.as_bytes()).unwrap(), HeaderValue::from_str(v).unwrap());
        }
        h
    }

    #[test]
    fn defaults_when_headers_absent() {
        let req = DavRequest::parse("GET", "/a/b.txt", &HeaderMap::new(), Vec::new()).unwrap();
        assert_eq!(req.depth, Depth::Infinity);
        assert!(!req.overwrite);
        assert!(req.username.is_none());
    }

    #[test]
    fn parses_basic_auth() {
        let h = headers_with(&[("authorization", "Basic YWxpY2U6c2VjcmV0")]);
        let req = DavRequest::parse("GET", "/a", &h, Vec::new()).unwrap();
        assert_eq!(req.username.as_deref(), Some("alice"));
        assert_eq!(req.password.as_deref(), Some("secret"));
    }

    #[test]
    fn parses_destination_and_depth() {
        let h = headers_with(&[("destination", "/vol/dest.txt"), ("depth", "0"), ("overwrite", "T")]);
        let req = DavRequest::parse("COPY", "/vol/src.txt", &h, Vec::new()).unwrap();
        assert_eq!(req.destination.unwrap().as_display_string(), "/vol/dest.txt");
        assert_eq!(req.depth, Depth::Zero);
        assert!(req.overwrite);
    }

    #[test]
    fn extracts_locktoken_from_lock_token_header() {
        let h = headers_with(&[("lock-token", "<opaquelocktoken:abc-1>")]);
        let req = DavRequest::parse("UNLOCK", "/a", &h, Vec::new()).unwrap();
        assert_eq!(req.locktoken.as_deref(), Some("abc-1"));
    }

    #[test]
    fn lock_body_drives_lockowner_and_scope() {
        let body = b"<D:lockinfo><D:lockscope><D:shared/></D:lockscope><D:owner><D:href>mailto:a@b</D:href></D:owner></D:lockinfo>".to_vec();
        let req = DavRequest::parse("LOCK", "/a", &HeaderMap::new(), body).unwrap();
        assert_eq!(req.lockowner.as_deref(), Some("mailto:a@b"));
        assert_eq!(req.lockscope, Some(LockScopeWanted::Shared));
    }

    #[test]
    fn rejects_malformed_path() {
        assert!(DavRequest::parse("GET", "/a/../../b", &HeaderMap::new(), Vec::new()).is_err());
    }
}
