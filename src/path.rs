//! URL path parsing, normalization and confinement (spec §4.2.1, §4.3).
//!
//! Grounded on the teacher's `davpath.rs`: percent-decoding, `.`/`..`
//! collapsing with a hard failure on an escape attempt, and printable-ASCII
//! validation. Trimmed to what a synchronous dispatcher needs; the `Deref`
//! split between an owned `DavPath` and a borrowed `DavPathRef` is kept
//! because it is what lets backends accept `&DavPathRef` without cloning.

use std::borrow::Borrow;
use std::ops::Deref;
use std::path::PathBuf;

use percent_encoding::{percent_decode, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::ParseError;

const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn valid_segment(s: &[u8]) -> Result<(), ParseError> {
    if s.iter().any(|&b| b < 0x20 || b == 0x7f) {
        return Err(ParseError::InvalidPath);
    }
    Ok(())
}

/// Percent-decode, validate, and collapse `.`/`..` segments. `..` that would
/// escape the root is a hard `ForbiddenPath`, never silently clamped.
fn normalize_path(raw: &[u8]) -> Result<Vec<u8>, ParseError> {
    // Strip query/fragment.
    let mut raw = raw;
    if let Some(pos) = raw.iter().position(|&b| b == b'?' || b == b'#') {
        raw = &raw[..pos];
    }
    if !raw.starts_with(b"/") {
        return Err(ParseError::InvalidPath);
    }

    let mut out: Vec<Vec<u8>> = Vec::new();
    for seg in raw.split(|&b| b == b'/').skip(1) {
        valid_segment(seg)?;
        let decoded = percent_decode(seg)
            .decode_utf8()
            .map_err(|_| ParseError::InvalidPath)?
            .into_owned();
        match decoded.as_str() {
            "" | "." => continue,
            ".." => {
                if out.pop().is_none() {
                    return Err(ParseError::ForbiddenPath);
                }
            },
            _ => out.push(decoded.into_bytes()),
        }
    }

    let mut result = Vec::with_capacity(raw.len());
    for seg in &out {
        result.push(b'/');
        result.extend_from_slice(seg);
    }
    if result.is_empty() {
        result.push(b'/');
    }
    // preserve a trailing slash on collections.
    if raw.ends_with(b"/") && !result.ends_with(b"/") {
        result.push(b'/');
    }
    Ok(result)
}

/// An owned, normalized, confinement-checked request path.
#[derive(Debug, Clone, Eq)]
pub struct DavPath {
    full: Vec<u8>,
}

/// Borrowed counterpart of [`DavPath`]; backends accept this so callers don't
/// need to clone a path just to pass it down.
#[derive(Debug, Eq)]
pub struct DavPathRef {
    full: [u8],
}

impl PartialEq for DavPath {
    fn eq(&self, other: &DavPath) -> bool {
        self.as_ref_trimmed() == other.as_ref_trimmed()
    }
}

impl DavPath {
    fn as_ref_trimmed(&self) -> &[u8] {
        self.full.strip_suffix(b"/").unwrap_or(&self.full)
    }

    /// Parse and normalize a raw URL path (as received on the request line).
    pub fn new(raw: &str) -> Result<DavPath, ParseError> {
        let full = normalize_path(raw.as_bytes())?;
        Ok(DavPath { full })
    }

    pub fn root() -> DavPath {
        DavPath { full: b"/".to_vec() }
    }

    pub fn push_segment(&mut self, name: &[u8]) {
        if !self.full.ends_with(b"/") {
            self.full.push(b'/');
        }
        self.full.extend_from_slice(name);
    }

    pub fn add_slash(&mut self) {
        if !self.full.ends_with(b"/") {
            self.full.push(b'/');
        }
    }

    pub fn add_slash_if(&mut self, is_collection: bool) {
        if is_collection {
            self.add_slash();
        }
    }

    pub fn parent(&self) -> DavPath {
        let trimmed = self.as_ref_trimmed();
        match trimmed.iter().rposition(|&b| b == b'/') {
            Some(0) | None => DavPath::root(),
            Some(pos) => {
                let mut full = trimmed[..=pos].to_vec();
                if full.is_empty() {
                    full.push(b'/');
                }
                DavPath { full }
            },
        }
    }
}

impl Deref for DavPath {
    type Target = DavPathRef;
    fn deref(&self) -> &DavPathRef {
        unsafe { &*(self.full.as_slice() as *const [u8] as *const DavPathRef) }
    }
}

impl Borrow<DavPathRef> for DavPath {
    fn borrow(&self) -> &DavPathRef {
        self
    }
}

impl PartialEq<DavPathRef> for DavPathRef {
    fn eq(&self, other: &DavPathRef) -> bool {
        let a = self.full.strip_suffix(b"/").unwrap_or(&self.full);
        let b = other.full.strip_suffix(b"/").unwrap_or(&other.full);
        a == b
    }
}

impl DavPathRef {
    pub fn as_bytes(&self) -> &[u8] {
        &self.full
    }

    pub fn is_collection(&self) -> bool {
        self.full.ends_with(b"/")
    }

    pub fn is_root(&self) -> bool {
        &self.full == b"/"
    }

    /// URL-encoded string, e.g. for an XML `<D:href>`.
    pub fn as_url_string(&self) -> String {
        let s = String::from_utf8_lossy(&self.full);
        s.split('/')
            .map(|seg| utf8_percent_encode(seg, PATH_ENCODE_SET).to_string())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Lossily decoded display string (no percent-encoding), for logs and HTML.
    pub fn as_display_string(&self) -> String {
        String::from_utf8_lossy(&self.full).into_owned()
    }

    /// The basename, without any trailing slash or leading path.
    pub fn file_name(&self) -> String {
        let trimmed = self.full.strip_suffix(b"/").unwrap_or(&self.full);
        let start = trimmed.iter().rposition(|&b| b == b'/').map(|p| p + 1).unwrap_or(0);
        String::from_utf8_lossy(&trimmed[start..]).into_owned()
    }

    pub fn is_hidden(&self) -> bool {
        let name = self.file_name();
        name.starts_with('.') || name.starts_with('~')
    }

    pub fn get_mime_type_str(&self) -> &'static str {
        mime_guess::from_path(self.file_name())
            .first_raw()
            .unwrap_or("application/octet-stream")
    }

    /// Join onto a local filesystem `base`, enforcing confinement: the
    /// result must stay within `base` after `..` collapse (spec §4.2.1).
    /// `..` escapes are already rejected at parse time by [`DavPath::new`],
    /// so this only has to join and strip the leading slash.
    pub fn as_pathbuf_with_base(&self, base: &std::path::Path) -> PathBuf {
        let rel = self.full.strip_prefix(b"/").unwrap_or(&self.full);
        let rel = String::from_utf8_lossy(rel);
        if rel.is_empty() {
            base.to_path_buf()
        } else {
            base.join(rel.as_ref())
        }
    }

    /// Clones into an owned [`DavPath`], e.g. before mutating with
    /// `push_segment` while walking a directory tree.
    pub fn to_owned(&self) -> DavPath {
        DavPath { full: self.full.to_vec() }
    }

    /// Strip a leading `/prefix` segment (used by the Multiplex backend).
    /// Returns `None` if `self` is not under `prefix`.
    pub fn strip_prefix_segment(&self, prefix: &str) -> Option<DavPath> {
        let want = format!("/{}", prefix.trim_matches('/'));
        let full = String::from_utf8_lossy(&self.full);
        if full == want {
            return Some(DavPath::root());
        }
        let with_slash = format!("{}/", want);
        full.strip_prefix(&with_slash).map(|rest| DavPath {
            full: format!("/{}", rest).into_bytes(),
        })
    }
}

impl std::fmt::Display for DavPathRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_display_string())
    }
}

impl std::fmt::Display for DavPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_display_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_dotdot_escape() {
        assert_eq!(DavPath::new("/a/../../b").unwrap_err(), ParseError::ForbiddenPath);
    }

    #[test]
    fn collapses_internal_dotdot() {
        let p = DavPath::new("/a/b/../c").unwrap();
        assert_eq!(p.as_display_string(), "/a/c");
    }

    #[test]
    fn preserves_trailing_slash() {
        let p = DavPath::new("/a/b/").unwrap();
        assert!(p.is_collection());
    }

    #[test]
    fn percent_decodes_segments() {
        let p = DavPath::new("/hello%20world").unwrap();
        assert_eq!(p.as_display_string(), "/hello world");
    }

    #[test]
    fn strips_query_and_fragment() {
        let p = DavPath::new("/a/b?x=1#y").unwrap();
        assert_eq!(p.as_display_string(), "/a/b");
    }

    #[test]
    fn confinement_join_stays_inside_base() {
        let base = std::path::Path::new("/srv/data");
        let p = DavPath::new("/foo/bar.txt").unwrap();
        assert_eq!(p.as_pathbuf_with_base(base), std::path::PathBuf::from("/srv/data/foo/bar.txt"));
    }

    #[test]
    fn multiplex_prefix_strip() {
        let p = DavPath::new("/vol/dir/a").unwrap();
        let rest = p.strip_prefix_segment("vol").unwrap();
        assert_eq!(rest.as_display_string(), "/dir/a");
        assert!(p.strip_prefix_segment("other").is_none());
    }
}
