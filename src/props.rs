//! Property Model (C1, spec §3): typed named properties carried on
//! resources, and the rules for turning a stat + lock state into the
//! standard WebDAV property set.
//!
//! Grounded on the teacher's `src/handle_props.rs` (`PROPNAME_STR`,
//! `ALLPROP_STR`, `MS_ALLPROP_STR` name tables, `lazy_static`-backed static
//! element tables) and on `original_source/webdavdlib/properties.py`'s
//! full property catalogue (the `Property` subclass list), which is the
//! more complete enumeration this module follows.

use xmltree::Element;

use crate::fs::DavMetaData;
use crate::lock::Lock;
use crate::path::DavPathRef;
use crate::xml_util::ElementExt;

/// All `D:`/`Z:` property names this server knows how to compute,
/// matching spec §3's table plus the Windows-compat shims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropName {
    ResourceType,
    IsCollection,
    GetContentLength,
    GetContentType,
    GetLastModified,
    CreationDate,
    LastAccessed,
    GetEtag,
    DisplayName,
    IsHidden,
    SupportedLock,
    LockDiscovery,
    QuotaAvailableBytes,
    QuotaUsedBytes,
    Win32CreationTime,
    Win32LastAccessTime,
    Win32LastModifiedTime,
    Win32FileAttributes,
}

impl PropName {
    /// `(xml-prefix, local-name)`, e.g. `("D", "getcontentlength")`.
    pub fn qname(self) -> (&'static str, &'static str) {
        use PropName::*;
        match self {
            ResourceType => ("D", "resourcetype"),
            IsCollection => ("D", "iscollection"),
            GetContentLength => ("D", "getcontentlength"),
            GetContentType => ("D", "getcontenttype"),
            GetLastModified => ("D", "getlastmodified"),
            CreationDate => ("D", "creationdate"),
            LastAccessed => ("D", "lastaccessed"),
            GetEtag => ("D", "getetag"),
            DisplayName => ("D", "displayname"),
            IsHidden => ("D", "ishidden"),
            SupportedLock => ("D", "supportedlock"),
            LockDiscovery => ("D", "lockdiscovery"),
            QuotaAvailableBytes => ("D", "quota-available-bytes"),
            QuotaUsedBytes => ("D", "quota-used-bytes"),
            Win32CreationTime => ("Z", "Win32CreationTime"),
            Win32LastAccessTime => ("Z", "Win32LastAccessTime"),
            Win32LastModifiedTime => ("Z", "Win32LastModifiedTime"),
            Win32FileAttributes => ("Z", "Win32FileAttributes"),
        }
    }

    /// The four properties Microsoft Excel chokes on if present (spec §4.5 step 4).
    pub fn excel_unsafe(self) -> bool {
        matches!(self, PropName::GetLastModified | PropName::LastAccessed | PropName::Win32LastModifiedTime | PropName::Win32LastAccessTime)
    }
}

/// Default computed order, also used for `allprop`/unfiltered `PROPFIND`.
pub const ALL_PROPS: &[PropName] = &[
    PropName::ResourceType,
    PropName::IsCollection,
    PropName::GetContentLength,
    PropName::GetContentType,
    PropName::GetLastModified,
    PropName::CreationDate,
    PropName::LastAccessed,
    PropName::GetEtag,
    PropName::DisplayName,
    PropName::IsHidden,
    PropName::SupportedLock,
    PropName::LockDiscovery,
    PropName::QuotaAvailableBytes,
    PropName::QuotaUsedBytes,
    PropName::Win32CreationTime,
    PropName::Win32LastAccessTime,
    PropName::Win32LastModifiedTime,
    PropName::Win32FileAttributes,
];

fn httpdate(t: std::time::SystemTime) -> String {
    let datetime: chrono::DateTime<chrono::Utc> = t.into();
    datetime.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Builds the `<D:prop>` element for one resource, including only the
/// properties that are actually present (spec §4.5 step 5: presence-only
/// booleans are empty elements when true, omitted when false).
pub fn build_prop_element(
    path: &DavPathRef,
    meta: &dyn DavMetaData,
    lock: Option<&Lock>,
    quota: Option<(u64, u64)>,
    wanted: &[PropName],
) -> Element {
    let mut prop = Element::new2("D:prop");
    for &name in wanted {
        if let Some(el) = build_one(name, path, meta, lock, quota) {
            prop.push(el);
        }
    }
    prop
}

fn build_one(name: PropName, path: &DavPathRef, meta: &dyn DavMetaData, lock: Option<&Lock>, quota: Option<(u64, u64)>) -> Option<Element> {
    let (prefix, local) = name.qname();
    let qn = format!("{}:{}", prefix, local);
    match name {
        PropName::ResourceType => {
            let mut el = Element::new2(qn.as_str());
            if meta.is_dir() {
                el.push(Element::new2("D:collection"));
            }
            Some(el)
        },
        PropName::IsCollection => Some(Element::new_text(qn.as_str(), if meta.is_dir() { "1" } else { "0" })),
        PropName::GetContentLength => {
            if meta.is_dir() {
                None
            } else {
                Some(Element::new_text(qn.as_str(), meta.len().to_string()))
            }
        },
        PropName::GetContentType => {
            if meta.is_dir() {
                None
            } else {
                Some(Element::new_text(qn.as_str(), path.get_mime_type_str()))
            }
        },
        PropName::GetLastModified => meta.modified().ok().map(|t| Element::new_text(qn.as_str(), httpdate(t))),
        PropName::CreationDate => meta.created().ok().map(|t| Element::new_text(qn.as_str(), httpdate(t))),
        PropName::LastAccessed => meta.accessed().ok().map(|t| Element::new_text(qn.as_str(), httpdate(t))),
        PropName::GetEtag => Some(Element::new_text(qn.as_str(), format!("\"{}\"", meta.etag()))),
        PropName::DisplayName => Some(Element::new_text(qn.as_str(), path.file_name())),
        PropName::IsHidden => {
            if path.is_hidden() {
                Some(Element::new2(qn.as_str()))
            } else {
                None
            }
        },
        PropName::SupportedLock => Some(crate::lockxml::supported_lock_element()),
        PropName::LockDiscovery => Some(crate::lockxml::lock_discovery_element(lock)),
        PropName::QuotaAvailableBytes => quota.map(|(avail, _)| Element::new_text(qn.as_str(), avail.to_string())),
        PropName::QuotaUsedBytes => quota.map(|(_, used)| Element::new_text(qn.as_str(), used.to_string())),
        PropName::Win32CreationTime => meta.created().ok().map(|t| Element::new_text(qn.as_str(), httpdate(t))),
        PropName::Win32LastAccessTime => meta.accessed().ok().map(|t| Element::new_text(qn.as_str(), httpdate(t))),
        PropName::Win32LastModifiedTime => meta.modified().ok().map(|t| Element::new_text(qn.as_str(), httpdate(t))),
        PropName::Win32FileAttributes => {
            let attr = if meta.is_dir() { "00000010" } else { "00000020" };
            Some(Element::new_text(qn.as_str(), attr))
        },
    }
}

/// Drops the Excel-unsafe subset from `wanted` (spec §4.5 step 4).
pub fn filter_for_excel(wanted: &[PropName]) -> Vec<PropName> {
    wanted.iter().copied().filter(|p| !p.excel_unsafe()).collect()
}
