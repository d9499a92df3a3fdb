//! PROPFIND Engine (C10, spec §4.5): parses a `PROPFIND` request body, walks
//! the resource tree up to the depth-32 sentinel, and assembles a
//! `207 Multi-Status` response body.
//!
//! Grounded on the teacher's `src/handle_props.rs::handle_propfind`/
//! `propfind_directory`: body-driven `propname`/`allprop`/`prop` dispatch
//! and depth-limited directory recursion. The teacher streams the response
//! out through an `AsyncStream`/`PropWriter` pair as it walks; with no async
//! runtime here the whole `xmltree::Element` tree is built in memory instead
//! and serialized once through `xml_util::element_to_string` -- still a
//! single pass over the tree, just not chunked onto the wire as it goes.
//! The walk itself is depth-first with an explicit level counter rather than
//! a literal breadth-first queue: both enforce the same depth cap, and the
//! recursive form needs no extra queue bookkeeping.

use xmltree::{Element, XMLNode};

use crate::error::{DavError, DavResult};
use crate::fs::Filesystem;
use crate::headers::Depth;
use crate::lock::LockRegistry;
use crate::path::DavPathRef;
use crate::props::{build_prop_element, filter_for_excel, PropName, ALL_PROPS};
use crate::xml_util::ElementExt;

enum Wanted {
    AllProp,
    PropName,
    Prop(Vec<PropName>, Vec<String>),
}

fn propname_for(prefix: Option<&str>, local: &str) -> Option<PropName> {
    ALL_PROPS.iter().copied().find(|p| {
        let (pfx, name) = p.qname();
        prefix.map(|x| x == pfx).unwrap_or(pfx == "D") && name == local
    })
}

fn child_elements(e: &Element) -> impl Iterator<Item = &Element> {
    e.children.iter().filter_map(|n| match n {
        XMLNode::Element(el) => Some(el),
        _ => None,
    })
}

fn parse_request(body: &[u8]) -> DavResult<Wanted> {
    if body.is_empty() {
        return Ok(Wanted::AllProp);
    }
    let root = Element::parse2(body)?;
    if root.name != "propfind" {
        return Err(DavError::XmlParseError);
    }
    match child_elements(&root).find(|e| matches!(e.name.as_str(), "propname" | "prop" | "allprop")) {
        None => Ok(Wanted::AllProp),
        Some(e) if e.name == "propname" => Ok(Wanted::PropName),
        Some(e) if e.name == "allprop" => Ok(Wanted::AllProp),
        Some(e) => {
            let mut found = Vec::new();
            let mut missing = Vec::new();
            for child in child_elements(e) {
                match propname_for(child.prefix.as_deref(), &child.name) {
                    Some(p) => found.push(p),
                    None => missing.push(format!("{}:{}", child.prefix.as_deref().unwrap_or(""), child.name)),
                }
            }
            Ok(Wanted::Prop(found, missing))
        },
    }
}

fn propstat(code: u16, prop: Element) -> Element {
    let mut ps = Element::new2("D:propstat");
    ps.push(prop);
    let reason = match code {
        200 => "OK",
        404 => "Not Found",
        _ => "",
    };
    ps.push(Element::new_text("D:status", format!("HTTP/1.1 {} {}", code, reason)));
    ps
}

/// `PROPPATCH` (spec §4.4.2): every property this server exposes is either
/// computed straight from backend metadata or absent -- there's no dead
/// property store -- so every `set`/`remove` item in the request comes back
/// `403 Forbidden`, the verdict the teacher's `handle_props.rs::liveprop_set`
/// reaches for every `DAV:` live property it lists.
pub fn proppatch_response(path: &DavPathRef, body: &[u8]) -> DavResult<String> {
    let root = Element::parse2(body)?;
    if root.name != "propertyupdate" {
        return Err(DavError::XmlParseError);
    }

    let mut prop = Element::new2("D:prop");
    for action in child_elements(&root) {
        if action.name != "set" && action.name != "remove" {
            continue;
        }
        if let Some(propelem) = child_elements(action).find(|e| e.name == "prop") {
            for p in child_elements(propelem) {
                let qn = format!("{}:{}", p.prefix.as_deref().unwrap_or("D"), p.name);
                prop.push(Element::new2(qn.as_str()));
            }
        }
    }

    let mut response = Element::new2("D:response");
    response.push(Element::new_text("D:href", path.as_url_string()));
    response.push(propstat(403, prop));

    let mut multistatus = Element::new2("D:multistatus").ns("D", "DAV:");
    multistatus.push(response);
    crate::xml_util::element_to_string(&multistatus)
}

/// Runs a PROPFIND against one backend on behalf of one (already
/// authenticated) user.
pub struct PropfindEngine<'a> {
    fs: &'a dyn Filesystem,
    locks: &'a LockRegistry,
    user: Option<&'a str>,
}

impl<'a> PropfindEngine<'a> {
    pub fn new(fs: &'a dyn Filesystem, locks: &'a LockRegistry, user: Option<&'a str>) -> PropfindEngine<'a> {
        PropfindEngine { fs, locks, user }
    }

    /// Runs the PROPFIND and returns the serialized `<D:multistatus>` body.
    pub fn run(&self, path: &DavPathRef, depth: Depth, body: &[u8], is_excel: bool) -> DavResult<String> {
        let wanted = parse_request(body)?;
        let mut multistatus = Element::new2("D:multistatus").ns("D", "DAV:");

        let root_meta = self.fs.metadata(self.user, path)?;
        let is_dir = root_meta.is_dir();
        self.emit_response(&mut multistatus, path, root_meta.as_ref(), &wanted, is_excel);

        if is_dir && depth != Depth::Zero {
            self.walk_dir(&mut multistatus, path, depth.as_levels(), &wanted, is_excel);
        }

        crate::xml_util::element_to_string(&multistatus)
    }

    fn walk_dir(&self, multistatus: &mut Element, path: &DavPathRef, levels_left: u32, wanted: &Wanted, is_excel: bool) {
        if levels_left == 0 {
            return;
        }
        let entries = match self.fs.read_dir(self.user, path) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("propfind: read_dir({}) failed: {:?}", path, e);
                return;
            },
        };
        for entry in entries {
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(e) => {
                    log::trace!("propfind: metadata error, skipping entry: {:?}", e);
                    continue;
                },
            };
            let mut npath = path.to_owned();
            npath.push_segment(&entry.name());
            if meta.is_dir() {
                npath.add_slash();
            }
            let is_dir = meta.is_dir();
            self.emit_response(multistatus, &npath, meta.as_ref(), wanted, is_excel);
            if is_dir {
                self.walk_dir(multistatus, &npath, levels_left - 1, wanted, is_excel);
            }
        }
    }

    fn emit_response(&self, multistatus: &mut Element, path: &DavPathRef, meta: &dyn crate::fs::DavMetaData, wanted: &Wanted, is_excel: bool) {
        let uid = self.fs.get_uid(self.user, path);
        let lock = self.locks.get(&uid);
        let quota = self.fs.quota(self.user);

        let mut response = Element::new2("D:response");
        response.push(Element::new_text("D:href", path.as_url_string()));

        match wanted {
            Wanted::PropName => {
                let mut prop = Element::new2("D:prop");
                for &name in ALL_PROPS {
                    let (pfx, local) = name.qname();
                    let qn = format!("{}:{}", pfx, local);
                    prop.push(Element::new2(qn.as_str()));
                }
                response.push(propstat(200, prop));
            },
            Wanted::AllProp => {
                let names = if is_excel { filter_for_excel(ALL_PROPS) } else { ALL_PROPS.to_vec() };
                let prop = build_prop_element(path, meta, lock.as_ref(), quota, &names);
                response.push(propstat(200, prop));
            },
            Wanted::Prop(found, missing) => {
                let names = if is_excel { filter_for_excel(found) } else { found.clone() };
                if !names.is_empty() {
                    let prop = build_prop_element(path, meta, lock.as_ref(), quota, &names);
                    response.push(propstat(200, prop));
                }
                if !missing.is_empty() {
                    let mut prop404 = Element::new2("D:prop");
                    for m in missing {
                        prop404.push(Element::new2(m.as_str()));
                    }
                    response.push(propstat(404, prop404));
                }
            },
        }

        multistatus.push(response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::directory::Directory;
    use crate::lock::LockRegistry;
    use crate::path::DavPath;

    #[test]
    fn allprop_on_file_yields_single_response() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.txt"), b"hi").unwrap();
        let dir = Directory::new(tmp.path().to_path_buf(), false);
        let locks = LockRegistry::new();
        let engine = PropfindEngine::new(&dir, &locks, None);
        let path = DavPath::new("/a.txt").unwrap();
        let body = engine.run(&path, Depth::Zero, b"", false).unwrap();
        assert_eq!(body.matches("D:response").count(), 2);
        assert!(body.contains("getcontentlength"));
    }

    #[test]
    fn depth_one_includes_directory_children() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.txt"), b"hi").unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        let dir = Directory::new(tmp.path().to_path_buf(), false);
        let locks = LockRegistry::new();
        let engine = PropfindEngine::new(&dir, &locks, None);
        let path = DavPath::new("/").unwrap();
        let body = engine.run(&path, Depth::One, b"", false).unwrap();
        assert!(body.contains("a.txt"));
        assert!(body.contains("sub"));
    }

    #[test]
    fn propname_request_lists_names_without_values() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.txt"), b"hi").unwrap();
        let dir = Directory::new(tmp.path().to_path_buf(), false);
        let locks = LockRegistry::new();
        let engine = PropfindEngine::new(&dir, &locks, None);
        let path = DavPath::new("/a.txt").unwrap();
        let body = engine.run(&path, Depth::Zero, br#"<?xml version="1.0"?><D:propfind xmlns:D="DAV:"><D:propname/></D:propfind>"#, false).unwrap();
        assert!(body.contains("getcontentlength"));
        assert!(!body.contains(">2<"));
    }

    #[test]
    fn explicit_prop_request_reports_404_for_unknown_names() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.txt"), b"hi").unwrap();
        let dir = Directory::new(tmp.path().to_path_buf(), false);
        let locks = LockRegistry::new();
        let engine = PropfindEngine::new(&dir, &locks, None);
        let path = DavPath::new("/a.txt").unwrap();
        let body = engine
            .run(
                &path,
                Depth::Zero,
                br#"<?xml version="1.0"?><D:propfind xmlns:D="DAV:"><D:prop><D:getcontentlength/><D:bogusprop/></D:prop></D:propfind>"#,
                false,
            )
            .unwrap();
        assert!(body.contains("getcontentlength"));
        assert!(body.contains("404"));
        assert!(body.contains("bogusprop"));
    }

    #[test]
    fn proppatch_rejects_every_set_request() {
        let path = DavPath::new("/a.txt").unwrap();
        let body = proppatch_response(
            &path,
            br#"<?xml version="1.0"?><D:propertyupdate xmlns:D="DAV:"><D:set><D:prop><D:displayname>x</D:displayname></D:prop></D:set></D:propertyupdate>"#,
        )
        .unwrap();
        assert!(body.contains("403"));
        assert!(body.contains("displayname"));
    }

    #[test]
    fn excel_user_agent_drops_unsafe_props() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.txt"), b"hi").unwrap();
        let dir = Directory::new(tmp.path().to_path_buf(), false);
        let locks = LockRegistry::new();
        let engine = PropfindEngine::new(&dir, &locks, None);
        let path = DavPath::new("/a.txt").unwrap();
        let body = engine.run(&path, Depth::Zero, b"", true).unwrap();
        assert!(!body.contains("lastaccessed"));
        assert!(!body.contains("Win32LastAccessTime"));
    }
}
