//! XML element construction and streaming write-out for the multistatus and
//! lock-discovery bodies (spec §4.5, §4.1).
//!
//! Grounded on the teacher's `src/xmltree_ext.rs`: the same `ElementExt`
//! shape over `xmltree::Element`, just pointed at `crate::error` instead of
//! the old top-level `DavError`/`DavResult` re-exports.

use std::borrow::Cow;
use std::io::BufWriter;
use std::io::{Read, Write};

use xml::common::XmlVersion;
use xml::writer::EventWriter;
use xml::writer::XmlEvent as XmlWEvent;
use xml::EmitterConfig;

use xmltree::{self, Element};

use crate::error::{DavError, DavResult};

pub trait ElementExt {
    fn ns<S: Into<String>>(self, prefix: S, namespace: S) -> Self;
    fn new2<'a, E: Into<&'a str>>(e: E) -> Self;
    fn parse2<R: Read>(r: R) -> Result<Element, DavError>;
    fn new_text<'a, E: Into<&'a str>, T: Into<String>>(e: E, t: T) -> Self;
    fn text<T: Into<String>>(self, t: T) -> Self;
    fn push(&mut self, e: Element);
    fn has_children(&self) -> bool;
    fn write_ev<W: Write>(&self, emitter: &mut EventWriter<W>) -> xml::writer::Result<()>;
}

impl ElementExt for Element {
    fn ns<S: Into<String>>(mut self, prefix: S, namespace: S) -> Element {
        let mut ns = self.namespaces.unwrap_or_else(xmltree::Namespace::empty);
        ns.force_put(prefix.into(), namespace.into());
        self.namespaces = Some(ns);
        self
    }

    fn new2<'a, N: Into<&'a str>>(n: N) -> Element {
        let v: Vec<&str> = n.into().splitn(2, ':').collect();
        if v.len() == 1 {
            Element::new(v[0])
        } else {
            let mut e = Element::new(v[1]);
            e.prefix = Some(v[0].to_string());
            e
        }
    }

    fn new_text<'a, N: Into<&'a str>, S: Into<String>>(n: N, t: S) -> Element {
        let mut e = Element::new2(n);
        e.text = Some(t.into());
        e
    }

    fn text<S: Into<String>>(mut self, t: S) -> Element {
        self.text = Some(t.into());
        self
    }

    fn push(&mut self, e: Element) {
        self.children.push(e);
    }

    fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    fn parse2<R: Read>(r: R) -> Result<Element, DavError> {
        match Element::parse(r) {
            Ok(elem) => Ok(elem),
            Err(xmltree::ParseError::MalformedXml(_)) => Err(DavError::XmlParseError),
            Err(_) => Err(DavError::XmlReadError),
        }
    }

    fn write_ev<W: Write>(&self, emitter: &mut EventWriter<W>) -> xml::writer::Result<()> {
        use xml::attribute::Attribute;
        use xml::name::Name;
        use xml::writer::events::XmlEvent;
        use xmltree::Namespace;

        let mut name = Name::local(&self.name);
        if let Some(ref ns) = self.namespace {
            name.namespace = Some(ns);
        }
        if let Some(ref p) = self.prefix {
            name.prefix = Some(p);
        }

        let mut attributes = Vec::with_capacity(self.attributes.len());
        for (k, v) in &self.attributes {
            attributes.push(Attribute { name: Name::local(k), value: v });
        }

        let empty_ns = Namespace::empty();
        let namespace = if let Some(ref ns) = self.namespaces { Cow::Borrowed(ns) } else { Cow::Borrowed(&empty_ns) };

        emitter.write(XmlEvent::StartElement {
            name,
            attributes: Cow::Owned(attributes),
            // xmltree's Namespace doesn't carry the lifetime xml-rs wants here;
            // see xmltree-rs pull request #16 for the upstream fix this works around.
            namespace: unsafe { std::mem::transmute(namespace) },
        })?;
        if let Some(ref t) = self.text {
            emitter.write(XmlEvent::Characters(t))?;
        }
        for elem in &self.children {
            elem.write_ev(emitter)?;
        }
        emitter.write(XmlEvent::EndElement { name: Some(name) })
    }
}

/// Opens a streaming XML writer with the `<?xml version="1.0" encoding="utf-8"?>`
/// declaration already written, unindented (spec §4.5: multistatus bodies are
/// generated, not pretty-printed).
pub fn emitter<W: Write>(w: W) -> DavResult<EventWriter<BufWriter<W>>> {
    let mut emitter = EventWriter::new_with_config(
        BufWriter::new(w),
        EmitterConfig { perform_indent: false, indent_string: Cow::Borrowed(""), ..Default::default() },
    );
    emitter.write(XmlWEvent::StartDocument { version: XmlVersion::Version10, encoding: Some("utf-8"), standalone: None })?;
    Ok(emitter)
}

/// Renders a single element (with XML declaration) to a `String`, for
/// bodies small enough not to need a streaming writer (LOCK/UNLOCK responses).
pub fn element_to_string(root: &Element) -> DavResult<String> {
    let mut buf = Vec::new();
    {
        let mut em = emitter(&mut buf)?;
        root.write_ev(&mut em)?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_simple_element() {
        let el = Element::new2("D:prop").ns("D", "DAV:");
        let rendered = element_to_string(&el).unwrap();
        assert!(rendered.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(rendered.contains("D:prop"));
    }

    #[test]
    fn nested_children_are_written() {
        let mut el = Element::new2("D:prop");
        el.push(Element::new_text("D:displayname", "foo"));
        let rendered = element_to_string(&el).unwrap();
        assert!(rendered.contains("displayname"));
        assert!(rendered.contains("foo"));
    }
}
