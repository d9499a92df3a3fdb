//! Lock/unlock XML bodies: `<D:activelock>`, `<D:lockdiscovery>` and
//! `<D:supportedlock>` (spec §4.1, §4.5's `D:lockdiscovery`/`D:supportedlock`
//! properties).
//!
//! Grounded on the teacher's `src/handle_lock.rs`: `build_lock_prop`,
//! `list_lockdiscovery`, `list_supportedlock`. `D:supportedlock` is always
//! advertised with both lockentry blocks regardless of current lock state
//! (Open Question ii in DESIGN.md), matching the teacher's `list_supportedlock`,
//! which never consults the lock table at all.

use xmltree::Element;

use crate::lock::{Lock, LockDepth, LockScope};
use crate::path::DavPathRef;
use crate::xml_util::ElementExt;

/// `<D:activelock>` for one lock. `full` wraps it in `<D:lockdiscovery><D:prop>`
/// with the `DAV:` namespace declared, the shape a `LOCK` response body needs;
/// unwrapped, it's a child of the `<D:lockdiscovery>` a `PROPFIND` response builds.
pub fn build_lock_prop(lock: &Lock, path: &DavPathRef, full: bool) -> Element {
    let mut actlock = Element::new2("D:activelock");

    let mut scope = Element::new2("D:lockscope");
    scope.push(match lock.scope {
        LockScope::Exclusive => Element::new2("D:exclusive"),
        LockScope::Shared => Element::new2("D:shared"),
    });
    actlock.push(scope);

    let mut locktype = Element::new2("D:locktype");
    locktype.push(Element::new2("D:write"));
    actlock.push(locktype);

    actlock.push(Element::new_text(
        "D:depth",
        match lock.depth {
            LockDepth::Zero => "0",
            LockDepth::Infinity => "Infinity",
        },
    ));

    actlock.push(Element::new_text(
        "D:timeout",
        match lock.timeout {
            None => "Infinite".to_string(),
            Some(d) => format!("Second-{}", d.as_secs()),
        },
    ));

    let mut locktoken = Element::new2("D:locktoken");
    locktoken.push(Element::new_text("D:href", format!("opaquelocktoken:{}", lock.token)));
    actlock.push(locktoken);

    let mut lockroot = Element::new2("D:lockroot");
    lockroot.push(Element::new_text("D:href", path.as_url_string()));
    actlock.push(lockroot);

    if let Some(ref owner) = lock.owner {
        actlock.push(Element::new_text("D:owner", owner.clone()));
    }

    if !full {
        return actlock;
    }

    let mut ldis = Element::new2("D:lockdiscovery");
    ldis.push(actlock);
    let mut prop = Element::new2("D:prop").ns("D", "DAV:");
    prop.push(ldis);
    prop
}

/// `D:lockdiscovery` property value: empty if unlocked, one `<D:activelock>`
/// if locked (spec only ever tracks a single lock per resource). Used from
/// `props.rs`, which has no path in hand for the `lockroot` -- that's only
/// rendered in the `LOCK` response body itself, via [`build_lock_prop`].
pub fn lock_discovery_element(lock: Option<&Lock>) -> Element {
    let mut elem = Element::new2("D:lockdiscovery");
    if let Some(lock) = lock {
        elem.push(build_lock_prop_no_root(lock));
    }
    elem
}

fn build_lock_prop_no_root(lock: &Lock) -> Element {
    let mut actlock = Element::new2("D:activelock");

    let mut scope = Element::new2("D:lockscope");
    scope.push(match lock.scope {
        LockScope::Exclusive => Element::new2("D:exclusive"),
        LockScope::Shared => Element::new2("D:shared"),
    });
    actlock.push(scope);

    let mut locktype = Element::new2("D:locktype");
    locktype.push(Element::new2("D:write"));
    actlock.push(locktype);

    actlock.push(Element::new_text(
        "D:depth",
        match lock.depth {
            LockDepth::Zero => "0",
            LockDepth::Infinity => "Infinity",
        },
    ));

    actlock.push(Element::new_text(
        "D:timeout",
        match lock.timeout {
            None => "Infinite".to_string(),
            Some(d) => format!("Second-{}", d.as_secs()),
        },
    ));

    let mut locktoken = Element::new2("D:locktoken");
    locktoken.push(Element::new_text("D:href", format!("opaquelocktoken:{}", lock.token)));
    actlock.push(locktoken);

    if let Some(ref owner) = lock.owner {
        actlock.push(Element::new_text("D:owner", owner.clone()));
    }

    actlock
}

/// `D:supportedlock` property value: both exclusive-write and shared-write
/// lockentries, advertised unconditionally (DESIGN.md Open Question ii).
pub fn supported_lock_element() -> Element {
    let mut elem = Element::new2("D:supportedlock");

    let mut entry = Element::new2("D:lockentry");
    let mut scope = Element::new2("D:lockscope");
    scope.push(Element::new2("D:exclusive"));
    entry.push(scope);
    entry.push(Element::new2("D:locktype").with_write());
    elem.push(entry);

    let mut entry = Element::new2("D:lockentry");
    let mut scope = Element::new2("D:lockscope");
    scope.push(Element::new2("D:shared"));
    entry.push(scope);
    entry.push(Element::new2("D:locktype").with_write());
    elem.push(entry);

    elem
}

trait WithWrite {
    fn with_write(self) -> Element;
}

impl WithWrite for Element {
    fn with_write(mut self) -> Element {
        self.push(Element::new2("D:write"));
        self
    }
}
