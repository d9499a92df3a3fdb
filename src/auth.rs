//! Authenticator Interface (C8, spec §4.4.1 "auth" step): verifies a
//! username/password pair extracted from the `Authorization` header by
//! `request.rs`.
//!
//! Grounded on `original_source/webdavdlib/authenticator.py`: `Authenticator`
//! (abstract base), `StaticAuthenticator` (fixed username->password table)
//! and `PAMAuthenticator` (delegates to the system's PAM stack). The latter
//! is kept here as `SystemAuthenticator` but without a real PAM binding --
//! this crate's dependency stack has none -- so it always rejects; swapping
//! in a PAM crate behind the same trait is the only change a real deployment
//! would need.

use std::collections::HashMap;

/// spec §4.4.1: given credentials, says whether the request may proceed.
pub trait Authenticator: Send + Sync + std::fmt::Debug {
    fn authenticate(&self, username: &str, password: &str) -> bool;
}

/// Fixed username -> password table, matching `StaticAuthenticator` in the
/// original source. Meant for small deployments and tests, not a real user
/// database.
#[derive(Debug, Default)]
pub struct StaticAuthenticator {
    mapping: HashMap<String, String>,
}

impl StaticAuthenticator {
    pub fn new(mapping: HashMap<String, String>) -> StaticAuthenticator {
        StaticAuthenticator { mapping }
    }
}

impl Authenticator for StaticAuthenticator {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        self.mapping.get(username).map(|p| p == password).unwrap_or(false)
    }
}

/// Stand-in for a PAM-backed authenticator. Always rejects: this crate
/// carries no PAM binding dependency.
#[derive(Debug, Default)]
pub struct SystemAuthenticator;

impl Authenticator for SystemAuthenticator {
    fn authenticate(&self, _username: &str, _password: &str) -> bool {
        false
    }
}

/// Per-user authorization hook (spec §1 "ACLs beyond a per-user
/// authorization hook" boundary; `original_source/webdavdlib/authorizer.py`).
/// Checked after authentication, before the dispatcher runs the request
/// against the backend. The default grants everything, matching the
/// original's `Authorizer.authorize` base implementation.
pub trait Authorizer: Send + Sync + std::fmt::Debug {
    fn authorize(&self, _username: &str, _path: &crate::path::DavPathRef, _method: &str) -> bool {
        true
    }
}

#[derive(Debug, Default)]
pub struct AllowAllAuthorizer;

impl Authorizer for AllowAllAuthorizer {}
