//! Identity-switching strategy (C13, spec §4.2.1, §9).
//!
//! Grounded on `original_source/webdavdlib/operator.py`: `BaseOperator`,
//! the no-op `NoneOperator` default, and `UnixOperator`'s
//! `setgroups`/`setegid`/`seteuid`/`umask` bracket around a backend call.
//! The teacher repo has no direct equivalent (its `LocalFs` never switches
//! identity), so this is built in the teacher's trait-with-default-impl
//! idiom rather than adapted from a specific file.

use std::ffi::CString;

/// Brackets a backend call with an identity switch. `end` must run even if
/// the bracketed call panics or returns early -- callers should use
/// [`OperatorGuard`] rather than calling `begin`/`end` by hand.
pub trait Operator: Send + Sync + std::fmt::Debug {
    fn begin(&self, user: &str);
    fn end(&self);
}

/// Default no-op strategy; lets the server run on platforms without a
/// per-thread identity concept.
#[derive(Debug, Default)]
pub struct NoneOperator;

impl Operator for NoneOperator {
    fn begin(&self, _user: &str) {}
    fn end(&self) {}
}

/// RAII bracket: `begin(user)` on construction, `end()` on drop, so every
/// exit path (including an early `?` or a panic unwind) restores identity
/// (spec §5 "Cancellation / timeouts").
pub struct OperatorGuard<'a> {
    operator: &'a dyn Operator,
}

impl<'a> OperatorGuard<'a> {
    pub fn new(operator: &'a dyn Operator, user: &str) -> OperatorGuard<'a> {
        operator.begin(user);
        OperatorGuard { operator }
    }
}

impl Drop for OperatorGuard<'_> {
    fn drop(&mut self) {
        self.operator.end();
    }
}

/// POSIX identity switch via `seteuid`/`setegid`/`setgroups`, matching
/// `UnixOperator` in the original source. Resolves uid/gid/supplementary
/// groups from the system user database (`getpwnam`) at `begin` time.
#[derive(Debug)]
pub struct UnixOperator {
    umask: u32,
}

impl UnixOperator {
    pub fn new(umask: u32) -> UnixOperator {
        UnixOperator { umask }
    }

    fn lookup(user: &str) -> Option<(libc::uid_t, libc::gid_t)> {
        let cname = CString::new(user).ok()?;
        unsafe {
            let pw = libc::getpwnam(cname.as_ptr());
            if pw.is_null() {
                None
            } else {
                Some(((*pw).pw_uid, (*pw).pw_gid))
            }
        }
    }
}

impl Operator for UnixOperator {
    fn begin(&self, user: &str) {
        let Some((uid, gid)) = UnixOperator::lookup(user) else {
            log::warn!("UnixOperator: unknown user {}", user);
            return;
        };
        unsafe {
            libc::setgroups(1, &gid as *const libc::gid_t);
            libc::setegid(gid);
            libc::seteuid(uid);
            libc::umask(self.umask as libc::mode_t);
        }
    }

    fn end(&self) {
        unsafe {
            libc::umask(0o022);
            libc::seteuid(0);
            libc::setegid(0);
            libc::setgroups(0, std::ptr::null());
        }
    }
}
