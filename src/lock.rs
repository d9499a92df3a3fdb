//! The Lock Registry (C2, spec §4.1): a process-wide `uid -> Lock` map with
//! atomic set/clear semantics and an `authorize_write` conflict check.
//!
//! Grounded on the teacher's `src/ls.rs` (`DavLock` shape) and
//! `src/fakels.rs` (token format, timeout clamping), and on
//! `original_source/orbit-webdavd.py`'s `get_lock`/`set_lock`/`clear_lock`,
//! which raise on double-set and on clear-without-set -- exactly the
//! invariant spec §3 LockRegistry demands.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockScope {
    Exclusive,
    Shared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockDepth {
    Zero,
    Infinity,
}

/// An RFC-4918 advisory write-lock on a single resource (identified by uid).
#[derive(Debug, Clone)]
pub struct Lock {
    pub uid: String,
    pub owner: Option<String>,
    pub scope: LockScope,
    pub depth: LockDepth,
    pub timeout: Option<Duration>,
    pub timeout_at: Option<SystemTime>,
    pub token: String,
}

impl Lock {
    fn new(uid: String, owner: Option<String>, scope: LockScope, depth: LockDepth, timeout: Option<Duration>) -> Lock {
        // 128 bits from a v4 UUID, matching the teacher's `fakels.rs` token shape.
        let token = Uuid::new_v4().as_hyphenated().to_string();
        let timeout_at = timeout.map(|d| SystemTime::now() + d);
        Lock { uid, owner, scope, depth, timeout, timeout_at, token }
    }
}

/// Outcome of `authorize_write` (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAuth {
    Ok,
    Locked,
    NeedsToken,
}

/// Caps advertised lock timeouts, matching the teacher's `fakels.rs::tm_limit`:
/// 300s for exclusive locks (the default the spec's S4/ §6 examples expect),
/// 86400s for shared locks.
pub fn default_timeout(shared: bool) -> Duration {
    if shared {
        Duration::from_secs(86400)
    } else {
        Duration::from_secs(300)
    }
}

/// Process-wide lock table. Every public operation is O(1) and holds the
/// mutex only for the duration of the map lookup (spec §4.1, §5).
#[derive(Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<String, Lock>>,
}

impl LockRegistry {
    pub fn new() -> LockRegistry {
        LockRegistry { locks: Mutex::new(HashMap::new()) }
    }

    pub fn get(&self, uid: &str) -> Option<Lock> {
        self.locks.lock().get(uid).cloned()
    }

    /// Creates a new lock for `uid`. Fails atomically (returns the existing
    /// lock) if one is already present -- spec invariant 2.
    pub fn create(
        &self,
        uid: &str,
        owner: Option<String>,
        scope: LockScope,
        depth: LockDepth,
        timeout: Option<Duration>,
    ) -> Result<Lock, Lock> {
        let mut locks = self.locks.lock();
        if let Some(existing) = locks.get(uid) {
            log::debug!("lock create: {} already locked", uid);
            return Err(existing.clone());
        }
        let lock = Lock::new(uid.to_string(), owner, scope, depth, timeout);
        locks.insert(uid.to_string(), lock.clone());
        log::debug!("lock create: {} -> {}", uid, lock.token);
        Ok(lock)
    }

    /// Refreshes the timeout on an existing lock without changing its token.
    pub fn refresh(&self, uid: &str, token: &str, timeout: Option<Duration>) -> Result<Lock, ()> {
        let mut locks = self.locks.lock();
        match locks.get_mut(uid) {
            Some(lock) if lock.token == token => {
                lock.timeout = timeout;
                lock.timeout_at = timeout.map(|d| SystemTime::now() + d);
                log::debug!("lock refresh: {}", uid);
                Ok(lock.clone())
            },
            _ => Err(()),
        }
    }

    /// Removes the lock for `uid` if `token` matches. Fails if no lock is
    /// present (spec invariant 2) or if the token doesn't match.
    pub fn clear(&self, uid: &str, token: &str) -> Result<(), ()> {
        let mut locks = self.locks.lock();
        match locks.get(uid) {
            Some(lock) if lock.token == token => {
                locks.remove(uid);
                log::debug!("lock clear: {}", uid);
                Ok(())
            },
            Some(_) => {
                log::debug!("lock clear: {} token mismatch", uid);
                Err(())
            },
            None => {
                log::debug!("lock clear: {} has no lock", uid);
                Err(())
            },
        }
    }

    /// Unconditionally drops any lock on `uid`, e.g. after a successful
    /// `DELETE`/`MOVE` of the resource (spec §3 lifecycle). Absence is not
    /// an error here.
    pub fn delete(&self, uid: &str) {
        self.locks.lock().remove(uid);
    }

    /// spec §4.1 `authorize_write`.
    pub fn authorize_write(&self, uid: &str, token_from_request: Option<&str>) -> WriteAuth {
        let locks = self.locks.lock();
        match locks.get(uid) {
            None => WriteAuth::Ok,
            Some(lock) => match token_from_request {
                Some(t) if t == lock.token => WriteAuth::Ok,
                Some(_) => WriteAuth::Locked,
                None => WriteAuth::NeedsToken,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_fails_when_already_locked() {
        let reg = LockRegistry::new();
        reg.create("u1", None, LockScope::Exclusive, LockDepth::Infinity, None).unwrap();
        assert!(reg.create("u1", None, LockScope::Exclusive, LockDepth::Infinity, None).is_err());
    }

    #[test]
    fn clear_fails_when_absent() {
        let reg = LockRegistry::new();
        assert!(reg.clear("nope", "tok").is_err());
    }

    #[test]
    fn tokens_are_unique() {
        let reg = LockRegistry::new();
        let l1 = reg.create("u1", None, LockScope::Exclusive, LockDepth::Infinity, None).unwrap();
        reg.clear("u1", &l1.token).unwrap();
        let l2 = reg.create("u1", None, LockScope::Exclusive, LockDepth::Infinity, None).unwrap();
        assert_ne!(l1.token, l2.token);
    }

    #[test]
    fn authorize_write_matrix() {
        let reg = LockRegistry::new();
        assert_eq!(reg.authorize_write("u1", None), WriteAuth::Ok);
        let l = reg.create("u1", None, LockScope::Exclusive, LockDepth::Infinity, None).unwrap();
        assert_eq!(reg.authorize_write("u1", None), WriteAuth::NeedsToken);
        assert_eq!(reg.authorize_write("u1", Some("wrong")), WriteAuth::Locked);
        assert_eq!(reg.authorize_write("u1", Some(&l.token)), WriteAuth::Ok);
    }
}
