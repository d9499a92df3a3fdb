//! Multiplex Backend (C5, spec §4.2.2): composes several backends under
//! distinct top-level prefixes and synthesizes a virtual root collection.
//!
//! Grounded on spec §4.2.2 directly (the teacher has no equivalent; the
//! closest analogue in the wider pack is `original_source/webdavdlib`'s
//! flat single-backend model, which this supersedes per the spec). Built
//! in the `Filesystem` trait's idiom alongside `directory.rs`.

use std::time::SystemTime;

use crate::error::{FsError, FsResult};
use crate::fs::{clone_metadata, DavFile, DavMetaData, DirEntry, Filesystem, OpenOptions, SimpleMetaData};
use crate::path::{DavPath, DavPathRef};

pub struct Mount {
    pub prefix: String,
    pub backend: Box<dyn Filesystem>,
}

pub struct Multiplex {
    mounts: Vec<Mount>,
}

impl std::fmt::Debug for Multiplex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Multiplex").field("prefixes", &self.mounts.iter().map(|m| &m.prefix).collect::<Vec<_>>()).finish()
    }
}

/// Fixed stat properties for the synthetic root (spec §4.2.2): size 4096,
/// epoch-zero timestamps, a collection.
fn root_metadata() -> Box<dyn DavMetaData> {
    Box::new(SimpleMetaData {
        len: 4096,
        modified: Some(SystemTime::UNIX_EPOCH),
        created: Some(SystemTime::UNIX_EPOCH),
        accessed: Some(SystemTime::UNIX_EPOCH),
        is_dir: true,
        inode: 0,
        executable: None,
    })
}

impl Multiplex {
    pub fn new(mounts: Vec<Mount>) -> Result<Multiplex, String> {
        let mut seen = std::collections::HashSet::new();
        for m in &mounts {
            if !seen.insert(m.prefix.clone()) {
                return Err(format!("duplicate mount prefix: {}", m.prefix));
            }
        }
        Ok(Multiplex { mounts })
    }

    /// Splits a path into `(mount, residual-path-inside-that-backend)`, or
    /// `None` if `path` is the synthetic root itself.
    fn resolve(&self, path: &DavPathRef) -> FsResult<Option<(&Mount, DavPath)>> {
        if path.is_root() {
            return Ok(None);
        }
        for m in &self.mounts {
            if let Some(rest) = path.strip_prefix_segment(&m.prefix) {
                return Ok(Some((m, rest)));
            }
        }
        Err(FsError::NotFound)
    }

    fn mount_for(&self, prefix: &str) -> Option<&Mount> {
        self.mounts.iter().find(|m| m.prefix == prefix)
    }
}

impl Filesystem for Multiplex {
    fn metadata(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<Box<dyn DavMetaData>> {
        match self.resolve(path)? {
            None => Ok(root_metadata()),
            Some((m, rest)) => m.backend.metadata(user, &rest),
        }
    }

    fn read_dir(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<Vec<DirEntry>> {
        match self.resolve(path)? {
            None => Ok(self
                .mounts
                .iter()
                .map(|m| DirEntry { name: m.prefix.clone().into_bytes(), metadata: Ok(root_metadata()) })
                .collect()),
            Some((m, rest)) => m.backend.read_dir(user, &rest),
        }
    }

    fn open(&self, user: Option<&str>, path: &DavPathRef, options: OpenOptions) -> FsResult<Box<dyn DavFile>> {
        match self.resolve(path)? {
            None => Err(FsError::Forbidden),
            Some((m, rest)) => m.backend.open(user, &rest, options),
        }
    }

    fn create_dir(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<()> {
        match self.resolve(path)? {
            None => Err(FsError::Forbidden),
            Some((m, rest)) => m.backend.create_dir(user, &rest),
        }
    }

    fn remove_dir(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<()> {
        match self.resolve(path)? {
            None => Err(FsError::Forbidden),
            Some((m, rest)) => m.backend.remove_dir(user, &rest),
        }
    }

    fn remove_file(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<()> {
        match self.resolve(path)? {
            None => Err(FsError::Forbidden),
            Some((m, rest)) => m.backend.remove_file(user, &rest),
        }
    }

    fn rename(&self, user: Option<&str>, from: &DavPathRef, to: &DavPathRef) -> FsResult<()> {
        let from_r = self.resolve(from)?.ok_or(FsError::Forbidden)?;
        let to_r = self.resolve(to)?.ok_or(FsError::Forbidden)?;
        if from_r.0.prefix != to_r.0.prefix {
            // Open Question (iii): cross-prefix MOVE is not a local rename.
            return Err(FsError::CrossBackend);
        }
        from_r.0.backend.rename(user, &from_r.1, &to_r.1)
    }

    fn copy(&self, user: Option<&str>, from: &DavPathRef, to: &DavPathRef) -> FsResult<()> {
        let from_r = self.resolve(from)?.ok_or(FsError::Forbidden)?;
        let to_r = self.resolve(to)?.ok_or(FsError::Forbidden)?;
        if from_r.0.prefix == to_r.0.prefix {
            from_r.0.backend.copy(user, &from_r.1, &to_r.1)
        } else {
            // cross-backend copy: stream bytes through, backend APIs only.
            let mut src = from_r.0.backend.open(user, &from_r.1, OpenOptions::read())?;
            let mut buf = Vec::new();
            use std::io::Read;
            src.read_to_end(&mut buf).map_err(FsError::from)?;
            let mut dst = to_r.0.backend.open(user, &to_r.1, OpenOptions::write())?;
            use std::io::Write;
            dst.write_all(&buf).map_err(FsError::from)?;
            Ok(())
        }
    }

    fn get_uid(&self, user: Option<&str>, path: &DavPathRef) -> String {
        match self.resolve(path) {
            Ok(None) => "multiplex:/".to_string(),
            Ok(Some((m, rest))) => format!("{}:{}", m.prefix, m.backend.get_uid(user, &rest)),
            Err(_) => format!("multiplex-notfound:{}", path.as_display_string()),
        }
    }

    fn quota(&self, user: Option<&str>) -> Option<(u64, u64)> {
        // no single well-defined quota across mounted backends at the root.
        let _ = user;
        None
    }

    fn symlink_metadata(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<Box<dyn DavMetaData>> {
        match self.resolve(path)? {
            None => Ok(root_metadata()),
            Some((m, rest)) => m.backend.symlink_metadata(user, &rest),
        }
    }
}

#[allow(dead_code)]
fn clone_for_entry(meta: &dyn DavMetaData) -> Box<dyn DavMetaData> {
    clone_metadata(meta)
}
