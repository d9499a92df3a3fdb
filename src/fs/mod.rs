//! The Backend (Filesystem) interface (C3, spec §3) and its three concrete
//! implementations: [`directory::Directory`], [`multiplex::Multiplex`], and
//! [`home::Home`].
//!
//! Grounded on the teacher's old (sync) `src/fs.rs`: the same seven-method
//! shape (`open`, `read_dir`, `metadata`, `create_dir`, `remove_dir`,
//! `remove_file`, `rename`/`copy`), trimmed of the `DavFile`/async-stream
//! machinery a blocking server does not need.

pub mod directory;
pub mod home;
pub mod multiplex;
pub mod operator;

use std::io::{Read, Seek, Write};
use std::time::SystemTime;

use crate::error::{FsError, FsResult};
use crate::path::DavPathRef;

/// Stat information about a resource. Implemented per-backend; the
/// dispatcher and PROPFIND engine only ever see `&dyn DavMetaData`.
pub trait DavMetaData: std::fmt::Debug {
    fn len(&self) -> u64;
    fn modified(&self) -> FsResult<SystemTime>;
    fn is_dir(&self) -> bool;

    fn is_file(&self) -> bool {
        !self.is_dir()
    }

    fn created(&self) -> FsResult<SystemTime> {
        Err(FsError::NotImplemented)
    }

    fn accessed(&self) -> FsResult<SystemTime> {
        Err(FsError::NotImplemented)
    }

    /// Inode-like identifier used by `Directory::get_uid`'s etag computation.
    /// `0` for backends without a native inode concept (e.g. the Multiplex
    /// synthetic root).
    fn inode(&self) -> u64 {
        0
    }

    fn executable(&self) -> FsResult<bool> {
        Err(FsError::NotImplemented)
    }

    /// `D:getetag` (spec §3, §4.2.1). Backends that can compute a stable
    /// hash override this; the default derives a weak one from length and
    /// mtime so every backend has *some* etag.
    fn etag(&self) -> String {
        let modified = self.modified().map(|t| {
            t.duration_since(SystemTime::UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
        }).unwrap_or(0);
        format!("{:x}-{:x}", self.len(), modified)
    }
}

/// What to do when opening a resource for I/O. Mirrors the teacher's
/// `fs::OpenOptions` constructors.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOptions {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub truncate: bool,
    pub create: bool,
    pub create_new: bool,
}

impl OpenOptions {
    pub fn read() -> OpenOptions {
        OpenOptions { read: true, ..Default::default() }
    }

    pub fn write() -> OpenOptions {
        OpenOptions { write: true, truncate: true, create: true, ..Default::default() }
    }
}

/// An open file handle. Blocking `Read`/`Write`/`Seek`, no async machinery.
pub trait DavFile: Read + Write + Seek + std::fmt::Debug {
    fn metadata(&self) -> FsResult<Box<dyn DavMetaData>>;
}

/// One entry returned by `read_dir`.
pub struct DirEntry {
    pub name: Vec<u8>,
    pub metadata: FsResult<Box<dyn DavMetaData>>,
}

impl DirEntry {
    pub fn name(&self) -> Vec<u8> {
        self.name.clone()
    }

    pub fn metadata(&self) -> FsResult<Box<dyn DavMetaData>> {
        match &self.metadata {
            Ok(m) => Ok(clone_metadata(m.as_ref())),
            Err(e) => Err(*e),
        }
    }
}

/// `DavMetaData` isn't `Clone` (it's a trait object); backends build a fresh
/// boxed copy instead. Kept as a free function so implementors only need to
/// supply plain field data.
pub fn clone_metadata(meta: &dyn DavMetaData) -> Box<dyn DavMetaData> {
    Box::new(SimpleMetaData {
        len: meta.len(),
        modified: meta.modified().ok(),
        created: meta.created().ok(),
        accessed: meta.accessed().ok(),
        is_dir: meta.is_dir(),
        inode: meta.inode(),
        executable: meta.executable().ok(),
    })
}

/// Plain-data `DavMetaData` used for synthetic resources (e.g. the
/// Multiplex root) and as the `Clone`-able return value of `clone_metadata`.
#[derive(Debug, Clone)]
pub struct SimpleMetaData {
    pub len: u64,
    pub modified: Option<SystemTime>,
    pub created: Option<SystemTime>,
    pub accessed: Option<SystemTime>,
    pub is_dir: bool,
    pub inode: u64,
    pub executable: Option<bool>,
}

impl DavMetaData for SimpleMetaData {
    fn len(&self) -> u64 {
        self.len
    }

    fn modified(&self) -> FsResult<SystemTime> {
        self.modified.ok_or(FsError::NotImplemented)
    }

    fn is_dir(&self) -> bool {
        self.is_dir
    }

    fn created(&self) -> FsResult<SystemTime> {
        self.created.ok_or(FsError::NotImplemented)
    }

    fn accessed(&self) -> FsResult<SystemTime> {
        self.accessed.ok_or(FsError::NotImplemented)
    }

    fn inode(&self) -> u64 {
        self.inode
    }

    fn executable(&self) -> FsResult<bool> {
        self.executable.ok_or(FsError::NotImplemented)
    }
}

/// The Backend contract (spec §3). A single trait suffices for all three
/// variants (Directory, Multiplex, Home) -- no deep hierarchy (spec §9).
pub trait Filesystem: Send + Sync + std::fmt::Debug {
    fn metadata(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<Box<dyn DavMetaData>>;

    fn symlink_metadata(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<Box<dyn DavMetaData>> {
        self.metadata(user, path)
    }

    fn read_dir(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<Vec<DirEntry>>;

    fn open(&self, user: Option<&str>, path: &DavPathRef, options: OpenOptions) -> FsResult<Box<dyn DavFile>>;

    fn create_dir(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<()>;

    fn remove_dir(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<()>;

    fn remove_file(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<()>;

    fn rename(&self, user: Option<&str>, from: &DavPathRef, to: &DavPathRef) -> FsResult<()>;

    fn copy(&self, user: Option<&str>, from: &DavPathRef, to: &DavPathRef) -> FsResult<()> {
        // Generic fallback: read the whole source and write it to the
        // destination. Directory overrides this with reflink/copy-on-write
        // when available.
        let mut src = self.open(user, from, OpenOptions::read())?;
        let mut buf = Vec::new();
        src.read_to_end(&mut buf).map_err(FsError::from)?;
        let mut dst = self.open(user, to, OpenOptions::write())?;
        dst.write_all(&buf).map_err(FsError::from)?;
        Ok(())
    }

    /// Stable resource-id used as the lock key (spec §3). Two different URL
    /// paths resolving to the same storage object must yield the same id.
    fn get_uid(&self, user: Option<&str>, path: &DavPathRef) -> String;

    /// Best-effort quota report; `None` when the backend cannot compute one.
    fn quota(&self, _user: Option<&str>) -> Option<(u64, u64)> {
        None
    }
}
