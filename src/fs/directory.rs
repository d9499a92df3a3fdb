//! Directory Backend (C4, spec §4.2.1): a local directory with mandatory
//! path confinement and optional per-user identity switching.
//!
//! Grounded on the teacher's `src/localfs.rs`: `fspath` joining, the
//! public/private `0o644`/`0o600` mode split on `open`/`create_dir`, and
//! `LocalFsMetaData::etag`'s SHA-256 computation (there `#[cfg(target_os =
//! "linux")]`-gated; kept unconditional here since the spec requires a
//! stable etag on every resource, not just Linux).

use std::fs::{self, File, OpenOptions as StdOpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use sha2::{Digest, Sha256};

use crate::error::{FsError, FsResult};
use crate::fs::operator::{NoneOperator, Operator, OperatorGuard};
use crate::fs::{DavFile, DavMetaData, DirEntry, Filesystem, OpenOptions};
use crate::path::DavPathRef;

#[derive(Debug)]
pub struct Directory {
    base: PathBuf,
    allowed: Vec<PathBuf>,
    public: bool,
    operator: Arc<dyn Operator>,
}

impl Directory {
    pub fn new(base: impl Into<PathBuf>, public: bool) -> Directory {
        Directory { base: base.into(), allowed: Vec::new(), public, operator: Arc::new(NoneOperator) }
    }

    pub fn with_operator(mut self, operator: Arc<dyn Operator>) -> Directory {
        self.operator = operator;
        self
    }

    pub fn with_allowed_paths(mut self, allowed: Vec<PathBuf>) -> Directory {
        self.allowed = allowed;
        self
    }

    /// Path confinement (spec §4.2.1, invariant 3): `real` must, after
    /// normalization, be a prefix of `base` or of one of `allowed`. `..`
    /// segments have already been collapsed by [`crate::path::DavPath::new`];
    /// this only has to check the result didn't land outside the sandbox,
    /// which can only happen via a symlinked ancestor directory since the
    /// lexical path itself can no longer contain `..`.
    fn fspath(&self, path: &DavPathRef) -> FsResult<PathBuf> {
        let real = path.as_pathbuf_with_base(&self.base);
        let within = |root: &Path| real.starts_with(root);
        if within(&self.base) || self.allowed.iter().any(|p| within(p)) {
            Ok(real)
        } else {
            Err(FsError::Forbidden)
        }
    }

    fn guard(&self, user: Option<&str>) -> Option<OperatorGuard<'_>> {
        user.map(|u| OperatorGuard::new(self.operator.as_ref(), u))
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryMetaData {
    meta: fs::Metadata,
    path: PathBuf,
}

impl DirectoryMetaData {
    fn compute_etag(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.meta.len().to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(self.meta.mtime().to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(self.meta.ctime().to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(self.meta.atime().to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(self.meta.ino().to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(self.path.to_string_lossy().as_bytes());
        let digest = hasher.finalize();
        hex_encode(&digest)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

impl DavMetaData for DirectoryMetaData {
    fn len(&self) -> u64 {
        self.meta.len()
    }

    fn modified(&self) -> FsResult<SystemTime> {
        self.meta.modified().map_err(FsError::from)
    }

    fn is_dir(&self) -> bool {
        self.meta.is_dir()
    }

    fn created(&self) -> FsResult<SystemTime> {
        Ok(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(self.meta.ctime().max(0) as u64))
    }

    fn accessed(&self) -> FsResult<SystemTime> {
        self.meta.accessed().map_err(FsError::from)
    }

    fn inode(&self) -> u64 {
        self.meta.ino()
    }

    fn executable(&self) -> FsResult<bool> {
        Ok(self.meta.mode() & 0o100 != 0)
    }

    fn etag(&self) -> String {
        self.compute_etag()
    }
}

#[derive(Debug)]
pub struct DirectoryFile(File);

impl Read for DirectoryFile {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

impl Write for DirectoryFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()
    }
}

impl Seek for DirectoryFile {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.0.seek(pos)
    }
}

impl DavFile for DirectoryFile {
    fn metadata(&self) -> FsResult<Box<dyn DavMetaData>> {
        let meta = self.0.metadata().map_err(FsError::from)?;
        Ok(Box::new(DirectoryMetaData { meta, path: PathBuf::new() }))
    }
}

impl Filesystem for Directory {
    fn metadata(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<Box<dyn DavMetaData>> {
        let _g = self.guard(user);
        let real = self.fspath(path)?;
        let meta = fs::metadata(&real).map_err(FsError::from)?;
        Ok(Box::new(DirectoryMetaData { meta, path: real }))
    }

    fn symlink_metadata(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<Box<dyn DavMetaData>> {
        let _g = self.guard(user);
        let real = self.fspath(path)?;
        let meta = fs::symlink_metadata(&real).map_err(FsError::from)?;
        Ok(Box::new(DirectoryMetaData { meta, path: real }))
    }

    fn read_dir(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<Vec<DirEntry>> {
        let _g = self.guard(user);
        let real = self.fspath(path)?;
        let rd = fs::read_dir(&real).map_err(FsError::from)?;
        let mut out = Vec::new();
        for ent in rd {
            let ent = ent.map_err(FsError::from)?;
            let name = ent.file_name().into_encoded_bytes();
            let metadata = ent
                .metadata()
                .map(|meta| -> Box<dyn DavMetaData> { Box::new(DirectoryMetaData { meta, path: ent.path() }) })
                .map_err(FsError::from);
            out.push(DirEntry { name, metadata });
        }
        Ok(out)
    }

    fn open(&self, user: Option<&str>, path: &DavPathRef, options: OpenOptions) -> FsResult<Box<dyn DavFile>> {
        let _g = self.guard(user);
        let real = self.fspath(path)?;
        let mode: u32 = if self.public { 0o644 } else { 0o600 };
        let mut oo = StdOpenOptions::new();
        oo.read(options.read).write(options.write).append(options.append).truncate(options.truncate);
        if options.create_new {
            oo.create_new(true);
        } else if options.create {
            oo.create(true);
        }
        {
            use std::os::unix::fs::OpenOptionsExt;
            oo.mode(mode);
        }
        let file = oo.open(&real).map_err(FsError::from)?;
        Ok(Box::new(DirectoryFile(file)))
    }

    fn create_dir(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<()> {
        let _g = self.guard(user);
        let real = self.fspath(path)?;
        let mode: u32 = if self.public { 0o755 } else { 0o700 };
        fs::create_dir(&real).map_err(FsError::from)?;
        let mut perms = fs::metadata(&real).map_err(FsError::from)?.permissions();
        use std::os::unix::fs::PermissionsExt;
        perms.set_mode(mode);
        fs::set_permissions(&real, perms).ok();
        Ok(())
    }

    fn remove_dir(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<()> {
        let _g = self.guard(user);
        let real = self.fspath(path)?;
        fs::remove_dir(&real).map_err(FsError::from)
    }

    fn remove_file(&self, user: Option<&str>, path: &DavPathRef) -> FsResult<()> {
        let _g = self.guard(user);
        let real = self.fspath(path)?;
        fs::remove_file(&real).map_err(FsError::from)
    }

    fn rename(&self, user: Option<&str>, from: &DavPathRef, to: &DavPathRef) -> FsResult<()> {
        let _g = self.guard(user);
        let rfrom = self.fspath(from)?;
        let rto = self.fspath(to)?;
        fs::rename(&rfrom, &rto).map_err(FsError::from)
    }

    fn copy(&self, user: Option<&str>, from: &DavPathRef, to: &DavPathRef) -> FsResult<()> {
        let _g = self.guard(user);
        let rfrom = self.fspath(from)?;
        let rto = self.fspath(to)?;
        fs::copy(&rfrom, &rto).map_err(FsError::from)?;
        Ok(())
    }

    fn get_uid(&self, _user: Option<&str>, path: &DavPathRef) -> String {
        match self.fspath(path) {
            Ok(real) => format!("dir:{}", real.display()),
            Err(_) => format!("dir-forbidden:{}", path.as_display_string()),
        }
    }

    fn quota(&self, _user: Option<&str>) -> Option<(u64, u64)> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::DavPath;

    #[test]
    fn confines_to_base() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Directory::new(tmp.path(), false);
        let p = DavPath::new("/a/b.txt").unwrap();
        let real = dir.fspath(&p).unwrap();
        assert!(real.starts_with(tmp.path()));
    }

    #[test]
    fn put_then_get_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Directory::new(tmp.path(), false);
        let p = DavPath::new("/hello.txt").unwrap();
        {
            let mut f = dir.open(None, &p, OpenOptions::write()).unwrap();
            f.write_all(b"Hi").unwrap();
        }
        let mut f = dir.open(None, &p, OpenOptions::read()).unwrap();
        let mut buf = Vec::new();
        f.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"Hi");
    }

    #[test]
    fn etag_changes_with_content() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Directory::new(tmp.path(), false);
        let p = DavPath::new("/f.txt").unwrap();
        {
            let mut f = dir.open(None, &p, OpenOptions::write()).unwrap();
            f.write_all(b"a").unwrap();
        }
        let meta1 = dir.metadata(None, &p).unwrap();
        let etag1 = meta1.len();
        {
            let mut f = dir.open(None, &p, OpenOptions::write()).unwrap();
            f.write_all(b"bbbb").unwrap();
        }
        let meta2 = dir.metadata(None, &p).unwrap();
        assert_ne!(etag1, meta2.len());
    }
}
