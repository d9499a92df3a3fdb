//! Error taxonomies shared by the backends (`FsError`) and the dispatcher (`DavError`).

use std::error::Error as StdError;
use std::fmt;
use std::io;

use http::StatusCode;

/// Errors a [`crate::fs::Filesystem`] backend can raise. Opaque to callers other
/// than the dispatcher, which is the only layer allowed to map a kind to an
/// HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    NotImplemented,
    GeneralFailure,
    Exists,
    NotFound,
    Forbidden,
    Conflict,
    InsufficientStorage,
    LoopDetected,
    PathTooLong,
    TooLarge,
    IsRemote,
    /// `MOVE`/rename across two different `Multiplex` prefixes (spec Open Question iii).
    CrossBackend,
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl StdError for FsError {}

pub type FsResult<T> = Result<T, FsError>;

/// Maps a backend-level [`FsError`] to the wire-level status code (spec §7).
pub fn fserror_to_status(e: FsError) -> StatusCode {
    match e {
        FsError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        FsError::GeneralFailure => StatusCode::INTERNAL_SERVER_ERROR,
        FsError::Exists => StatusCode::METHOD_NOT_ALLOWED,
        FsError::NotFound => StatusCode::NOT_FOUND,
        FsError::Forbidden => StatusCode::FORBIDDEN,
        FsError::Conflict => StatusCode::CONFLICT,
        FsError::InsufficientStorage => StatusCode::INSUFFICIENT_STORAGE,
        FsError::LoopDetected => StatusCode::LOOP_DETECTED,
        FsError::PathTooLong => StatusCode::URI_TOO_LONG,
        FsError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        FsError::IsRemote => StatusCode::BAD_GATEWAY,
        FsError::CrossBackend => StatusCode::BAD_GATEWAY,
    }
}

impl From<io::Error> for FsError {
    fn from(e: io::Error) -> FsError {
        match e.kind() {
            io::ErrorKind::NotFound => FsError::NotFound,
            io::ErrorKind::PermissionDenied => FsError::Forbidden,
            io::ErrorKind::AlreadyExists => FsError::Exists,
            _ => {
                if let Some(code) = e.raw_os_error() {
                    match code {
                        libc::EACCES | libc::EPERM => FsError::Forbidden,
                        libc::ENOENT => FsError::NotFound,
                        libc::EEXIST | libc::ENOTEMPTY => FsError::Exists,
                        libc::ENOSPC | libc::EDQUOT => FsError::InsufficientStorage,
                        libc::ELOOP => FsError::LoopDetected,
                        libc::ENAMETOOLONG => FsError::PathTooLong,
                        libc::EFBIG => FsError::TooLarge,
                        _ => FsError::GeneralFailure,
                    }
                } else {
                    FsError::GeneralFailure
                }
            },
        }
    }
}

/// Errors that can occur while normalizing a request path (spec §4.2.1 confinement).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    InvalidPath,
    PrefixMismatch,
    ForbiddenPath,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl StdError for ParseError {}

/// Top-level dispatcher error. Every request handler returns `DavResult<()>`;
/// the dispatcher's single top-level recovery point (spec §4.4.2 "Failure
/// policy") converts whatever falls out of this enum into a response.
#[derive(Debug)]
pub enum DavError {
    XmlReadError,
    XmlParseError,
    InvalidPath,
    ForbiddenPath,
    UnknownMethod,
    Status(StatusCode),
    IoError(io::Error),
    XmlWriterError(xml::writer::Error),
}

impl fmt::Display for DavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DavError::XmlReadError => write!(f, "error reading XML request body"),
            DavError::XmlParseError => write!(f, "malformed XML request body"),
            DavError::InvalidPath => write!(f, "invalid path"),
            DavError::ForbiddenPath => write!(f, "forbidden path"),
            DavError::UnknownMethod => write!(f, "unknown method"),
            DavError::Status(s) => write!(f, "{}", s),
            DavError::IoError(e) => write!(f, "I/O error: {}", e),
            DavError::XmlWriterError(e) => write!(f, "XML write error: {}", e),
        }
    }
}

impl StdError for DavError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DavError::IoError(e) => Some(e),
            DavError::XmlWriterError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DavError {
    fn from(e: io::Error) -> Self {
        DavError::IoError(e)
    }
}

impl From<xml::writer::Error> for DavError {
    fn from(e: xml::writer::Error) -> Self {
        DavError::XmlWriterError(e)
    }
}

impl From<ParseError> for DavError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::ForbiddenPath => DavError::ForbiddenPath,
            _ => DavError::InvalidPath,
        }
    }
}

impl From<FsError> for DavError {
    fn from(e: FsError) -> Self {
        DavError::Status(fserror_to_status(e))
    }
}

fn ioerror_to_status(e: &io::Error) -> StatusCode {
    match e.kind() {
        io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
        io::ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        io::ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        io::ErrorKind::TimedOut => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl DavError {
    pub fn statuscode(&self) -> StatusCode {
        match self {
            DavError::XmlReadError => StatusCode::BAD_REQUEST,
            DavError::XmlParseError => StatusCode::BAD_REQUEST,
            DavError::InvalidPath => StatusCode::BAD_REQUEST,
            DavError::ForbiddenPath => StatusCode::FORBIDDEN,
            DavError::UnknownMethod => StatusCode::NOT_IMPLEMENTED,
            DavError::Status(s) => *s,
            DavError::IoError(e) => ioerror_to_status(e),
            DavError::XmlWriterError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type DavResult<T> = Result<T, DavError>;
