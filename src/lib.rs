//! Multi-user, multi-backend WebDAV server library (RFC 4918 Class 1/2).
//!
//! The public surface is small: build a [`fs::Filesystem`] (a single
//! [`fs::directory::Directory`], a [`fs::home::Home`], or several composed
//! under a [`fs::multiplex::Multiplex`]), wrap it and an [`auth::Authenticator`]
//! in a [`dispatcher::Dispatcher`], and feed it [`request::DavRequest`]s built
//! from whatever HTTP transport is in front of it -- see `bin/server.rs` for
//! the `tiny_http`-backed reference transport.

#[macro_use]
extern crate lazy_static;

pub mod auth;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fs;
pub mod headers;
pub mod listing;
pub mod lock;
pub mod lockxml;
pub mod path;
pub mod propfind;
pub mod props;
pub mod request;
pub mod xml_util;

pub use auth::{AllowAllAuthorizer, Authenticator, Authorizer, StaticAuthenticator};
pub use config::{Cli, Config};
pub use dispatcher::{DavResponse, Dispatcher};
pub use error::{DavError, DavResult, FsError, FsResult};
pub use path::{DavPath, DavPathRef};
pub use request::DavRequest;
