//! External configuration surface (spec §1, §4.4.1, §4.2): assembles the
//! mounted [`Filesystem`], the [`Authenticator`], and the listen address
//! from command-line flags.
//!
//! Grounded on the teacher's `src/bin/sample-server.rs` for the CLI shape
//! (port/dir/memfs/auth flags via `clap`, `env_logger::init()`), generalized
//! from one fixed backend to the repeatable `--mount PREFIX=DIR` flags spec
//! §4.2.2 needs; and on `original_source/orbit-webdavd.py`'s
//! `config_filesystems`/`config_authenticator`/`config_port` module-level
//! settings, re-expressed as CLI flags since the retrieved example pack
//! carries no `configuration.py` to translate directly. `clap`'s modern
//! `#[derive(Parser)]` is used in place of the teacher's `clap_app!` macro,
//! matching how the rest of this crate favors the ecosystem's current idiom
//! over a dependency's older surface.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;

use crate::auth::{Authenticator, StaticAuthenticator};
use crate::fs::directory::Directory;
use crate::fs::home::{Home, UnixHomeResolver};
use crate::fs::multiplex::{Mount, Multiplex};
use crate::fs::Filesystem;

#[derive(Parser, Debug)]
#[command(name = "multidav-server", about = "Multi-user, multi-backend WebDAV server")]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:4918")]
    pub listen: String,

    /// Mount a local directory under a top-level prefix, `PREFIX=DIR`.
    /// Repeatable; at least one of `--mount`/`--home` is required.
    #[arg(long = "mount", value_name = "PREFIX=DIR")]
    pub mounts: Vec<String>,

    /// Mount each authenticated user's system home directory under `/home`.
    #[arg(long)]
    pub home: bool,

    /// A static `user:password` credential. Repeatable.
    #[arg(long = "user", value_name = "USER:PASS")]
    pub users: Vec<String>,

    /// Serve world-writable (no per-mount public/private mode split).
    #[arg(long)]
    pub public: bool,
}

pub struct Config {
    pub addr: SocketAddr,
    pub fs: Arc<dyn Filesystem>,
    pub authenticator: Arc<dyn Authenticator>,
}

fn parse_mount(spec: &str, public: bool) -> Result<Mount, String> {
    let (prefix, dir) = spec.split_once('=').ok_or_else(|| format!("invalid --mount {:?}, expected PREFIX=DIR", spec))?;
    if prefix.is_empty() {
        return Err(format!("invalid --mount {:?}: prefix must not be empty", spec));
    }
    Ok(Mount { prefix: prefix.to_string(), backend: Box::new(Directory::new(dir, public)) })
}

fn parse_user(spec: &str) -> Result<(String, String), String> {
    spec.split_once(':').map(|(u, p)| (u.to_string(), p.to_string())).ok_or_else(|| format!("invalid --user {:?}, expected USER:PASS", spec))
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Config, String> {
        let addr: SocketAddr = cli.listen.parse().map_err(|e| format!("invalid --listen {:?}: {}", cli.listen, e))?;

        let mut mounts = Vec::new();
        for spec in &cli.mounts {
            mounts.push(parse_mount(spec, cli.public)?);
        }
        if cli.home {
            mounts.push(Mount { prefix: "home".to_string(), backend: Box::new(Home::new(Box::new(UnixHomeResolver))) });
        }
        if mounts.is_empty() {
            return Err("at least one of --mount or --home is required".to_string());
        }
        let fs: Arc<dyn Filesystem> = Arc::new(Multiplex::new(mounts)?);

        let mut mapping = HashMap::new();
        for spec in &cli.users {
            let (user, pass) = parse_user(spec)?;
            mapping.insert(user, pass);
        }
        let authenticator: Arc<dyn Authenticator> = Arc::new(StaticAuthenticator::new(mapping));

        Ok(Config { addr, fs, authenticator })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_mount_spec() {
        assert!(parse_mount("nouprefixordir", false).is_err());
        assert!(parse_mount("=novalue", false).is_err());
    }

    #[test]
    fn rejects_malformed_user_spec() {
        assert!(parse_user("nocolon").is_err());
        assert_eq!(parse_user("alice:secret").unwrap(), ("alice".to_string(), "secret".to_string()));
    }

    #[test]
    fn rejects_empty_mount_table() {
        let cli = Cli { listen: "127.0.0.1:0".to_string(), mounts: Vec::new(), home: false, users: Vec::new(), public: false };
        assert!(Config::from_cli(&cli).is_err());
    }

    #[test]
    fn assembles_single_mount() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = Cli {
            listen: "127.0.0.1:0".to_string(),
            mounts: vec![format!("data={}", tmp.path().display())],
            home: false,
            users: vec!["alice:secret".to_string()],
            public: false,
        };
        let cfg = Config::from_cli(&cli).unwrap();
        assert!(cfg.authenticator.authenticate("alice", "secret"));
        assert!(!cfg.authenticator.authenticate("alice", "wrong"));
    }

    #[test]
    fn rejects_duplicate_mount_prefixes() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = Cli {
            listen: "127.0.0.1:0".to_string(),
            mounts: vec![format!("data={}", tmp.path().display()), format!("data={}", tmp.path().display())],
            home: false,
            users: Vec::new(),
            public: false,
        };
        assert!(Config::from_cli(&cli).is_err());
    }
}
