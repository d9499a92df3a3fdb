//! HTML directory listing for a `GET`/`HEAD` on a collection (spec §4.4.2
//! lists this alongside `GET`/`HEAD`/`PUT`/`DELETE` as a resource-level
//! operation; RFC 4918 doesn't define a body for `GET` on a collection, so
//! the format itself is this server's own presentation, not protocol).
//!
//! Grounded on the teacher's `src/handle_gethead.rs`: directories first then
//! files, both alphabetical; hidden (dot-prefixed) entries skipped; a
//! synthetic ".." row; `htmlescape::encode_minimal` for both the path and
//! entry names. Built as one `String` instead of the teacher's chunked
//! `CoroStream` output -- no async runtime to stream it through here.

use crate::fs::{DavMetaData, Filesystem};
use crate::path::DavPathRef;

fn httpdate_short(t: std::time::SystemTime) -> String {
    let datetime: chrono::DateTime<chrono::Utc> = t.into();
    datetime.format("%Y-%m-%d %H:%M").to_string()
}

/// Renders the `<html>` index page for `path`, a known collection.
pub fn render_listing(fs: &dyn Filesystem, user: Option<&str>, path: &DavPathRef) -> crate::error::FsResult<String> {
    struct Row {
        href: String,
        name: String,
        is_dir: bool,
        modified: Option<std::time::SystemTime>,
        len: u64,
    }

    let entries = fs.read_dir(user, path)?;
    let mut rows = Vec::new();
    for entry in entries {
        let name = entry.name();
        if name.starts_with(b".") {
            continue;
        }
        let meta = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        let mut npath = path.to_owned();
        npath.push_segment(&name);
        npath.add_slash_if(meta.is_dir());
        rows.push(Row {
            href: npath.as_url_string(),
            name: String::from_utf8_lossy(&name).into_owned(),
            is_dir: meta.is_dir(),
            modified: meta.modified().ok(),
            len: meta.len(),
        });
    }

    rows.sort_by(|a, b| match (a.is_dir, b.is_dir) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });

    let upath = htmlescape::encode_minimal(&path.as_url_string());
    let mut w = String::new();
    w.push_str("<html><head>");
    w.push_str(&format!("<title>Index of {}</title>", upath));
    w.push_str("<style>table { border-collapse: separate; border-spacing: 1.5em 0.25em; } .mono { font-family: monospace; }</style>");
    w.push_str("</head><body>");
    w.push_str(&format!("<h1>Index of {}</h1>", upath));
    w.push_str("<table><tr><th>Name</th><th>Last modified</th><th>Size</th></tr>");
    w.push_str("<tr><th colspan=\"3\"><hr></th></tr>");
    if !path.is_root() {
        w.push_str("<tr><td><a href=\"..\">Parent Directory</a></td><td>&nbsp;</td><td class=\"mono\" align=\"right\">[DIR]</td></tr>");
    }

    for row in &rows {
        let modified = row.modified.map(httpdate_short).unwrap_or_default();
        let size = if row.is_dir { "[DIR]".to_string() } else { row.len.to_string() };
        let name = htmlescape::encode_minimal(&row.name);
        w.push_str(&format!(
            "<tr><td><a href=\"{}\">{}</a></td><td class=\"mono\">{}</td><td class=\"mono\" align=\"right\">{}</td></tr>",
            row.href, name, modified, size
        ));
    }

    w.push_str("<tr><th colspan=\"3\"><hr></th></tr></table></body></html>");
    Ok(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::directory::Directory;
    use crate::path::DavPath;

    #[test]
    fn lists_directories_before_files_case_insensitively() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("B.txt"), b"x").unwrap();
        std::fs::write(tmp.path().join("a.txt"), b"x").unwrap();
        std::fs::create_dir(tmp.path().join("zzz")).unwrap();
        std::fs::write(tmp.path().join(".hidden"), b"x").unwrap();
        let dir = Directory::new(tmp.path().to_path_buf(), false);
        let path = DavPath::new("/").unwrap();
        let html = render_listing(&dir, None, &path).unwrap();
        let pos_zzz = html.find("zzz").unwrap();
        let pos_a = html.find("a.txt").unwrap();
        let pos_b = html.find("B.txt").unwrap();
        assert!(pos_zzz < pos_a && pos_a < pos_b);
        assert!(!html.contains(".hidden"));
    }

    #[test]
    fn root_listing_omits_parent_directory_row() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Directory::new(tmp.path().to_path_buf(), false);
        let path = DavPath::new("/").unwrap();
        let html = render_listing(&dir, None, &path).unwrap();
        assert!(!html.contains("Parent Directory"));
    }

    #[test]
    fn non_root_listing_includes_parent_directory_row() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        let dir = Directory::new(tmp.path().to_path_buf(), false);
        let path = DavPath::new("/sub").unwrap();
        let html = render_listing(&dir, None, &path).unwrap();
        assert!(html.contains("Parent Directory"));
    }
}
