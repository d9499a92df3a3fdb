//! End-to-end tests driving the `Dispatcher` the way a transport adapter
//! would: build headers + body, call `DavRequest::parse`, dispatch, assert
//! on the resulting status/headers/body. Exercises the `Multiplex` backend
//! across two mounts plus the Excel compatibility shim, which the per-module
//! unit tests don't cover end-to-end.

use std::collections::HashMap;
use std::sync::Arc;

use http::{HeaderMap, HeaderValue, StatusCode};

use multidav::auth::{AllowAllAuthorizer, StaticAuthenticator};
use multidav::fs::directory::Directory;
use multidav::fs::multiplex::{Mount, Multiplex};
use multidav::fs::Filesystem;
use multidav::{DavRequest, Dispatcher};

fn dispatcher(a: &std::path::Path, b: &std::path::Path) -> Dispatcher {
    let fs: Arc<dyn Filesystem> = Arc::new(
        Multiplex::new(vec![
            Mount { prefix: "a".into(), backend: Box::new(Directory::new(a.to_path_buf(), false)) },
            Mount { prefix: "b".into(), backend: Box::new(Directory::new(b.to_path_buf(), false)) },
        ])
        .unwrap(),
    );
    let mut creds = HashMap::new();
    creds.insert("alice".to_string(), "secret".to_string());
    Dispatcher::new(fs, Arc::new(StaticAuthenticator::new(creds)), Arc::new(AllowAllAuthorizer))
}

fn auth_headers(extra: &[(&str, &str)]) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(http::header::AUTHORIZATION, HeaderValue::from_static("Basic YWxpY2U6c2VjcmV0"));
    for (k, v) in extra {
        h.insert(http::HeaderName::from_bytes(k.as_bytes()).unwrap(), HeaderValue::from_str(v).unwrap());
    }
    h
}

#[test]
fn full_lifecycle_across_a_multiplex_mount() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let d = dispatcher(a.path(), b.path());

    // root lists both mounts.
    let req = DavRequest::parse("PROPFIND", "/", &auth_headers(&[("depth", "1")]), Vec::new()).unwrap();
    let resp = d.dispatch(req);
    assert_eq!(resp.status, StatusCode::MULTI_STATUS);
    let body = String::from_utf8_lossy(&resp.body);
    assert!(body.contains("/a/"));
    assert!(body.contains("/b/"));

    // create a file under mount "a", lock it, then refuse a write without the token.
    let mut put = DavRequest::parse("PUT", "/a/report.txt", &auth_headers(&[]), Vec::new()).unwrap();
    put.body = b"draft one".to_vec();
    assert_eq!(d.dispatch(put).status, StatusCode::CREATED);

    let lock_req = DavRequest::parse(
        "LOCK",
        "/a/report.txt",
        &auth_headers(&[]),
        b"<D:lockinfo><D:lockscope><D:exclusive/></D:lockscope><D:owner><D:href>mailto:alice@example.com</D:href></D:owner></D:lockinfo>".to_vec(),
    )
    .unwrap();
    let lock_resp = d.dispatch(lock_req);
    assert_eq!(lock_resp.status, StatusCode::OK);
    let token = lock_resp
        .headers
        .iter()
        .find(|(k, _)| k == "Lock-Token")
        .map(|(_, v)| v.trim_start_matches("<opaquelocktoken:").trim_end_matches('>').to_string())
        .unwrap();

    let mut blocked_put = DavRequest::parse("PUT", "/a/report.txt", &auth_headers(&[]), Vec::new()).unwrap();
    blocked_put.body = b"overwrite attempt".to_vec();
    assert_eq!(d.dispatch(blocked_put).status, StatusCode::LOCKED);

    // same write succeeds carrying the lock token.
    let mut authed_put =
        DavRequest::parse("PUT", "/a/report.txt", &auth_headers(&[("if", &format!("(<opaquelocktoken:{}>)", token))]), Vec::new()).unwrap();
    authed_put.body = b"final draft".to_vec();
    assert_eq!(d.dispatch(authed_put).status, StatusCode::NO_CONTENT);

    let unlock = DavRequest::parse("UNLOCK", "/a/report.txt", &auth_headers(&[("lock-token", &format!("<opaquelocktoken:{}>", token))]), Vec::new()).unwrap();
    assert_eq!(d.dispatch(unlock).status, StatusCode::OK);

    // moving within the same mount succeeds; moving across mounts is a bad gateway.
    let rename = DavRequest::parse("MOVE", "/a/report.txt", &auth_headers(&[("destination", "/a/final.txt")]), Vec::new()).unwrap();
    assert_eq!(d.dispatch(rename).status, StatusCode::CREATED);

    let cross = DavRequest::parse("MOVE", "/a/final.txt", &auth_headers(&[("destination", "/b/final.txt")]), Vec::new()).unwrap();
    assert_eq!(d.dispatch(cross).status, StatusCode::BAD_GATEWAY);
}

#[test]
fn excel_user_agent_strips_modification_timestamps_from_propfind() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let d = dispatcher(a.path(), b.path());

    let mut put = DavRequest::parse("PUT", "/a/doc.txt", &auth_headers(&[]), Vec::new()).unwrap();
    put.body = b"x".to_vec();
    d.dispatch(put);

    let plain = DavRequest::parse("PROPFIND", "/a/doc.txt", &auth_headers(&[]), Vec::new()).unwrap();
    let plain_resp = d.dispatch(plain);
    let plain_body = String::from_utf8_lossy(&plain_resp.body);
    assert!(plain_body.contains("getlastmodified"));

    let excel = DavRequest::parse("PROPFIND", "/a/doc.txt", &auth_headers(&[("user-agent", "Microsoft Office Excel 2013")]), Vec::new()).unwrap();
    let excel_resp = d.dispatch(excel);
    let excel_body = String::from_utf8_lossy(&excel_resp.body);
    assert!(!excel_body.contains("getlastmodified"));
    assert!(!excel_body.contains("Win32LastModifiedTime"));
}

#[test]
fn unauthenticated_request_is_rejected_before_touching_the_backend() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let d = dispatcher(a.path(), b.path());

    let req = DavRequest::parse("PUT", "/a/x.txt", &HeaderMap::new(), b"data".to_vec()).unwrap();
    let resp = d.dispatch(req);
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert!(!a.path().join("x.txt").exists());
}

#[test]
fn proppatch_rejects_every_property_change() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let d = dispatcher(a.path(), b.path());

    let mut put = DavRequest::parse("PUT", "/a/x.txt", &auth_headers(&[]), Vec::new()).unwrap();
    put.body = b"x".to_vec();
    d.dispatch(put);

    let body = b"<D:propertyupdate><D:set><D:prop><D:displayname>renamed</D:displayname></D:prop></D:set></D:propertyupdate>".to_vec();
    let req = DavRequest::parse("PROPPATCH", "/a/x.txt", &auth_headers(&[]), body).unwrap();
    let resp = d.dispatch(req);
    assert_eq!(resp.status, StatusCode::MULTI_STATUS);
    assert!(String::from_utf8_lossy(&resp.body).contains("403"));
}
