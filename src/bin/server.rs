//! Reference transport (spec §5 "Concurrency Model"): a blocking,
//! thread-per-request `tiny_http` listener that turns each inbound request
//! into a [`multidav::DavRequest`], runs it through one shared
//! [`multidav::Dispatcher`], and writes the resulting [`multidav::DavResponse`]
//! back out.
//!
//! Grounded on the teacher's `src/bin/main.rs`/`sample-server.rs` for the
//! overall shape (one listener, `env_logger::init()`, Basic-auth challenge on
//! missing credentials) generalized from hyper's async service model to the
//! synchronous `tiny_http` + `threadpool` stack this crate's dispatcher is
//! built around.

use std::io::Read;
use std::sync::Arc;

use clap::Parser;
use multidav::config::{Cli, Config};
use multidav::dispatcher::{DavResponse, Dispatcher};
use multidav::request::DavRequest;

fn header_map(request: &tiny_http::Request) -> http::HeaderMap {
    let mut headers = http::HeaderMap::new();
    for h in request.headers() {
        let name = match http::HeaderName::from_bytes(h.field.as_str().as_bytes()) {
            Ok(n) => n,
            Err(_) => continue,
        };
        let value = match http::HeaderValue::from_str(h.value.as_str()) {
            Ok(v) => v,
            Err(_) => continue,
        };
        headers.append(name, value);
    }
    headers
}

fn send(request: tiny_http::Request, resp: DavResponse) {
    let mut response = tiny_http::Response::from_data(resp.body).with_status_code(resp.status.as_u16());
    for (name, value) in resp.headers {
        if let Ok(header) = tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            response.add_header(header);
        }
    }
    if let Err(e) = request.respond(response) {
        log::warn!("failed writing response: {}", e);
    }
}

fn handle_one(dispatcher: &Dispatcher, mut request: tiny_http::Request) {
    let method = request.method().to_string();
    let url = request.url().to_string();
    let headers = header_map(&request);

    let mut body = Vec::new();
    if let Err(e) = request.as_reader().read_to_end(&mut body) {
        log::warn!("failed reading request body: {}", e);
        let resp = DavResponse { status: http::StatusCode::BAD_REQUEST, headers: Vec::new(), body: Vec::new() };
        send(request, resp);
        return;
    }

    let resp = match DavRequest::parse(&method, &url, &headers, body) {
        Ok(req) => dispatcher.dispatch(req),
        Err(e) => DavResponse { status: e.statuscode(), headers: Vec::new(), body: Vec::new() },
    };
    send(request, resp);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::from_cli(&cli).map_err(|e| -> Box<dyn std::error::Error> { e.into() })?;

    let dispatcher = Arc::new(Dispatcher::new(config.fs, config.authenticator, Arc::new(multidav::auth::AllowAllAuthorizer)));
    let server = Arc::new(tiny_http::Server::http(config.addr).map_err(|e| -> Box<dyn std::error::Error> { e })?);

    log::info!("listening on {}", config.addr);

    let pool = threadpool::ThreadPool::new(8);
    for request in server.incoming_requests() {
        let dispatcher = dispatcher.clone();
        pool.execute(move || handle_one(&dispatcher, request));
    }

    Ok(())
}
