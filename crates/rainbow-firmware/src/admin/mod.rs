//! HTTP admin surface: lets a developer inspect and mutate the virtual
//! filesystem from a browser while the emulator runs.

mod multipart;

use std::{
    io::Read,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use rainbow_fs::{parse_slot_name, slot_name};
use serde::Serialize;
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server};
use tracing::{debug, warn};

use crate::state::{ChipState, lock};

/// Between-request tick; the stop flag is observed at this granularity.
const TICK: Duration = Duration::from_millis(100);

const ERROR_PAGE: &str = "<html><body><h1>Error</h1></body></html>\n";
const UPLOAD_FORM: &str = concat!(
    r#"<html><body><form action="/api/file/upload" method="post" "#,
    r#"enctype="multipart/form-data"><input name="file" type="file"><br />"#,
    r#"<input name="path" type="text" value="/USER/file10.bin"><br />"#,
    r#"<button type="submit">Upload</button></form></body></html>"#,
);

#[derive(Debug, Error)]
pub(crate) enum AdminError {
    #[error("could not bind admin port: {0}")]
    Bind(String),
}

/// One existing file, as reported by `/api/file/list`.
#[derive(Serialize)]
struct FileEntry {
    id: usize,
    name: String,
    size: usize,
}

/// Running admin server: the worker thread plus its stop flag.
pub(crate) struct AdminHandle {
    addr: SocketAddr,
    stop: Arc<AtomicBool>,
    worker: JoinHandle<()>,
}

impl AdminHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Flag the worker down and join it; at most one [`TICK`] of latency.
    pub fn shutdown(self) {
        self.stop.store(true, Ordering::Relaxed);
        if self.worker.join().is_err() {
            warn!("admin worker panicked");
        }
    }
}

/// Bind the admin port and service requests on a dedicated thread. Port 0
/// binds an ephemeral port; the bound address is available on the handle.
pub(crate) fn spawn(port: u16, state: Arc<Mutex<ChipState>>) -> Result<AdminHandle, AdminError> {
    let server =
        Server::http(("0.0.0.0", port)).map_err(|err| AdminError::Bind(err.to_string()))?;
    let Some(addr) = server.server_addr().to_ip() else {
        return Err(AdminError::Bind("listener has no ip address".to_owned()));
    };

    let stop = Arc::new(AtomicBool::new(false));
    let worker = thread::spawn({
        let stop = Arc::clone(&stop);
        move || {
            while !stop.load(Ordering::Relaxed) {
                match server.recv_timeout(TICK) {
                    Ok(Some(request)) => handle(request, &state),
                    Ok(None) => {}
                    Err(err) => warn!(%err, "admin accept failed"),
                }
            }
        }
    });

    Ok(AdminHandle { addr, stop, worker })
}

/// Route one request. URIs are matched regardless of method; only POST can
/// carry the multipart body the upload endpoint needs.
fn handle(request: Request, state: &Mutex<ChipState>) {
    let url = request.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    debug!(method = %request.method(), %url, "admin request");

    match path {
        "/api/file/list" => list(request, query, state),
        "/api/file/delete" => delete(request, query, state),
        "/api/file/rename" => rename(request, query, state),
        "/api/file/download" => download(request, query, state),
        "/api/file/upload" => upload(request, state),
        "/index.html" => respond(request, 200, "text/html", UPLOAD_FORM),
        _ => diagnostic(request, state),
    }
}

fn list(request: Request, query: &str, state: &Mutex<ChipState>) {
    // The path variable must be present; which path it names is ignored and
    // all of them are listed.
    if query_param(query, "path").is_none() {
        return respond(request, 400, "text/html", ERROR_PAGE);
    }
    let entries: Vec<FileEntry> = {
        let state = lock(state);
        state
            .fs
            .iter_present()
            .enumerate()
            .map(|(id, (path, file, size))| FileEntry { id, name: slot_name(path, file), size })
            .collect()
    };
    match serde_json::to_string(&entries) {
        Ok(body) => respond(request, 200, "application/json", body),
        Err(err) => {
            warn!(%err, "file list serialisation failed");
            respond(request, 400, "text/html", ERROR_PAGE);
        }
    }
}

fn delete(request: Request, query: &str, state: &Mutex<ChipState>) {
    let Some(filename) = query_param(query, "filename") else {
        return respond(request, 400, "text/html", ERROR_PAGE);
    };
    let removed = {
        let mut state = lock(state);
        match parse_slot_name(&filename) {
            Some((path, file)) if state.fs.exists(path, file) => {
                state.fs.delete(path, file);
                true
            }
            _ => false,
        }
    };
    json_success(request, removed);
}

fn rename(request: Request, query: &str, state: &Mutex<ChipState>) {
    let Some(from_name) = query_param(query, "filename") else {
        return respond(request, 400, "text/html", ERROR_PAGE);
    };
    let Some(to_name) = query_param(query, "newFilename") else {
        return respond(request, 400, "text/html", ERROR_PAGE);
    };
    let moved = {
        let mut state = lock(state);
        match (parse_slot_name(&from_name), parse_slot_name(&to_name)) {
            (Some(from), Some(to)) => state.fs.rename(from, to),
            _ => false,
        }
    };
    json_success(request, moved);
}

fn download(request: Request, query: &str, state: &Mutex<ChipState>) {
    let Some(filename) = query_param(query, "filename") else {
        return respond(request, 400, "text/html", ERROR_PAGE);
    };
    let content = {
        let state = lock(state);
        parse_slot_name(&filename)
            .filter(|&(path, file)| state.fs.exists(path, file))
            .map(|(path, file)| state.fs.content(path, file).to_vec())
    };
    match content {
        Some(bytes) => respond(request, 200, "application/octet-stream", bytes),
        None => respond(request, 400, "text/html", ERROR_PAGE),
    }
}

fn upload(mut request: Request, state: &Mutex<ChipState>) {
    let boundary = request
        .headers()
        .iter()
        .find(|header| header.field.equiv("Content-Type"))
        .and_then(|header| multipart::boundary(header.value.as_str()))
        .map(str::to_owned);
    let Some(boundary) = boundary else {
        return respond(request, 400, "text/html", ERROR_PAGE);
    };

    let mut body = Vec::new();
    if let Err(err) = request.as_reader().read_to_end(&mut body) {
        warn!(%err, "upload body read failed");
        return respond(request, 400, "text/html", ERROR_PAGE);
    }

    let fields = multipart::fields(&body, &boundary);
    let slot = fields
        .iter()
        .find(|(name, _)| name == "path")
        .and_then(|(_, value)| std::str::from_utf8(value).ok())
        .and_then(parse_slot_name);
    let content = fields.into_iter().find(|(name, _)| name == "file").map(|(_, value)| value);
    let (Some((path, file)), Some(content)) = (slot, content) else {
        return respond(request, 400, "text/html", ERROR_PAGE);
    };

    if lock(state).fs.replace(path, file, content) {
        respond(request, 200, "text/html", "<html><body><p>Upload success</p></body></html>\n");
    } else {
        respond(request, 400, "text/html", ERROR_PAGE);
    }
}

/// Catch-all page: echoes the request back and shows the link status.
fn diagnostic(mut request: Request, state: &Mutex<ChipState>) {
    let mut body = Vec::new();
    if let Err(err) = request.as_reader().read_to_end(&mut body) {
        debug!(%err, "diagnostic body read failed");
    }
    let url = request.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    let link_up = lock(state).link.is_up();
    let page = format!(
        "<html><body>\n\
         <h1>Hello!</h1>\n\
         <p>Server connection is {}</p>\n\
         <p>method: {}</p>\n\
         <p>uri: {}</p>\n\
         <p>query: {}</p>\n\
         <p>body:</p>\n\
         <pre>{}</pre>\n\
         </body></html>\n",
        if link_up { "good" } else { "bad" },
        request.method(),
        path,
        query,
        String::from_utf8_lossy(&body),
    );
    respond(request, 200, "text/html", page);
}

/// First query value for `key`, percent-decoded. An empty value counts as
/// missing.
fn query_param(query: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k.as_ref() == key)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn json_success(request: Request, success: bool) {
    respond(request, 200, "application/json", format!("{{\"success\":\"{success}\"}}\n"));
}

fn respond(request: Request, status: u16, content_type: &str, body: impl Into<Vec<u8>>) {
    let response = Response::from_data(body.into())
        .with_status_code(status)
        .with_header(header("Content-Type", content_type))
        .with_header(header("Connection", "close"));
    if let Err(err) = request.respond(response) {
        debug!(%err, "admin response dropped");
    }
}

fn header(field: &str, value: &str) -> Header {
    Header::from_bytes(field.as_bytes(), value.as_bytes()).expect("static header")
}
