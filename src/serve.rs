//! Development server with live reload.
//!
//! A minimal static file server over the output tree. Served HTML gets a
//! small polling client appended; the client asks `/__kiln__/events` for the
//! hub counters once a second and reacts to changes:
//!
//! - a `reload` bump triggers a full page reload,
//! - a `css` bump re-links every stylesheet in place, so an edited style
//!   lands without losing page state.
//!
//! The watcher owns the hub and bumps counters after each rebuild; the
//! server only ever reads them.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Counter endpoint polled by the injected client.
pub const EVENTS_URL: &str = "/__kiln__/events";

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Failed to bind {addr}: {message}")]
    Bind { addr: String, message: String },
}

/// Shared change counters between the watcher and the server.
#[derive(Debug, Default)]
pub struct ReloadHub {
    reload: AtomicU64,
    css: AtomicU64,
}

impl ReloadHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal a change that needs a full page reload.
    pub fn bump_reload(&self) {
        self.reload.fetch_add(1, Ordering::SeqCst);
    }

    /// Signal a stylesheet-only change.
    pub fn bump_css(&self) {
        self.css.fetch_add(1, Ordering::SeqCst);
    }

    /// Current (reload, css) counters.
    pub fn counters(&self) -> (u64, u64) {
        (
            self.reload.load(Ordering::SeqCst),
            self.css.load(Ordering::SeqCst),
        )
    }
}

const CLIENT_SCRIPT: &str = "\n<script>(function(){var s=null;async function t(){try{var r=await fetch('/__kiln__/events',{cache:'no-store'});var v=await r.json();if(s===null)s=v;else if(v.reload!==s.reload)location.reload();else if(v.css!==s.css){s=v;document.querySelectorAll('link[rel=stylesheet]').forEach(function(l){var u=new URL(l.href);u.searchParams.set('v',v.css);l.href=u.href;});}}catch(e){}setTimeout(t,1000);}t();})();</script>\n";

/// Start the server on a background thread and return immediately.
///
/// The thread serves until the process exits; per-request failures are
/// answered with an error status and never take the server down.
pub fn spawn(
    root: PathBuf,
    addr: &str,
    hub: Arc<ReloadHub>,
    open: bool,
) -> Result<(), ServeError> {
    let server = tiny_http::Server::http(addr).map_err(|e| ServeError::Bind {
        addr: addr.to_string(),
        message: e.to_string(),
    })?;

    let url = format!("http://{addr}");
    println!("    serving {} at {url}", root.display());
    if open {
        let _ = webbrowser::open(&url);
    }

    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let response = respond(&root, hub.as_ref(), request.url());
            let cors = header("Access-Control-Allow-Origin", "*");
            let _ = match response {
                Payload::Data(bytes, content_type) => request.respond(
                    tiny_http::Response::from_data(bytes)
                        .with_header(header("Content-Type", &content_type))
                        .with_header(cors),
                ),
                Payload::NotFound => request.respond(
                    tiny_http::Response::from_string("Not Found")
                        .with_status_code(404)
                        .with_header(cors),
                ),
            };
        }
    });

    Ok(())
}

enum Payload {
    Data(Vec<u8>, String),
    NotFound,
}

fn respond(root: &Path, hub: &ReloadHub, url: &str) -> Payload {
    if url == EVENTS_URL {
        let (reload, css) = hub.counters();
        let body = format!("{{\"reload\":{reload},\"css\":{css}}}");
        return Payload::Data(body.into_bytes(), "application/json; charset=utf-8".into());
    }

    let Some(path) = resolve(root, url) else {
        return Payload::NotFound;
    };
    let content_type = content_type_for_path(&path);

    if content_type.starts_with("text/html") {
        match std::fs::read_to_string(&path) {
            Ok(mut html) => {
                html.push_str(CLIENT_SCRIPT);
                Payload::Data(html.into_bytes(), content_type)
            }
            Err(_) => Payload::NotFound,
        }
    } else {
        match std::fs::read(&path) {
            Ok(bytes) => Payload::Data(bytes, content_type),
            Err(_) => Payload::NotFound,
        }
    }
}

/// Map a request URL onto a file below the output root.
///
/// Empty and dot segments are dropped, so a crafted `..` path can never
/// escape the tree. Directory requests fall through to `index.html`.
fn resolve(root: &Path, url: &str) -> Option<PathBuf> {
    let path_only = url.split('?').next().unwrap_or("/");
    let mut segments = Vec::new();
    for segment in path_only.split('/') {
        let trimmed = segment.trim();
        if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
            continue;
        }
        segments.push(trimmed);
    }

    let mut path = root.to_path_buf();
    for segment in &segments {
        path.push(segment);
    }
    if path_only.ends_with('/') || segments.is_empty() || path.is_dir() {
        path.push("index.html");
    }
    if path.exists() && path.is_file() {
        Some(path)
    } else {
        None
    }
}

fn header(field: &str, value: &str) -> tiny_http::Header {
    // Field names are literals and values are ours; cannot fail
    tiny_http::Header::from_bytes(field.as_bytes(), value.as_bytes()).expect("valid header")
}

fn content_type_for_path(path: &Path) -> String {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
        .as_str()
    {
        "html" => "text/html; charset=utf-8".into(),
        "css" => "text/css; charset=utf-8".into(),
        "js" | "mjs" => "application/javascript; charset=utf-8".into(),
        "map" | "json" | "webmanifest" => "application/json; charset=utf-8".into(),
        "txt" => "text/plain; charset=utf-8".into(),
        "svg" => "image/svg+xml".into(),
        "png" => "image/png".into(),
        "jpg" | "jpeg" => "image/jpeg".into(),
        "gif" => "image/gif".into(),
        "webp" => "image/webp".into(),
        "ico" => "image/x-icon".into(),
        "woff" => "font/woff".into(),
        "woff2" => "font/woff2".into(),
        _ => "application/octet-stream".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn hub_counters_start_at_zero_and_bump_independently() {
        let hub = ReloadHub::new();
        assert_eq!(hub.counters(), (0, 0));
        hub.bump_css();
        hub.bump_css();
        hub.bump_reload();
        assert_eq!(hub.counters(), (1, 2));
    }

    #[test]
    fn events_endpoint_reports_counters_as_json() {
        let hub = ReloadHub::new();
        hub.bump_reload();
        let tmp = TempDir::new().unwrap();

        match respond(tmp.path(), &hub, EVENTS_URL) {
            Payload::Data(body, content_type) => {
                assert_eq!(String::from_utf8(body).unwrap(), "{\"reload\":1,\"css\":0}");
                assert!(content_type.starts_with("application/json"));
            }
            Payload::NotFound => panic!("events endpoint must always respond"),
        }
    }

    #[test]
    fn html_gets_the_polling_client_injected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.html"), "<html><body>hi</body></html>").unwrap();
        let hub = ReloadHub::new();

        match respond(tmp.path(), &hub, "/") {
            Payload::Data(body, content_type) => {
                let text = String::from_utf8(body).unwrap();
                assert!(text.contains("__kiln__/events"));
                assert!(content_type.starts_with("text/html"));
            }
            Payload::NotFound => panic!("expected index.html"),
        }
    }

    #[test]
    fn non_html_passes_through_untouched() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("css")).unwrap();
        fs::write(tmp.path().join("css/styles.min.css"), "body{margin:0}").unwrap();
        let hub = ReloadHub::new();

        match respond(tmp.path(), &hub, "/css/styles.min.css?v=3") {
            Payload::Data(body, content_type) => {
                assert_eq!(body, b"body{margin:0}");
                assert!(content_type.starts_with("text/css"));
            }
            Payload::NotFound => panic!("expected stylesheet"),
        }
    }

    #[test]
    fn dot_segments_cannot_escape_the_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("build");
        fs::create_dir_all(&root).unwrap();
        fs::write(tmp.path().join("secret.txt"), "nope").unwrap();

        assert!(resolve(&root, "/../secret.txt").is_none());
        assert!(resolve(&root, "/./../secret.txt").is_none());
    }

    #[test]
    fn missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let hub = ReloadHub::new();
        assert!(matches!(
            respond(tmp.path(), &hub, "/nope.html"),
            Payload::NotFound
        ));
    }
}
