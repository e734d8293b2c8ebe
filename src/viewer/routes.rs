use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::{debug, warn};

use crate::viewer::render;

/// A fully formed reply, kept separate from tiny_http so routing is testable.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    fn html(body: String) -> Reply {
        Reply { status: 200, content_type: "text/html; charset=utf-8", body: body.into_bytes() }
    }

    pub fn not_found() -> Reply {
        Reply { status: 404, content_type: "text/plain", body: b"404 Not Found".to_vec() }
    }

    fn method_not_allowed() -> Reply {
        Reply { status: 405, content_type: "text/plain", body: b"405 Method Not Allowed".to_vec() }
    }

    fn server_error(message: String) -> Reply {
        Reply { status: 500, content_type: "text/plain", body: message.into_bytes() }
    }

    pub fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let len = self.body.len();
        let mut headers = Vec::new();
        if let Ok(h) = Header::from_bytes(&b"Content-Type"[..], self.content_type.as_bytes()) {
            headers.push(h);
        }
        Response::new(StatusCode(self.status), headers, Cursor::new(self.body), Some(len), None)
    }
}

/// Resolves a `/files/...` path inside `logdir`, refusing anything that
/// could step outside it.
pub fn safe_join(logdir: &Path, relative: &str) -> Option<PathBuf> {
    if relative.is_empty() || relative.contains('\\') || relative.contains('\0') {
        return None;
    }
    let rel = Path::new(relative);
    if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(logdir.join(rel))
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("json") => "application/json",
        Some("jsonl") => "application/x-ndjson",
        _ => "application/octet-stream",
    }
}

/// Maps a method and URL to a reply.
pub fn route(method: &Method, url: &str, logdir: &Path) -> Reply {
    let path = url.split('?').next().unwrap_or("");

    if *method != Method::Get && *method != Method::Head {
        return Reply::method_not_allowed();
    }

    if path == "/" || path == "/index.html" {
        return match render::render_index(logdir) {
            Ok(html) => Reply::html(html),
            Err(e) => {
                warn!("rendering index failed: {}", e);
                Reply::server_error(e.to_string())
            }
        };
    }

    if let Some(relative) = path.strip_prefix("/files/") {
        let Some(file) = safe_join(logdir, relative) else {
            return Reply::not_found();
        };
        return match std::fs::read(&file) {
            Ok(body) => Reply { status: 200, content_type: content_type(&file), body },
            Err(_) => Reply::not_found(),
        };
    }

    Reply::not_found()
}

/// Answers one request; failures to write the response are only logged.
pub fn dispatch(request: Request, logdir: &Path) {
    let reply = route(request.method(), request.url(), logdir);
    debug!(method = %request.method(), url = request.url(), status = reply.status, "request");
    if let Err(e) = request.respond(reply.into_response()) {
        warn!("failed to send response: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::SummaryWriter;
    use image::RgbaImage;

    #[test]
    fn serves_index_and_pngs() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = SummaryWriter::create(dir.path()).unwrap();
        w.image("samples", 3, &RgbaImage::new(4, 4)).unwrap();

        let index = route(&Method::Get, "/", dir.path());
        assert_eq!(index.status, 200);
        assert!(String::from_utf8(index.body).unwrap().contains("samples"));

        let png = route(&Method::Get, "/files/images/samples/step_3.png?x=1", dir.path());
        assert_eq!(png.status, 200);
        assert_eq!(png.content_type, "image/png");
        assert_eq!(&png.body[1..4], b"PNG");
    }

    #[test]
    fn refuses_traversal_and_unknown_paths() {
        let dir = tempfile::tempdir().unwrap();
        for url in ["/files/../secret", "/files//etc/passwd", "/files/a\\b", "/files/", "/nope"] {
            assert_eq!(route(&Method::Get, url, dir.path()).status, 404, "{}", url);
        }
        assert_eq!(route(&Method::Post, "/", dir.path()).status, 405);
    }

    #[test]
    fn safe_join_accepts_plain_relative_paths() {
        let base = Path::new("/logs");
        assert_eq!(safe_join(base, "train/events.jsonl"), Some(PathBuf::from("/logs/train/events.jsonl")));
        assert_eq!(safe_join(base, "./x"), None);
        assert_eq!(safe_join(base, "/abs"), None);
    }
}
