//! Static assets compiled into the binary.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
};

/// One embedded document.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedFile {
    /// Path relative to the mount, without a leading `/`.
    pub path: &'static str,
    pub content_type: &'static str,
    pub bytes: &'static [u8],
}

/// Assets served under `/`.
pub static ASSETS: &[EmbeddedFile] = &[EmbeddedFile {
    path: "index.html",
    content_type: "text/html; charset=utf-8",
    bytes: include_bytes!("../../html/index.html"),
}];

/// Read-only table of embedded documents.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedAssets {
    files: &'static [EmbeddedFile],
}

impl EmbeddedAssets {
    pub const fn new(files: &'static [EmbeddedFile]) -> Self {
        Self { files }
    }

    /// Look up a request path. Directory paths resolve to their `index.html`.
    pub fn get(&self, path: &str) -> Option<&'static EmbeddedFile> {
        let relative = path.trim_start_matches('/');
        let lookup = if relative.is_empty() || relative.ends_with('/') {
            format!("{relative}index.html")
        } else {
            relative.to_string()
        };
        self.files.iter().find(|f| f.path == lookup)
    }

    pub fn respond(&self, req: &Request<Body>) -> Response {
        if req.method() != Method::GET && req.method() != Method::HEAD {
            return StatusCode::METHOD_NOT_ALLOWED.into_response();
        }

        let Some(file) = self.get(req.uri().path()) else {
            return StatusCode::NOT_FOUND.into_response();
        };

        let body = if req.method() == Method::HEAD {
            Body::empty()
        } else {
            Body::from(file.bytes)
        };

        (
            [
                (header::CONTENT_TYPE, file.content_type.to_string()),
                (header::CONTENT_LENGTH, file.bytes.len().to_string()),
            ],
            body,
        )
            .into_response()
    }
}

impl Default for EmbeddedAssets {
    fn default() -> Self {
        Self::new(ASSETS)
    }
}
