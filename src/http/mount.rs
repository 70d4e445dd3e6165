//! Multi-root static file serving.
//!
//! # Responsibilities
//! - Validate mount prefixes when they are registered
//! - Redirect `/prefix` to `/prefix/`
//! - Strip the prefix and resolve the remainder against the mount's root only
//! - Refuse targets that resolve outside the root through symbolic links
//!
//! # Design Decisions
//! - `ServeDir` is the per-request traversal boundary for directory roots
//!   (it rejects `..` and decodes percent escapes); the canonical-path check
//!   here covers what lexical checks cannot see
//! - Escapes answer `404`, never `403`, so probing learns nothing
//! - A directory without `index.html` gets a generated listing
//! - The `/` mount becomes the router fallback; every other mount owns
//!   `prefix`, `prefix/` and `prefix/{*rest}`

use std::convert::Infallible;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any_service, get, MethodRouter},
    Router,
};
use percent_encoding::percent_decode_str;
use tower::{Layer, Service, ServiceExt};
use tower_http::services::ServeDir;

use crate::http::assets::EmbeddedAssets;
use crate::http::fallback::NotFoundRedirectLayer;
use crate::http::listing;
use crate::observability::metrics;

/// Characters the router reserves for path parameters and wildcards.
const RESERVED: &[char] = &['{', '}', '*', ':'];

#[derive(Debug, thiserror::Error)]
pub enum MountError {
    #[error("mount prefix {0:?} must start with '/'")]
    NotAbsolute(String),

    #[error("mount prefix {prefix:?} contains reserved character {found:?}")]
    ReservedCharacter { prefix: String, found: char },

    #[error("mount prefix {0:?} is already mounted")]
    Duplicate(String),

    #[error("mount prefix {prefix:?} overlaps existing mount {existing:?}")]
    Overlapping { prefix: String, existing: String },

    #[error("mount root {path:?} is unusable: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a mount serves from.
#[derive(Debug, Clone)]
pub enum MountRoot {
    Directory(PathBuf),
    Embedded(EmbeddedAssets),
}

impl MountRoot {
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        MountRoot::Directory(path.into())
    }

    pub fn embedded(assets: EmbeddedAssets) -> Self {
        MountRoot::Embedded(assets)
    }
}

/// Per-mount behaviour.
#[derive(Debug, Clone, Default)]
pub struct MountOptions {
    /// Redirect not-found requests to this document instead of answering 404.
    pub fallback: Option<String>,
}

/// A URL prefix bound to a root. Immutable once registered.
#[derive(Debug, Clone)]
pub struct RootMount {
    prefix: String,
    root: ResolvedRoot,
    options: MountOptions,
}

impl RootMount {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn options(&self) -> &MountOptions {
        &self.options
    }

    fn method_router(&self) -> MethodRouter {
        let service = MountService {
            prefix: Arc::from(self.prefix.as_str()),
            root: self.root.clone(),
        };
        match &self.options.fallback {
            Some(target) => any_service(NotFoundRedirectLayer::new(target.as_str()).layer(service)),
            None => any_service(service),
        }
    }
}

#[derive(Debug, Clone)]
enum ResolvedRoot {
    Directory {
        canonical: Arc<Path>,
        serve: ServeDir,
    },
    Embedded(EmbeddedAssets),
}

/// Independent roots under distinct URL prefixes.
#[derive(Debug, Default)]
pub struct MultiRootServer {
    mounts: Vec<RootMount>,
}

impl MultiRootServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `root` under `prefix`.
    pub fn mount(&mut self, prefix: &str, root: MountRoot) -> Result<&mut Self, MountError> {
        self.mount_with(prefix, root, MountOptions::default())
    }

    pub fn mount_with(
        &mut self,
        prefix: &str,
        root: MountRoot,
        options: MountOptions,
    ) -> Result<&mut Self, MountError> {
        let prefix = normalize_prefix(prefix)?;
        if self.mounts.iter().any(|m| m.prefix == prefix) {
            return Err(MountError::Duplicate(prefix));
        }
        if let Some(existing) = self.mounts.iter().find(|m| overlaps(&m.prefix, &prefix)) {
            return Err(MountError::Overlapping {
                existing: existing.prefix.clone(),
                prefix,
            });
        }

        let root = match root {
            MountRoot::Directory(path) => {
                let canonical = path.canonicalize().map_err(|source| MountError::Root {
                    path: path.clone(),
                    source,
                })?;
                ResolvedRoot::Directory {
                    serve: ServeDir::new(&canonical),
                    canonical: Arc::from(canonical.as_path()),
                }
            }
            MountRoot::Embedded(assets) => ResolvedRoot::Embedded(assets),
        };

        tracing::debug!(prefix = %prefix, fallback = ?options.fallback, "Mounted root");
        self.mounts.push(RootMount {
            prefix,
            root,
            options,
        });
        Ok(self)
    }

    pub fn mounts(&self) -> &[RootMount] {
        &self.mounts
    }

    /// Build the routes for every mount.
    pub fn into_router(self) -> Router {
        let mut router = Router::new();

        for mount in &self.mounts {
            let service = mount.method_router();

            if mount.prefix == "/" {
                router = router.fallback_service(service);
                continue;
            }

            let location = format!("{}/", mount.prefix);
            router = router
                .route(
                    &mount.prefix,
                    get(move || async move {
                        (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)])
                    }),
                )
                .route(&format!("{}/", mount.prefix), service.clone())
                .route(&format!("{}/{{*rest}}", mount.prefix), service);
        }

        router
    }
}

/// One prefix contains the other at a segment boundary. `/` is the router
/// fallback and overlaps nothing.
fn overlaps(a: &str, b: &str) -> bool {
    if a == "/" || b == "/" {
        return false;
    }
    let nested = |outer: &str, inner: &str| {
        inner
            .strip_prefix(outer)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    };
    nested(a, b) || nested(b, a)
}

/// Validate and canonicalize a prefix: absolute, no router syntax, no
/// trailing `/` except for the root itself.
fn normalize_prefix(prefix: &str) -> Result<String, MountError> {
    if !prefix.starts_with('/') {
        return Err(MountError::NotAbsolute(prefix.to_string()));
    }
    if let Some(found) = prefix.chars().find(|c| RESERVED.contains(c)) {
        return Err(MountError::ReservedCharacter {
            prefix: prefix.to_string(),
            found,
        });
    }

    let trimmed = prefix.trim_end_matches('/');
    Ok(if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    })
}

#[derive(Debug, Clone)]
struct MountService {
    prefix: Arc<str>,
    root: ResolvedRoot,
}

impl Service<Request<Body>> for MountService {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let this = self.clone();
        Box::pin(async move { Ok(this.handle(req).await) })
    }
}

impl MountService {
    async fn handle(self, req: Request<Body>) -> Response {
        let Some(req) = strip_prefix(&self.prefix, req) else {
            return StatusCode::NOT_FOUND.into_response();
        };

        match self.root {
            ResolvedRoot::Embedded(assets) => assets.respond(&req),
            ResolvedRoot::Directory { canonical, serve } => {
                let path = req.uri().path().to_owned();
                if escapes_root(&canonical, &path).await {
                    tracing::warn!(
                        mount = %self.prefix,
                        path = %path,
                        "Request resolved outside mount root"
                    );
                    metrics::record_rejected_path("outside_root");
                    return StatusCode::NOT_FOUND.into_response();
                }

                let method = req.method().clone();
                let response = match serve.oneshot(req).await {
                    Ok(response) => response,
                    Err(never) => match never {},
                };

                let listable = response.status() == StatusCode::NOT_FOUND
                    && path.ends_with('/')
                    && (method == Method::GET || method == Method::HEAD);
                if listable {
                    let head = method == Method::HEAD;
                    if let Some(listing) = list_directory(&canonical, &path, head).await {
                        return listing;
                    }
                }

                let mut response = response.map(Body::new);
                restore_prefix_in_location(&self.prefix, &mut response);
                response
            }
        }
    }
}

/// Rewrite the request so its path is relative to the mount.
fn strip_prefix(prefix: &str, req: Request<Body>) -> Option<Request<Body>> {
    if prefix == "/" {
        return Some(req);
    }

    let (mut parts, body) = req.into_parts();
    let rest = parts.uri.path().strip_prefix(prefix)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }
    let path = if rest.is_empty() { "/" } else { rest };
    let path_and_query = match parts.uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };

    parts.uri = Uri::builder().path_and_query(path_and_query).build().ok()?;
    Some(Request::from_parts(parts, body))
}

/// ServeDir builds directory redirects from the stripped path; put the
/// prefix back so the client lands inside the mount.
fn restore_prefix_in_location(prefix: &str, response: &mut Response) {
    if prefix == "/" || !response.status().is_redirection() {
        return;
    }
    let Some(location) = response.headers().get(header::LOCATION) else {
        return;
    };
    let Ok(location) = location.to_str() else {
        return;
    };
    if !location.starts_with('/') {
        return;
    }
    if let Ok(value) = HeaderValue::from_str(&format!("{prefix}{location}")) {
        response.headers_mut().insert(header::LOCATION, value);
    }
}

/// Listing for a directory without an `index.html`, or `None` when `path`
/// is not a readable directory.
async fn list_directory(root: &Path, path: &str, head: bool) -> Option<Response> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    if decoded.split('/').any(|segment| segment == "..") {
        return None;
    }
    let dir = join_segments(root, &decoded);
    if !tokio::fs::metadata(&dir).await.ok()?.is_dir() {
        return None;
    }

    match listing::respond(&dir, head).await {
        Ok(response) => Some(response),
        Err(e) => {
            tracing::warn!(directory = %dir.display(), error = %e, "Failed to list directory");
            None
        }
    }
}

fn join_segments(root: &Path, decoded: &str) -> PathBuf {
    let mut candidate = root.to_path_buf();
    for segment in decoded.split('/') {
        if !matches!(segment, "" | ".") {
            candidate.push(segment);
        }
    }
    candidate
}

/// True when `path` names an existing entry whose canonical location is not
/// beneath `root`. Missing entries are left for ServeDir to answer 404.
async fn escapes_root(root: &Path, path: &str) -> bool {
    let Ok(decoded) = percent_decode_str(path).decode_utf8() else {
        return false;
    };

    if decoded.split('/').any(|segment| segment == "..") {
        return true;
    }
    let candidate = join_segments(root, &decoded);

    match tokio::fs::canonicalize(&candidate).await {
        Ok(resolved) => !resolved.starts_with(root),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_normalized() {
        assert_eq!(normalize_prefix("/").unwrap(), "/");
        assert_eq!(normalize_prefix("/data").unwrap(), "/data");
        assert_eq!(normalize_prefix("/data/").unwrap(), "/data");
    }

    #[test]
    fn router_syntax_is_a_mount_error() {
        for prefix in ["/files/{id}", "/files/*", "/:id"] {
            assert!(matches!(
                normalize_prefix(prefix),
                Err(MountError::ReservedCharacter { .. })
            ));
        }
        assert!(matches!(
            normalize_prefix("data"),
            Err(MountError::NotAbsolute(_))
        ));
    }

    #[test]
    fn duplicate_prefix_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = MultiRootServer::new();
        server.mount("/data", MountRoot::directory(dir.path())).unwrap();
        let err = server
            .mount("/data/", MountRoot::directory(dir.path()))
            .unwrap_err();
        assert!(matches!(err, MountError::Duplicate(_)));
    }

    #[test]
    fn nested_prefixes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = MultiRootServer::new();
        server.mount("/", MountRoot::embedded(EmbeddedAssets::default())).unwrap();
        server.mount("/data", MountRoot::directory(dir.path())).unwrap();

        let err = server
            .mount("/data/sub", MountRoot::directory(dir.path()))
            .unwrap_err();
        assert!(matches!(err, MountError::Overlapping { ref existing, .. } if existing == "/data"));

        let mut server = MultiRootServer::new();
        server.mount("/data/sub", MountRoot::directory(dir.path())).unwrap();
        assert!(matches!(
            server.mount("/data", MountRoot::directory(dir.path())),
            Err(MountError::Overlapping { .. })
        ));

        // Sibling prefixes that only share characters are independent.
        server.mount("/database", MountRoot::directory(dir.path())).unwrap();
    }

    #[test]
    fn missing_root_is_rejected() {
        let mut server = MultiRootServer::new();
        let err = server
            .mount("/data", MountRoot::directory("/definitely/not/here"))
            .unwrap_err();
        assert!(matches!(err, MountError::Root { .. }));
    }

    #[test]
    fn strip_prefix_keeps_query() {
        let req = Request::get("/data/a/b.txt?x=1").body(Body::empty()).unwrap();
        let stripped = strip_prefix("/data", req).unwrap();
        assert_eq!(stripped.uri(), "/a/b.txt?x=1");

        let req = Request::get("/data").body(Body::empty()).unwrap();
        assert_eq!(strip_prefix("/data", req).unwrap().uri(), "/");

        let req = Request::get("/database").body(Body::empty()).unwrap();
        assert!(strip_prefix("/data", req).is_none());
    }

    #[tokio::test]
    async fn detects_traversal_and_missing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::write(root.join("inside.txt"), "ok").unwrap();

        assert!(!escapes_root(&root, "/inside.txt").await);
        assert!(!escapes_root(&root, "/missing.txt").await);
        assert!(escapes_root(&root, "/../etc/passwd").await);
        assert!(escapes_root(&root, "/%2e%2e/etc/passwd").await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn detects_symlink_escape() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "secret").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("link")).unwrap();

        assert!(escapes_root(&root, "/link/secret.txt").await);
    }
}
