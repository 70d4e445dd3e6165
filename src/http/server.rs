//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Mount the embedded assets at `/`, the data root at `/data` and the
//!   uploads root at `/uploads`
//! - Add `POST /uploadFile`
//! - Wire up middleware (request id, tracing, panic recovery)
//! - Serve plain HTTP or TLS on an already bound listener until the
//!   shutdown coordinator stops the server

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, DefaultBodyLimit},
    http::Request,
    routing::post,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::FileServerConfig;
use crate::fs::DirectoryLayout;
use crate::http::assets::EmbeddedAssets;
use crate::http::mount::{MountError, MountOptions, MountRoot, MultiRootServer};
use crate::http::request::{request_id, MakeRequestUuid, X_REQUEST_ID};
use crate::http::upload::{upload_file, UploadState};
use crate::lifecycle::ShutdownCoordinator;
use crate::net::Listener;

pub const DATA_PREFIX: &str = "/data";
pub const UPLOADS_PREFIX: &str = "/uploads";
pub const UPLOAD_PATH: &str = "/uploadFile";

/// The file server's router, ready to be bound.
pub struct FileServer {
    router: Router,
}

impl FileServer {
    pub fn new(config: &FileServerConfig, layout: &DirectoryLayout) -> Result<Self, MountError> {
        let mut mounts = MultiRootServer::new();
        mounts
            .mount_with(
                "/",
                MountRoot::embedded(EmbeddedAssets::default()),
                MountOptions {
                    fallback: config.assets.fallback.clone(),
                },
            )?
            .mount(DATA_PREFIX, MountRoot::directory(&layout.data_dir))?
            .mount(UPLOADS_PREFIX, MountRoot::directory(&layout.uploads_dir))?;

        let uploads = UploadState {
            uploads_dir: Arc::from(layout.uploads_dir.as_path()),
            field_name: Arc::from(config.uploads.field_name.as_str()),
        };

        let router = Self::build_router(mounts, uploads, config.uploads.max_bytes);
        Ok(Self { router })
    }

    fn build_router(mounts: MultiRootServer, uploads: UploadState, max_bytes: usize) -> Router {
        let upload_routes = Router::new()
            .route(UPLOAD_PATH, post(upload_file))
            .with_state(uploads)
            .layer(DefaultBodyLimit::max(max_bytes));

        mounts.into_router().merge(upload_routes).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    let client = req
                        .extensions()
                        .get::<ConnectInfo<SocketAddr>>()
                        .map(|ConnectInfo(addr)| *addr);
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        uri = %req.uri(),
                        request_id = %request_id(req),
                        client = ?client
                    )
                }))
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                .layer(CatchPanicLayer::new()),
        )
    }

    /// The complete router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until the coordinator's handle stops the server, then mark the
    /// coordinator terminated.
    pub async fn run(
        self,
        listener: Listener,
        tls: Option<RustlsConfig>,
        coordinator: ShutdownCoordinator,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr();
        let handle = coordinator.server_handle();
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        tracing::info!(address = %addr, tls = tls.is_some(), "HTTP server starting");

        let result = match tls {
            Some(tls) => {
                axum_server::from_tcp_rustls(listener.into_std(), tls)
                    .handle(handle)
                    .serve(app)
                    .await
            }
            None => {
                axum_server::from_tcp(listener.into_std())
                    .handle(handle)
                    .serve(app)
                    .await
            }
        };

        if let Err(e) = &result {
            tracing::error!(error = %e, "HTTP server failed");
        }
        coordinator.finish();
        tracing::info!("HTTP server stopped");
        result
    }
}

/// Log the served directories, one line each.
pub fn log_roots(layout: &DirectoryLayout) {
    log_root(DATA_PREFIX, &layout.data_dir);
    log_root(UPLOADS_PREFIX, &layout.uploads_dir);
}

fn log_root(prefix: &str, dir: &Path) {
    tracing::info!(prefix, directory = %dir.display(), "Serving directory");
}
