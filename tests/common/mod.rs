//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request};
use tempfile::TempDir;

use fileserver::config::FileServerConfig;
use fileserver::fs::DirectoryLayout;
use fileserver::http::FileServer;
use fileserver::lifecycle::ShutdownCoordinator;
use fileserver::net::{tls, Listener};

pub const BOUNDARY: &str = "fileserver-test-boundary";

/// Config rooted in a fresh temporary directory, listening on an ephemeral
/// loopback port without TLS.
pub fn test_config(dir: &TempDir) -> FileServerConfig {
    let mut config = FileServerConfig::default();
    config.storage.data_dir = dir.path().join("data");
    config.storage.uploads_dir = None;
    config.listener.address = "127.0.0.1".to_string();
    config.listener.port = 0;
    config.tls.enabled = false;
    config.shutdown.timeout = "5s".to_string();
    config
}

pub struct TestApp {
    pub dir: TempDir,
    pub layout: DirectoryLayout,
    pub server: FileServer,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(|_| {})
    }

    pub fn with(adjust: impl FnOnce(&mut FileServerConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(&dir);
        adjust(&mut config);
        let layout = DirectoryLayout::prepare(&config.storage).unwrap();
        let server = FileServer::new(&config, &layout).unwrap();
        Self {
            dir,
            layout,
            server,
        }
    }

    pub fn write_data(&self, name: &str, contents: &str) {
        std::fs::write(self.layout.data_dir.join(name), contents).unwrap();
    }
}

/// A running server on a real socket.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub coordinator: ShutdownCoordinator,
    pub dir: TempDir,
    pub task: tokio::task::JoinHandle<std::io::Result<()>>,
}

/// Bind, optionally provision a self-signed certificate, and start serving.
/// Shutdown is driven through `coordinator.trigger()` only.
pub async fn spawn_server(with_tls: bool) -> RunningServer {
    spawn_server_with(with_tls, "5s").await
}

/// As [`spawn_server`], draining for at most `shutdown_timeout`.
pub async fn spawn_server_with(with_tls: bool, shutdown_timeout: &str) -> RunningServer {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.tls.enabled = with_tls;
    config.shutdown.timeout = shutdown_timeout.to_string();

    let layout = DirectoryLayout::prepare(&config.storage).unwrap();
    std::fs::write(layout.data_dir.join("hello.txt"), "hello over the wire").unwrap();

    let listener = Listener::bind(&config.listener).unwrap();
    let addr = listener.local_addr();
    let tls = with_tls.then(|| tls::load_tls_config(&config.tls, &["127.0.0.1".to_string()]).unwrap());
    let server = FileServer::new(&config, &layout).unwrap();

    let coordinator = ShutdownCoordinator::new(config.shutdown.timeout().unwrap());
    tokio::spawn(coordinator.clone().run(|| std::future::pending::<()>()));
    let task = tokio::spawn(server.run(listener, tls, coordinator.clone()));

    RunningServer {
        addr,
        coordinator,
        dir,
        task,
    }
}

/// `multipart/form-data` request for `/uploadFile` with one file field.
pub fn upload_request(field: &str, filename: &str, contents: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\
         \r\n\
         {contents}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::post("/uploadFile")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn assert_absent(path: &Path) {
    assert!(!path.exists(), "{} should not exist", path.display());
}

pub async fn within<F: std::future::Future>(secs: u64, fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(secs), fut)
        .await
        .expect("timed out")
}
