//! Static file server with multipart uploads.

pub mod config;
pub mod fs;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::FileServerConfig;
pub use http::FileServer;
pub use lifecycle::ShutdownCoordinator;
