//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (middleware: request id, trace span, panic recovery)
//!     → POST /uploadFile → upload.rs (multipart → safepath → uploads root)
//!     → /data, /uploads  → mount.rs (strip prefix → ServeDir on that root,
//!                          listing.rs for directories without index.html)
//!     → anything else    → mount.rs "/" → assets.rs (embedded index.html)
//!                          (fallback.rs turns 404 into a redirect if configured)
//!     → Send to client
//! ```

pub mod assets;
pub mod fallback;
pub mod listing;
pub mod mount;
pub mod request;
pub mod server;
pub mod upload;

pub use assets::{EmbeddedAssets, EmbeddedFile};
pub use fallback::NotFoundRedirectLayer;
pub use mount::{MountError, MountOptions, MountRoot, MultiRootServer, RootMount};
pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::FileServer;
pub use upload::{UploadError, UploadState};
