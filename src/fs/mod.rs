//! Filesystem subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     StorageConfig → layout.rs (create data/ and uploads/, mode 0700)
//!
//! Per upload:
//!     client file name → safepath.rs (clean) → SanitizedSegment
//!     → joined onto the uploads root
//! ```
//!
//! # Design Decisions
//! - safepath is the only trust boundary for client-supplied names
//! - Directories are private to the serving user

pub mod layout;
pub mod safepath;

pub use layout::{DirectoryLayout, LayoutError};
pub use safepath::{clean, SafePathError, SanitizedSegment};
