//! Multipart upload handling.
//!
//! # Responsibilities
//! - Find the file field in a multipart form
//! - Sanitize the client-supplied file name before it touches the filesystem
//! - Stream the content to `uploads_root/<name>`, replacing any previous file
//!
//! # Design Decisions
//! - Every failure is answered as a plain-text line; nothing here can take
//!   the process down
//! - No collision renaming: last write wins
//! - A partially written file is removed when the stream fails

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tokio::io::AsyncWriteExt;

use crate::fs::safepath::{self, SafePathError, SanitizedSegment};
use crate::observability::metrics;

/// Response line for a stored upload.
pub const SUCCESS_LINE: &str = "Successfully Uploaded Original File\n";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{0}")]
    Rejected(#[from] MultipartRejection),

    #[error("{}", .0.body_text())]
    Multipart(MultipartError),

    #[error("upload exceeds the size limit")]
    TooLarge(#[source] MultipartError),

    #[error("missing file field {0:?}")]
    MissingField(String),

    #[error("file field has no file name")]
    MissingFilename,

    #[error("invalid file name {filename:?}: {source}")]
    Sanitize {
        filename: String,
        #[source]
        source: SafePathError,
    },

    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::TooLarge(err)
        } else {
            UploadError::Multipart(err)
        }
    }
}

impl UploadError {
    fn status(&self) -> StatusCode {
        match self {
            UploadError::Rejected(e) => e.status(),
            UploadError::Multipart(e) => e.status(),
            UploadError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::MissingField(_)
            | UploadError::MissingFilename
            | UploadError::Sanitize { .. } => StatusCode::BAD_REQUEST,
            UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            UploadError::Rejected(_) | UploadError::Multipart(_) => "bad_form",
            UploadError::TooLarge(_) => "too_large",
            UploadError::MissingField(_) | UploadError::MissingFilename => "missing_field",
            UploadError::Sanitize { .. } => "bad_filename",
            UploadError::Io(_) => "io_error",
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        (self.status(), format!("{self}\n")).into_response()
    }
}

/// Settings shared by every upload request.
#[derive(Debug, Clone)]
pub struct UploadState {
    pub uploads_dir: Arc<Path>,
    pub field_name: Arc<str>,
}

/// Where an upload ended up.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: SanitizedSegment,
    pub path: PathBuf,
    pub bytes: u64,
}

/// `POST /uploadFile`
pub async fn upload_file(
    State(state): State<UploadState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let result = match multipart {
        Ok(mut multipart) => receive(&mut multipart, &state.field_name, &state.uploads_dir).await,
        Err(rejection) => Err(rejection.into()),
    };

    match result {
        Ok(stored) => {
            tracing::info!(
                file = %stored.name,
                bytes = stored.bytes,
                "Stored upload"
            );
            metrics::record_upload("stored");
            SUCCESS_LINE.into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "Upload rejected");
            metrics::record_upload(err.outcome());
            if let UploadError::Sanitize { source, .. } = &err {
                metrics::record_rejected_path(source.reason());
            }
            err.into_response()
        }
    }
}

/// Persist the first field named `field_name` under `uploads_dir`.
pub async fn receive(
    multipart: &mut Multipart,
    field_name: &str,
    uploads_dir: &Path,
) -> Result<StoredFile, UploadError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(field_name) {
            continue;
        }

        let filename = field
            .file_name()
            .ok_or(UploadError::MissingFilename)?
            .to_string();
        let name = safepath::clean(&filename).map_err(|source| UploadError::Sanitize {
            filename: filename.clone(),
            source,
        })?;
        let path = name.join_to(uploads_dir);

        let mut file = tokio::fs::File::create(&path).await?;
        let mut bytes = 0u64;
        let written: Result<(), UploadError> = async {
            while let Some(chunk) = field.chunk().await? {
                file.write_all(&chunk).await?;
                bytes += chunk.len() as u64;
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(err) = written {
            drop(file);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::debug!(path = %path.display(), error = %e, "Could not remove partial upload");
            }
            return Err(err);
        }

        return Ok(StoredFile { name, path, bytes });
    }

    Err(UploadError::MissingField(field_name.to_string()))
}
