//! # File Persister Module
//!
//! Maps a complete selection to its directory under the storage root and
//! writes every attachment of a batch into it.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::errors::PersistError;
use crate::selection::CompleteSelection;

/// Name of the directory created under the configured base path
pub const STORAGE_DIR: &str = "structure_inspections";

/// Extension used for compressed photo uploads
pub const PHOTO_EXTENSION: &str = "jpg";

/// Default number of items between progress reports
pub const DEFAULT_PROGRESS_EVERY: usize = 3;

/// How an attachment was sent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachmentKind {
    Photo,
    Document,
}

/// Descriptor of one incoming attachment; the bytes are fetched on persist
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    /// Reference used to fetch the bytes from the upstream source
    pub source_id: String,
    /// Stable id provided by the source, used in the filename
    pub unique_id: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub byte_size: Option<u32>,
    pub received_at: DateTime<Utc>,
    pub original_filename: Option<String>,
}

impl Attachment {
    pub fn extension(&self) -> String {
        match self.kind {
            AttachmentKind::Photo => PHOTO_EXTENSION.to_string(),
            AttachmentKind::Document => self
                .original_filename
                .as_deref()
                .and_then(|name| Path::new(name).extension())
                .map(|ext| sanitize_component(&ext.to_string_lossy()).to_lowercase())
                .filter(|ext| !ext.is_empty())
                .unwrap_or_else(|| PHOTO_EXTENSION.to_string()),
        }
    }
}

/// Upstream store the attachment bytes are downloaded from
#[async_trait]
pub trait AttachmentSource: Send + Sync {
    async fn fetch(&self, source_id: &str) -> Result<Vec<u8>>;
}

/// Snapshot sent to the progress reporter while a batch is written
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PersistProgress {
    pub processed: usize,
    pub total: usize,
    pub saved: usize,
    pub failed: usize,
}

/// Receives progress updates; purely informational
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report(&self, progress: PersistProgress);
}

/// Reporter that drops every update
pub struct SilentProgress;

#[async_trait]
impl ProgressReporter for SilentProgress {
    async fn report(&self, _progress: PersistProgress) {}
}

/// Outcome of persisting one batch
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub saved: usize,
    pub failed: usize,
    pub filenames: Vec<String>,
    pub directory: PathBuf,
}

/// Writes batches under `<root>/<inspection>/<block>/<level>/<orientation>/unsorted/`
#[derive(Clone, Debug)]
pub struct FilePersister {
    root: PathBuf,
    progress_every: usize,
}

impl FilePersister {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }

    pub fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = every.max(1);
        self
    }

    pub fn target_dir(&self, selection: &CompleteSelection) -> PathBuf {
        self.root.join(selection.relative_dir())
    }

    /// Persist every attachment of a batch in order.
    ///
    /// A failed fetch or write is counted and the remaining attachments are
    /// still processed. Only a failure to create the directory aborts.
    pub async fn persist(
        &self,
        selection: &CompleteSelection,
        attachments: &[Attachment],
        source: &dyn AttachmentSource,
        progress: &dyn ProgressReporter,
    ) -> Result<PersistReport, PersistError> {
        let directory = self.target_dir(selection);
        tokio::fs::create_dir_all(&directory).await.map_err(|e| {
            error!(path = %directory.display(), error = %e, "Failed to create target directory");
            PersistError::CreateDirectory(format!("{}: {e}", directory.display()))
        })?;

        let total = attachments.len();
        let mut report = PersistReport {
            directory: directory.clone(),
            ..Default::default()
        };

        for (i, attachment) in attachments.iter().enumerate() {
            let index = i + 1;
            let filename = generate_filename(attachment, index);

            match write_attachment(source, attachment, &directory.join(&filename)).await {
                Ok(bytes) => {
                    debug!(file = %filename, bytes, "Attachment saved");
                    report.saved += 1;
                    report.filenames.push(filename);
                }
                Err(e) => {
                    error!(index, source_id = %attachment.source_id, error = %e, "Failed to save attachment");
                    report.failed += 1;
                }
            }

            if index % self.progress_every == 0 || index == total {
                progress
                    .report(PersistProgress {
                        processed: index,
                        total,
                        saved: report.saved,
                        failed: report.failed,
                    })
                    .await;
            }
        }

        info!(
            path = %directory.display(),
            saved = report.saved,
            failed = report.failed,
            "Batch persisted"
        );
        Ok(report)
    }
}

async fn write_attachment(
    source: &dyn AttachmentSource,
    attachment: &Attachment,
    path: &Path,
) -> Result<usize> {
    let bytes = source.fetch(&attachment.source_id).await?;
    tokio::fs::write(path, &bytes).await?;
    Ok(bytes.len())
}

/// `<YYYYmmdd_HHMMSS>_<index:03>_<unique_id>.<ext>`
pub fn generate_filename(attachment: &Attachment, index: usize) -> String {
    format!(
        "{}_{:03}_{}.{}",
        attachment.received_at.format("%Y%m%d_%H%M%S"),
        index,
        sanitize_component(&attachment.unique_id),
        attachment.extension()
    )
}

/// Keep only characters that are safe inside a single path component
fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn attachment(kind: AttachmentKind, unique_id: &str, name: Option<&str>) -> Attachment {
        Attachment {
            kind,
            source_id: format!("file-{unique_id}"),
            unique_id: unique_id.to_string(),
            width: None,
            height: None,
            byte_size: None,
            received_at: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
            original_filename: name.map(str::to_string),
        }
    }

    #[test]
    fn test_photo_filename() {
        let photo = attachment(AttachmentKind::Photo, "AQADx1", None);
        assert_eq!(generate_filename(&photo, 7), "20240309_140507_007_AQADx1.jpg");
    }

    #[test]
    fn test_document_keeps_original_extension() {
        let doc = attachment(AttachmentKind::Document, "u1", Some("IMG_0001.HEIC"));
        assert_eq!(generate_filename(&doc, 1), "20240309_140507_001_u1.heic");

        let no_ext = attachment(AttachmentKind::Document, "u2", Some("scan"));
        assert_eq!(no_ext.extension(), "jpg");
    }

    #[test]
    fn test_unique_id_is_sanitized() {
        let photo = attachment(AttachmentKind::Photo, "../etc/x", None);
        assert_eq!(generate_filename(&photo, 1), "20240309_140507_001_etcx.jpg");
    }
}
