use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Buf;
use chrono::Utc;
use futures::stream::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::Error;

/// An uploaded file written to the staging directory.
///
/// Not `Clone`: a staged file belongs to exactly one dispatch.
#[derive(Debug, PartialEq)]
pub struct StagedFile {
    /// Filename as uploaded; used as the attachment name in the email
    pub original_name: String,
    pub stored_path: PathBuf,
    pub size_bytes: u64,
}

/// Disk-backed staging area for uploads awaiting dispatch
#[derive(Clone, Debug)]
pub struct AttachmentStore {
    root: PathBuf,
    max_file_size: u64,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>, max_file_size: u64) -> Self {
        Self {
            root: root.into(),
            max_file_size,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Write an upload to the staging directory.
    ///
    /// The per-file limit is enforced while streaming. On any failure the
    /// partially written file is removed.
    pub async fn stage<S, B>(&self, original_name: &str, data: S) -> Result<StagedFile, Error>
    where
        S: Stream<Item = Result<B, Error>>,
        B: Buf,
    {
        tokio::fs::create_dir_all(&self.root).await?;

        let stored_path = self.root.join(stored_name(original_name));

        match self.write(&stored_path, original_name, data).await {
            Ok(size_bytes) => {
                log::debug!(
                    "Staged {} ({} bytes) at {}",
                    original_name,
                    size_bytes,
                    stored_path.display()
                );

                Ok(StagedFile {
                    original_name: original_name.to_string(),
                    stored_path,
                    size_bytes,
                })
            }
            Err(e) => {
                remove_quietly(&stored_path);
                Err(e)
            }
        }
    }

    /// Stage an in-memory upload.
    pub async fn stage_bytes(&self, original_name: &str, data: &[u8]) -> Result<StagedFile, Error> {
        let chunk: Result<&[u8], Error> = Ok(data);
        self.stage(original_name, futures::stream::iter(Some(chunk))).await
    }

    async fn write<S, B>(&self, path: &Path, original_name: &str, data: S) -> Result<u64, Error>
    where
        S: Stream<Item = Result<B, Error>>,
        B: Buf,
    {
        futures::pin_mut!(data);

        let mut file = tokio::fs::File::create(path).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = data.next().await {
            let mut chunk = chunk?;
            let bytes = chunk.copy_to_bytes(chunk.remaining());

            written += bytes.len() as u64;
            if written > self.max_file_size {
                return Err(Error::AttachmentTooLarge {
                    name: original_name.to_string(),
                    limit: self.max_file_size,
                });
            }

            file.write_all(&bytes).await?;
        }

        file.flush().await?;

        Ok(written)
    }

    /// Delete a staged file. A file that is already gone is not an error.
    pub async fn release(&self, file: StagedFile) {
        release_path(&file.stored_path).await;
    }
}

async fn release_path(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => log::debug!("Released {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => (),
        Err(e) => log::warn!("Failed to release {}: {}", path.display(), e),
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => (),
        Err(e) if e.kind() == ErrorKind::NotFound => (),
        Err(e) => log::warn!("Failed to release {}: {}", path.display(), e),
    }
}

/// `<unix millis>-<uuid>-<sanitized name>`; the UUID keeps concurrent
/// uploads of the same name apart.
fn stored_name(original_name: &str) -> String {
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        sanitize(original_name)
    )
}

/// Strip any path components and replace characters that are awkward in
/// filenames.
fn sanitize(original_name: &str) -> String {
    let base = original_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or("");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "attachment".to_string()
    } else {
        cleaned.to_string()
    }
}

/// The staged files of one request.
///
/// Every file still held is deleted when the batch is dropped, so files
/// are released on every exit path of a request.
#[derive(Debug, Default)]
pub struct StagedBatch {
    files: Vec<StagedFile>,
}

impl StagedBatch {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, file: StagedFile) {
        self.files.push(file);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StagedFile> {
        self.files.iter()
    }

    /// Delete all files now instead of on drop.
    pub async fn release(mut self) {
        for file in self.files.drain(..) {
            release_path(&file.stored_path).await;
        }
    }
}

impl Drop for StagedBatch {
    // Blocking fallback for early exits and cancelled requests; the normal
    // path empties the batch through `release()` first.
    fn drop(&mut self) {
        for file in self.files.drain(..) {
            remove_quietly(&file.stored_path);
        }
    }
}
