//! In-memory zip assembly
//!
//! Batch export: each requested upload is resolved through the content
//! resolver (ownership enforced per entry), its bytes collected, and the
//! archive built in memory with deflate compression on a blocking worker.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use medialake_core::AppError;
use medialake_storage::keys;
use uuid::Uuid;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::resolver::{ContentResolver, ResolveMode, ResolvedContent};

/// One requested archive member: the public id to fetch and the name the
/// entry should carry inside the zip (without extension).
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    pub public_id: String,
    pub name: String,
}

/// A fetched entry ready to be written into the zip.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub filename: String,
    pub data: Bytes,
}

pub struct ArchiveService {
    resolver: Arc<ContentResolver>,
}

impl ArchiveService {
    pub fn new(resolver: Arc<ContentResolver>) -> Self {
        Self { resolver }
    }

    /// Fetch every requested object in request order and build the zip on
    /// a blocking worker. Any entry failing to resolve fails the whole
    /// archive.
    #[tracing::instrument(skip(self, requests), fields(entries = requests.len()))]
    pub async fn archive(
        &self,
        user_id: Option<Uuid>,
        requests: &[ArchiveRequest],
    ) -> Result<Vec<u8>, AppError> {
        if requests.is_empty() {
            return Err(AppError::BadRequest("No files requested".to_string()));
        }

        let mut entries = Vec::with_capacity(requests.len());
        for request in requests {
            let parsed = keys::parse_public_id(&request.public_id).ok_or_else(|| {
                AppError::BadRequest(format!("Invalid public id: {}", request.public_id))
            })?;
            let data = self.fetch(user_id, &request.public_id).await?;
            entries.push(ArchiveEntry {
                filename: format!("{}.{}", request.name, parsed.extension),
                data,
            });
        }

        tokio::task::spawn_blocking(move || build_zip(&entries))
            .await
            .map_err(|e| AppError::Internal(format!("Archive task panicked: {}", e)))?
    }

    async fn fetch(&self, user_id: Option<Uuid>, public_id: &str) -> Result<Bytes, AppError> {
        let resolved = self
            .resolver
            .resolve(public_id, user_id, ResolveMode::Content)
            .await?;
        let mut body = match resolved {
            ResolvedContent::Stream { body, .. } => body,
            ResolvedContent::Group(_) => {
                return Err(AppError::Internal(
                    "Resolver returned no content stream".to_string(),
                ))
            }
        };

        let mut data = Vec::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            data.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(data))
    }
}

/// Build a zip archive in memory, preserving entry order. Entry names are
/// sanitized to their final path component and deduplicated on collision.
pub fn build_zip(entries: &[ArchiveEntry]) -> Result<Vec<u8>, AppError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let mut used = HashSet::new();
    for entry in entries {
        let name = dedupe_name(sanitize_entry_name(&entry.filename), &mut used);
        writer
            .start_file(name, options)
            .map_err(|e| AppError::Internal(format!("Failed to start zip entry: {}", e)))?;
        writer
            .write_all(&entry.data)
            .map_err(|e| AppError::Internal(format!("Failed to write zip entry: {}", e)))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| AppError::Internal(format!("Failed to finish zip archive: {}", e)))?;
    Ok(cursor.into_inner())
}

/// Strip any directory components so a crafted name cannot escape the
/// archive root.
fn sanitize_entry_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "file".to_string())
}

fn dedupe_name(name: String, used: &mut HashSet<String>) -> String {
    if used.insert(name.clone()) {
        return name;
    }
    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, extension)) => (stem, Some(extension)),
        None => (name.as_str(), None),
    };
    let mut counter = 1u32;
    loop {
        let candidate = match extension {
            Some(extension) => format!("{}_{}.{}", stem, counter, extension),
            None => format!("{}_{}", stem, counter),
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}
