//! Mime classification
//!
//! Pure mapping from a declared mime type to the (bucket, group, supported)
//! triple that drives the rest of the pipeline. Built once from
//! configuration and threaded through constructors.

use crate::config::MediaConfig;
use crate::models::{Bucket, Group};

/// Result of classifying one declared mime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub bucket: Bucket,
    pub group: Group,
    pub supported: bool,
}

/// Pure, total classifier over the configured per-group mime lists.
/// Unmatched mime types land in the tmp bucket as unsupported.
#[derive(Debug, Clone)]
pub struct MimeClassifier {
    image_mime_types: Vec<String>,
    doc_mime_types: Vec<String>,
    video_mime_types: Vec<String>,
}

impl MimeClassifier {
    pub fn new(media: &MediaConfig) -> Self {
        Self {
            image_mime_types: media.image_mime_types.clone(),
            doc_mime_types: media.doc_mime_types.clone(),
            video_mime_types: media.video_mime_types.clone(),
        }
    }

    pub fn classify(&self, mime_type: &str) -> Classification {
        let mime = mime_type.to_lowercase();
        if self.image_mime_types.iter().any(|m| *m == mime) {
            Classification {
                bucket: Bucket::Images,
                group: Group::Images,
                supported: true,
            }
        } else if self.doc_mime_types.iter().any(|m| *m == mime) {
            Classification {
                bucket: Bucket::Docs,
                group: Group::Docs,
                supported: true,
            }
        } else if self.video_mime_types.iter().any(|m| *m == mime) {
            Classification {
                bucket: Bucket::Videos,
                group: Group::Videos,
                supported: true,
            }
        } else {
            Classification {
                bucket: Bucket::Tmp,
                group: Group::Tmp,
                supported: false,
            }
        }
    }

    /// Flattened allow-list across all groups.
    pub fn all_mimes(&self) -> Vec<String> {
        self.image_mime_types
            .iter()
            .chain(self.doc_mime_types.iter())
            .chain(self.video_mime_types.iter())
            .cloned()
            .collect()
    }
}

/// Response content type inferred from a public id's extension.
pub fn content_type_for_extension(extension: &str) -> &'static str {
    match extension.trim_start_matches('.').to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// File extension implied by a declared mime type, used to build storage keys.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type.to_lowercase().as_str() {
        "image/jpeg" => "jpeg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/tiff" => "tiff",
        "application/pdf" => "pdf",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        _ => "bin",
    }
}
