//! Shared key generation for storage backends.
//!
//! Key format: `{uuid}.{extension}` for primary objects,
//! `{uuid}.{size_type}.{extension}` for image variants, `{uuid}.thumb.png`
//! for previews, and `{batch_id}/{key}` for batch-scoped temporaries.
//! All backends use this layout for consistency.

use uuid::Uuid;

/// Size type reserved for the fixed-box preview.
pub const PREVIEW_SIZE_TYPE: &str = "thumb";

/// Key of a primary object: `{uuid}.{extension}`.
pub fn primary_key(id: Uuid, extension: &str) -> String {
    format!("{}.{}", id, extension.trim_start_matches('.'))
}

/// Key of a resized image variant: `{uuid}.{size_type}.{extension}`.
pub fn variant_key(id: Uuid, size_type: &str, extension: &str) -> String {
    format!("{}.{}.{}", id, size_type, extension.trim_start_matches('.'))
}

/// Key of a preview thumbnail. Previews are always encoded as PNG.
pub fn preview_key(id: Uuid) -> String {
    format!("{}.{}.png", id, PREVIEW_SIZE_TYPE)
}

/// Key of a batch-scoped temporary object: `{batch_id}/{key}`.
///
/// Prefixing with the batch id keeps concurrent batches from colliding in
/// the tmp bucket and makes batch cleanup a prefix delete.
pub fn batch_tmp_key(batch_id: Uuid, key: &str) -> String {
    format!("{}/{}", batch_id, key)
}

/// Decomposed public id.
///
/// `{uuid}.{ext}` parses with no size type; `{uuid}.{size}.{ext}` carries
/// the size type of an image variant (`thumb` for the preview).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedPublicId<'a> {
    pub id: Uuid,
    pub size_type: Option<&'a str>,
    pub extension: &'a str,
}

/// Split a public id into upload id, optional size type and extension.
///
/// The extension is everything after the last `.`; the upload id is the
/// first dotted segment. Returns `None` when a segment is missing or the
/// id is not a uuid.
pub fn parse_public_id(public_id: &str) -> Option<ParsedPublicId<'_>> {
    let (upload_key, extension) = public_id.rsplit_once('.')?;
    if extension.is_empty() {
        return None;
    }
    let (id_part, size_type) = match upload_key.split_once('.') {
        Some((id_part, size)) if !size.is_empty() => (id_part, Some(size)),
        _ => (upload_key, None),
    };
    let id = Uuid::parse_str(id_part).ok()?;
    Some(ParsedPublicId {
        id,
        size_type,
        extension,
    })
}
