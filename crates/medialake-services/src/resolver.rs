//! Public content resolution
//!
//! Maps a public id (`{uuid}.{ext}` or `{uuid}.{size}.{ext}`) to the stored
//! object behind it. Ownership and metadata-row existence are checked
//! before any bytes leave the store.

use std::sync::Arc;

use medialake_core::classifier::content_type_for_extension;
use medialake_core::models::{Bucket, Group, Upload};
use medialake_core::AppError;
use medialake_db::MetadataStore;
use medialake_storage::keys::{self, ParsedPublicId};
use medialake_storage::{ByteStream, ObjectGateway};
use uuid::Uuid;

/// What the caller wants back from [`ContentResolver::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Only the upload's group; the store is never touched.
    Group,
    /// A streaming read of the object bytes.
    Content,
}

/// Resolution result.
pub enum ResolvedContent {
    Group(Group),
    Stream {
        content_type: String,
        body: ByteStream,
    },
}

pub struct ContentResolver {
    gateway: Arc<dyn ObjectGateway>,
    metadata: Arc<dyn MetadataStore>,
}

impl ContentResolver {
    pub fn new(gateway: Arc<dyn ObjectGateway>, metadata: Arc<dyn MetadataStore>) -> Self {
        Self { gateway, metadata }
    }

    /// Resolve a public id for `user_id`.
    ///
    /// Unknown uploads and missing derivative rows are `NotFound`; an
    /// upload owned by a different user is `Forbidden`. When `user_id` is
    /// `None` the ownership check is skipped.
    #[tracing::instrument(skip(self), fields(public_id = %public_id))]
    pub async fn resolve(
        &self,
        public_id: &str,
        user_id: Option<Uuid>,
        mode: ResolveMode,
    ) -> Result<ResolvedContent, AppError> {
        let parsed = keys::parse_public_id(public_id)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid public id: {}", public_id)))?;

        let upload = self
            .metadata
            .find_upload(parsed.id)
            .await?
            .ok_or_else(|| not_found(parsed.id))?;

        if let Some(user_id) = user_id {
            if upload.user_id != user_id {
                return Err(AppError::Forbidden(
                    "Upload belongs to another user".to_string(),
                ));
            }
        }

        if mode == ResolveMode::Group {
            return Ok(ResolvedContent::Group(upload.group));
        }

        let (bucket, key) = self.locate(&upload, &parsed).await?;
        let body = self.gateway.download_stream(bucket, &key).await?;
        Ok(ResolvedContent::Stream {
            content_type: content_type_for_extension(parsed.extension).to_string(),
            body,
        })
    }

    /// Bucket and key addressed by a parsed public id, after the
    /// derivative-row checks for the upload's group.
    async fn locate(
        &self,
        upload: &Upload,
        parsed: &ParsedPublicId<'_>,
    ) -> Result<(Bucket, String), AppError> {
        match upload.group {
            Group::Images => self.locate_image(upload, parsed).await,
            Group::Docs => {
                let document = self
                    .metadata
                    .find_document(upload.id)
                    .await?
                    .ok_or_else(|| not_found(upload.id))?;
                primary_object(upload, parsed, Bucket::Docs, &document.mime_type)
            }
            Group::Videos => {
                let video = self
                    .metadata
                    .find_video(upload.id)
                    .await?
                    .ok_or_else(|| not_found(upload.id))?;
                primary_object(upload, parsed, Bucket::Videos, &video.mime_type)
            }
            // Temporary objects are batch-scoped and never publicly
            // addressable.
            Group::Tmp => Err(not_found(upload.id)),
        }
    }

    async fn locate_image(
        &self,
        upload: &Upload,
        parsed: &ParsedPublicId<'_>,
    ) -> Result<(Bucket, String), AppError> {
        match parsed.size_type {
            Some(size) if size == keys::PREVIEW_SIZE_TYPE => {
                // The preview is always the PNG written by the image
                // finisher.
                if parsed.extension != "png" {
                    return Err(not_found(upload.id));
                }
                Ok((Bucket::Images, keys::preview_key(upload.id)))
            }
            Some(size) => {
                let variant = self
                    .metadata
                    .find_image_variant(upload.id, size)
                    .await?
                    .ok_or_else(|| not_found(upload.id))?;
                if content_type_for_extension(parsed.extension) != variant.mime_type {
                    return Err(not_found(upload.id));
                }
                Ok((
                    Bucket::Images,
                    keys::variant_key(upload.id, size, parsed.extension),
                ))
            }
            None => Ok((
                Bucket::Images,
                keys::primary_key(upload.id, parsed.extension),
            )),
        }
    }
}

fn primary_object(
    upload: &Upload,
    parsed: &ParsedPublicId<'_>,
    bucket: Bucket,
    mime_type: &str,
) -> Result<(Bucket, String), AppError> {
    // Docs and videos have no size variants.
    if parsed.size_type.is_some() {
        return Err(not_found(upload.id));
    }
    if content_type_for_extension(parsed.extension) != mime_type {
        return Err(not_found(upload.id));
    }
    Ok((bucket, keys::primary_key(upload.id, parsed.extension)))
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Upload {} not found", id))
}
