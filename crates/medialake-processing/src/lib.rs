//! Medialake Processing Library
//!
//! CPU-bound image work for Medialake: decode, fixed-box previews, and
//! coefficient-scaled size variants. Transforms are synchronous in
//! `transform` and offloaded to the blocking pool through `render`.

pub mod render;
pub mod transform;

// Re-export commonly used types
pub use render::{render_preview, render_variant};
pub use transform::{ImageTransformer, RenderedPreview, RenderedVariant};
