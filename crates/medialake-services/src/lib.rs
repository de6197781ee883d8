//! Medialake Services Library
//!
//! The service layer between the HTTP surface and the storage/metadata
//! backends: batch ingestion, derivative dispatch, public content
//! resolution, pull-based range streaming, and zip archive assembly.

pub mod archive;
pub mod dispatch;
pub mod ingestion;
pub mod range_reader;
pub mod resolver;

// Re-export commonly used types
pub use archive::{build_zip, ArchiveEntry, ArchiveRequest, ArchiveService};
pub use dispatch::DerivativeDispatcher;
pub use ingestion::{IncomingFile, IngestReport, IngestionPipeline};
pub use range_reader::RangeStreamReader;
pub use resolver::{ContentResolver, ResolveMode, ResolvedContent};
