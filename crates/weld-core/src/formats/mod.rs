//! # Formats Module
//!
//! On-disk formats produced by the pipeline: the packed archive and the
//! machine-readable unit metadata.

pub mod archive;
pub mod metadata;

pub use archive::{
    ARCHIVE_MAGIC, ARCHIVE_VERSION, Archive, ArchiveEntry, ArchiveHeader, MAX_ARCHIVE_ENTRIES,
};
#[cfg(feature = "crypto-hash")]
pub use archive::archive_digest;
pub use metadata::{UnitMetadata, read_archived_metadata, read_metadata};
