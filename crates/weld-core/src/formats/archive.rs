//! # Archive Format
//!
//! The packed artifact written by `ArchiveBuild`.
//!
//! Format:
//! ```text
//! [header_len: u32 LE] [ArchiveHeader (postcard)] [ArchiveBody (postcard)]
//! ```
//!
//! Entries are sorted by path, so packing the same content root twice yields
//! identical bytes.

use crate::types::WeldError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

// =============================================================================
// HEADER
// =============================================================================

/// Magic bytes of the archive format.
pub const ARCHIVE_MAGIC: [u8; 4] = *b"WELD";

/// Current archive format version.
pub const ARCHIVE_VERSION: u8 = 1;

/// Maximum number of entries accepted when opening an archive.
///
/// Checked against the header before the body is decoded.
pub const MAX_ARCHIVE_ENTRIES: u64 = 100_000;

/// Header of a packed archive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub magic: [u8; 4],
    pub version: u8,
    pub entry_count: u64,
    /// XOR checksum of the body (see `Archive::checksum`).
    pub checksum: u64,
}

impl ArchiveHeader {
    #[must_use]
    pub fn new(entry_count: u64, checksum: u64) -> Self {
        Self {
            magic: ARCHIVE_MAGIC,
            version: ARCHIVE_VERSION,
            entry_count,
            checksum,
        }
    }

    pub fn validate(&self) -> Result<(), WeldError> {
        if self.magic != ARCHIVE_MAGIC {
            return Err(WeldError::Archive("Invalid file format".to_string()));
        }
        if self.version != ARCHIVE_VERSION {
            return Err(WeldError::Archive("Unsupported file version".to_string()));
        }
        if self.entry_count > MAX_ARCHIVE_ENTRIES {
            return Err(WeldError::Archive(format!(
                "Entry count {} exceeds maximum allowed {}",
                self.entry_count, MAX_ARCHIVE_ENTRIES
            )));
        }
        Ok(())
    }
}

// =============================================================================
// ENTRIES
// =============================================================================

/// One file of the archive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArchiveEntry {
    /// Path relative to the content root, `/`-separated.
    pub path: String,
    pub bytes: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct ArchiveBody {
    entries: Vec<ArchiveEntry>,
}

/// An in-memory archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    entries: Vec<ArchiveEntry>,
}

impl Archive {
    /// Build an archive, sorting entries by path.
    #[must_use]
    pub fn new(mut entries: Vec<ArchiveEntry>) -> Self {
        entries.sort();
        Self { entries }
    }

    /// Collect every regular file below `root`. Symlinks are not followed.
    pub fn from_directory(root: &Path) -> Result<Self, WeldError> {
        let mut entries = Vec::new();
        for item in WalkDir::new(root).sort_by_file_name() {
            let item = item.map_err(|e| WeldError::Io(format!("Reading content root: {}", e)))?;
            if !item.file_type().is_file() {
                continue;
            }
            let relative = item
                .path()
                .strip_prefix(root)
                .map_err(|e| WeldError::Archive(e.to_string()))?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let bytes =
                std::fs::read(item.path()).map_err(|e| WeldError::io("Reading content file", &e))?;
            entries.push(ArchiveEntry { path: name, bytes });
        }
        Ok(Self::new(entries))
    }

    #[must_use]
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Bytes of the entry at `path`.
    #[must_use]
    pub fn entry(&self, path: &str) -> Option<&[u8]> {
        self.entries
            .binary_search_by(|e| e.path.as_str().cmp(path))
            .ok()
            .and_then(|i| self.entries.get(i))
            .map(|e| e.bytes.as_slice())
    }

    /// Deterministic XOR checksum over entry paths and contents.
    ///
    /// Detects corruption, not tampering; see `archive_digest` for that.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        let mut hash: u64 = 0;
        for (index, entry) in self.entries.iter().enumerate() {
            hash ^= (index as u64).rotate_left(3);
            for byte in entry.path.as_bytes() {
                hash ^= (*byte as u64).rotate_left(23);
                hash = hash.rotate_left(1);
            }
            for byte in &entry.bytes {
                hash ^= (*byte as u64).rotate_left(29);
                hash = hash.rotate_left(1);
            }
        }
        hash
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, WeldError> {
        let header = ArchiveHeader::new(self.entries.len() as u64, self.checksum());
        let header_bytes = postcard::to_allocvec(&header)
            .map_err(|e| WeldError::Archive(format!("Header: {}", e)))?;
        let body = ArchiveBody {
            entries: self.entries.clone(),
        };
        let body_bytes =
            postcard::to_allocvec(&body).map_err(|e| WeldError::Archive(format!("Data: {}", e)))?;

        let mut result = Vec::with_capacity(4 + header_bytes.len() + body_bytes.len());
        result.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
        result.extend_from_slice(&header_bytes);
        result.extend_from_slice(&body_bytes);
        Ok(result)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, WeldError> {
        let Some((len_bytes, rest)) = data.split_first_chunk::<4>() else {
            return Err(WeldError::Archive("Data too short".to_string()));
        };
        let header_len = u32::from_le_bytes(*len_bytes) as usize;
        if rest.len() < header_len {
            return Err(WeldError::Archive("Data too short for header".to_string()));
        }
        let (header_bytes, body_bytes) = rest.split_at(header_len);

        let header: ArchiveHeader = postcard::from_bytes(header_bytes)
            .map_err(|e| WeldError::Archive(format!("Header: {}", e)))?;
        header.validate()?;

        let body: ArchiveBody = postcard::from_bytes(body_bytes)
            .map_err(|e| WeldError::Archive(format!("Data: {}", e)))?;
        let archive = Self {
            entries: body.entries,
        };

        let computed = archive.checksum();
        if computed != header.checksum {
            return Err(WeldError::Archive(format!(
                "Checksum mismatch: expected {}, got {}",
                header.checksum, computed
            )));
        }
        if archive.entries.len() as u64 != header.entry_count {
            return Err(WeldError::Archive("Entry count mismatch".to_string()));
        }
        Ok(archive)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), WeldError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| WeldError::io("Writing archive", &e))
    }

    pub fn open(path: &Path) -> Result<Self, WeldError> {
        let bytes = std::fs::read(path).map_err(|e| WeldError::io("Reading archive", &e))?;
        Self::from_bytes(&bytes)
    }
}

// =============================================================================
// CRYPTOGRAPHIC DIGEST
// =============================================================================

/// BLAKE3 digest of packed archive bytes, as 64 hex characters.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn archive_digest(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

// =============================================================================
// TESTS
// =============================================================================
