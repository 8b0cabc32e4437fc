// Line source abstraction
//
// This module defines the boundary between reading a layout dump
// (bytes -> LayoutDocument) and outline extraction (LayoutDocument -> outline).
// Everything after this point works with TextLines and is format-agnostic.

use crate::error::{OutlineError, Result};
use crate::types::LayoutDocument;
use std::path::Path;

/// LineSource trait - converts layout dumps into ordered pages of text lines
///
/// Implementations handle:
/// - Format parsing
/// - Line assembly from spans where the format carries them
/// - Page ordering and page heights
pub trait LineSource: Send + Sync {
    /// Parse an in-memory dump. `origin` names the source in errors and is
    /// used to derive the document name.
    fn parse_bytes(&self, bytes: &[u8], origin: &Path) -> Result<LayoutDocument>;

    /// Read and parse a dump from disk. The file is read fully and closed
    /// before parsing starts.
    fn read_document(&self, path: &Path) -> Result<LayoutDocument> {
        let bytes = std::fs::read(path).map_err(|source| OutlineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_bytes(&bytes, path)
    }
}

/// Document name for a source path: its file stem, or the whole path when
/// there is none
pub fn document_name(origin: &Path) -> String {
    origin
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| origin.display().to_string())
}
