//! Line Sources
//!
//! This module provides the input layer: converting a layout dump into the
//! unified `LayoutDocument` that feeds the outline extractor.
//!
//! ## Architecture
//!
//! ```text
//! Layout dump (JSON from an external PDF reader)
//!     ↓
//! [Format-specific LineSource]
//!     ↓
//! LayoutDocument (pages of TextLines)
//!     ↓
//! [OutlineExtractor]
//!     ↓
//! DocumentOutline
//! ```
//!
//! ## Available Sources
//!
//! - `JsonLayoutSource` - line-level or span-level JSON layout dumps

pub mod layout_json;
pub mod preprocessor;

// Re-export main types
pub use layout_json::JsonLayoutSource;
pub use preprocessor::{document_name, LineSource};
