// Docoutline Core Library
//
// Extracts a title and a leveled heading outline from per-line typography.
// Main interface for converting layout dumps to document outlines.

pub mod batch;
pub mod config;
pub mod error;
pub mod font_profile;
pub mod levels;
pub mod outline;
pub mod preprocessors;
pub mod processor;
pub mod rules;
pub mod title;
pub mod types;

// Re-export main types and functions for easy use
pub use batch::{BatchOptions, BatchProcessor, BatchSummary, DocumentReport};
pub use config::{ConfigManager, OutlineConfig, Preset};
pub use error::{OutlineError, Result};
pub use preprocessors::{JsonLayoutSource, LineSource};
pub use processor::{OutlineExtractor, PipelineStages, StepProfiler};
pub use types::*;
