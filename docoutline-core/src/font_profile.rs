use crate::config::{FontProfileConfig, SizeGranularity};
use crate::types::{round_size, size_key, LayoutDocument};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_BODY_SIZE: f32 = 12.0;

/// Font-size distribution of one document.
///
/// `body_size` is the mode of all rounded sizes. Body text dominates any
/// ordinary document, so its mode is the anchor every "larger than body"
/// comparison is measured against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontProfile {
    pub body_size: f32,
    /// Number of sizes observed
    pub observations: usize,
    /// Distinct rounded sizes with their counts, in first-seen order
    pub size_counts: Vec<(f32, usize)>,
}

impl Default for FontProfile {
    fn default() -> Self {
        Self {
            body_size: DEFAULT_BODY_SIZE,
            observations: 0,
            size_counts: Vec::new(),
        }
    }
}

impl FontProfile {
    /// Mode of the rounded sizes. Ties go to the size seen first, so the
    /// result does not depend on hash ordering.
    pub fn from_sizes<I>(sizes: I, default_body_size: f32) -> Self
    where
        I: IntoIterator<Item = f32>,
    {
        let mut index_by_key: HashMap<i64, usize> = HashMap::new();
        let mut size_counts: Vec<(f32, usize)> = Vec::new();
        let mut observations = 0;

        for size in sizes.into_iter().filter(|s| s.is_finite()) {
            let rounded = round_size(size);
            observations += 1;
            match index_by_key.get(&size_key(rounded)) {
                Some(&idx) => size_counts[idx].1 += 1,
                None => {
                    index_by_key.insert(size_key(rounded), size_counts.len());
                    size_counts.push((rounded, 1));
                }
            }
        }

        let mut body_size = default_body_size;
        let mut best_count = 0;
        for &(size, count) in &size_counts {
            if count > best_count {
                body_size = size;
                best_count = count;
            }
        }

        Self {
            body_size,
            observations,
            size_counts,
        }
    }

    pub fn from_document(document: &LayoutDocument, config: &FontProfileConfig) -> Self {
        let use_spans =
            config.granularity == SizeGranularity::Span && !document.span_sizes.is_empty();

        let profile = if use_spans {
            Self::from_sizes(document.span_sizes.iter().copied(), config.default_body_size)
        } else {
            Self::from_sizes(document.lines().map(|l| l.font_size), config.default_body_size)
        };

        tracing::debug!(
            "📏 {}: body size {:.1}pt from {} observations ({} distinct sizes, {})",
            document.name,
            profile.body_size,
            profile.observations,
            profile.size_counts.len(),
            if use_spans { "spans" } else { "lines" }
        );
        profile
    }

    /// True when `size` equals the body size after rounding
    pub fn is_body_size(&self, size: f32) -> bool {
        size_key(size) == size_key(self.body_size)
    }
}
