use crate::types::{size_key, HeadingCandidate, HeadingLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Font size to heading level mapping for one document.
///
/// Built from the distinct sizes among heading candidates, largest first.
/// The largest size is H1, the next H2 and so on up to `max_levels`;
/// anything smaller has no level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelMap {
    pub entries: Vec<(f32, HeadingLevel)>,
}

impl LevelMap {
    pub fn from_candidates(candidates: &[HeadingCandidate], max_levels: usize) -> Self {
        let mut seen = HashSet::new();
        let mut sizes: Vec<f32> = candidates
            .iter()
            .map(|c| c.line.font_size)
            .filter(|size| seen.insert(size_key(*size)))
            .collect();
        sizes.sort_by(|a, b| b.total_cmp(a));

        let entries = sizes
            .into_iter()
            .take(max_levels)
            .zip(1..=u8::MAX)
            .map(|(size, depth)| (size, HeadingLevel::new(depth)))
            .collect();

        Self { entries }
    }

    pub fn level_for(&self, size: f32) -> Option<HeadingLevel> {
        let key = size_key(size);
        self.entries
            .iter()
            .find(|(s, _)| size_key(*s) == key)
            .map(|(_, level)| *level)
    }

    pub fn largest_size(&self) -> Option<f32> {
        self.entries.first().map(|(size, _)| *size)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Label every candidate and drop those below the last level
    pub fn assign(&self, candidates: Vec<HeadingCandidate>) -> Vec<HeadingCandidate> {
        let before = candidates.len();
        let leveled: Vec<HeadingCandidate> = candidates
            .into_iter()
            .filter_map(|mut candidate| {
                candidate.level = Some(self.level_for(candidate.line.font_size)?);
                Some(candidate)
            })
            .collect();

        if leveled.len() < before {
            tracing::debug!(
                "   🪜 Dropped {} candidates below {} levels",
                before - leveled.len(),
                self.entries.len()
            );
        }
        leveled
    }
}
