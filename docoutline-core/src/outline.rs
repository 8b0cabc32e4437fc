use crate::config::OutlineBuilderConfig;
use crate::error::{OutlineError, Result};
use crate::types::*;
use regex::Regex;
use std::collections::HashSet;

/// An outline entry still carrying its geometry, used while merging
#[derive(Debug, Clone)]
struct DraftEntry {
    level: HeadingLevel,
    text: String,
    page: usize,
    bbox: BoundingBox,
}

/// Turns leveled heading candidates into the final outline entries
pub struct OutlineBuilder {
    strip_patterns: Vec<Regex>,
    merge_fragments: bool,
    merge_gap: f32,
    dedupe: bool,
    page_base: u32,
}

impl OutlineBuilder {
    pub fn new(config: &OutlineBuilderConfig, page_base: u32) -> Result<Self> {
        let strip_patterns = config
            .strip_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .map_err(|e| OutlineError::Config(format!("outline.strip_patterns: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            strip_patterns,
            merge_fragments: config.merge_fragments,
            merge_gap: config.merge_gap,
            dedupe: config.dedupe,
            page_base,
        })
    }

    /// Strip bullets and leading numbering, then normalize whitespace
    pub fn clean_heading_text(&self, text: &str) -> String {
        let mut cleaned = text.trim().to_string();
        for pattern in &self.strip_patterns {
            cleaned = pattern.replace(&cleaned, "").into_owned();
        }
        collapse_whitespace(&cleaned)
    }

    pub fn build(&self, candidates: &[HeadingCandidate], title: &str) -> Vec<OutlineEntry> {
        let drafts: Vec<DraftEntry> = candidates
            .iter()
            .filter_map(|candidate| {
                let level = candidate.level?;
                let text = self.clean_heading_text(&candidate.line.text);
                if text.is_empty() {
                    return None;
                }
                Some(DraftEntry {
                    level,
                    text,
                    page: candidate.line.page,
                    bbox: candidate.line.bbox,
                })
            })
            .collect();

        let drafts = if self.merge_fragments {
            self.merge(drafts)
        } else {
            drafts
        };

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for draft in drafts {
            if part_of_title(title, &draft.text) {
                continue;
            }
            if self.dedupe && !seen.insert((draft.level, draft.text.clone(), draft.page)) {
                continue;
            }
            entries.push(OutlineEntry {
                level: draft.level,
                text: draft.text,
                page: draft.page as u32 + self.page_base,
            });
        }
        entries
    }

    /// Drop entries whose text the title already holds. Used again when a
    /// fallback title is chosen after the outline is built.
    pub fn exclude_title(&self, entries: Vec<OutlineEntry>, title: &str) -> Vec<OutlineEntry> {
        entries
            .into_iter()
            .filter(|entry| !part_of_title(title, &entry.text))
            .collect()
    }

    /// Join wrapped heading fragments: a draft continues the previous one when
    /// both sit on the same page at the same level and the vertical gap
    /// between them is below `merge_gap`.
    fn merge(&self, drafts: Vec<DraftEntry>) -> Vec<DraftEntry> {
        drafts
            .into_iter()
            .fold(Vec::new(), |mut merged: Vec<DraftEntry>, draft| {
                match merged.pop() {
                    Some(previous) if self.continues(&previous, &draft) => {
                        merged.push(DraftEntry {
                            level: previous.level,
                            text: format!("{} {}", previous.text, draft.text),
                            page: previous.page,
                            bbox: previous.bbox.union(&draft.bbox),
                        });
                    }
                    Some(previous) => {
                        merged.push(previous);
                        merged.push(draft);
                    }
                    None => merged.push(draft),
                }
                merged
            })
    }

    fn continues(&self, previous: &DraftEntry, draft: &DraftEntry) -> bool {
        previous.page == draft.page
            && previous.level == draft.level
            && draft.bbox.vertical_gap_below(&previous.bbox) < self.merge_gap
    }
}

fn part_of_title(title: &str, text: &str) -> bool {
    let contained = !title.is_empty() && title.contains(text);
    if contained {
        tracing::debug!("   🏷️  Dropping \"{}\": part of the title", text);
    }
    contained
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leveled(text: &str, depth: u8, page: usize, top: f32) -> HeadingCandidate {
        let mut candidate = HeadingCandidate::new(
            TextLine::new(text, page, 18.0, true, BoundingBox::new(72.0, top, 400.0, top + 18.0)),
            4,
        );
        candidate.level = Some(HeadingLevel::new(depth));
        candidate
    }

    fn builder() -> OutlineBuilder {
        OutlineBuilder::new(&OutlineBuilderConfig::default(), 1).unwrap()
    }

    #[test]
    fn test_clean_heading_text() {
        let b = builder();
        assert_eq!(b.clean_heading_text("• - Overview"), "Overview");
        assert_eq!(b.clean_heading_text("2) Scope   of  Work"), "Scope of Work");
        assert_eq!(b.clean_heading_text("1. Introduction"), "Introduction");
        assert_eq!(b.clean_heading_text("] Results"), "Results");
        assert_eq!(b.clean_heading_text("2024 Plan"), "2024 Plan");
        assert_eq!(b.clean_heading_text("1."), "");
    }

    #[test]
    fn test_merges_wrapped_fragments() {
        let candidates = vec![
            leveled("Chapter One", 1, 0, 100.0),
            leveled("Overview of the System", 1, 0, 122.0),
            leveled("Background", 1, 0, 400.0),
        ];
        let entries = builder().build(&candidates, "");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "Chapter One Overview of the System");
        assert_eq!(entries[0].page, 1);
        assert_eq!(entries[1].text, "Background");
    }

    #[test]
    fn test_merge_chains_across_three_lines() {
        let candidates = vec![
            leveled("A Very", 1, 0, 100.0),
            leveled("Long Heading", 1, 0, 120.0),
            leveled("Indeed", 1, 0, 140.0),
        ];
        let entries = builder().build(&candidates, "");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "A Very Long Heading Indeed");
    }

    #[test]
    fn test_no_merge_across_levels_or_pages() {
        let candidates = vec![
            leveled("Part", 1, 0, 100.0),
            leveled("Section", 2, 0, 120.0),
            leveled("Next Page", 2, 1, 20.0),
        ];
        let entries = builder().build(&candidates, "");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].page, 2);
    }

    #[test]
    fn test_title_exclusion_and_dedupe() {
        let candidates = vec![
            leveled("Annual Report", 1, 0, 80.0),
            leveled("Summary", 1, 0, 300.0),
            leveled("Summary", 1, 0, 500.0),
            leveled("Summary", 1, 1, 300.0),
        ];
        let entries = builder().build(&candidates, "Annual Report 2024");
        let texts: Vec<(&str, u32)> = entries.iter().map(|e| (e.text.as_str(), e.page)).collect();
        assert_eq!(texts, vec![("Summary", 1), ("Summary", 2)]);
    }

    #[test]
    fn test_exclude_title_after_build() {
        let b = builder();
        let entries = b.build(
            &[leveled("Introduction", 1, 0, 100.0), leveled("Methods", 1, 0, 300.0)],
            "",
        );
        let kept = b.exclude_title(entries.clone(), "Introduction");
        assert_eq!(kept, entries[1..].to_vec());
        assert_eq!(b.exclude_title(entries.clone(), ""), entries);
    }

    #[test]
    fn test_zero_page_base() {
        let b = OutlineBuilder::new(&OutlineBuilderConfig::default(), 0).unwrap();
        let entries = b.build(&[leveled("Intro", 1, 0, 100.0)], "");
        assert_eq!(entries[0].page, 0);
    }

    #[test]
    fn test_unleveled_candidates_are_ignored() {
        let candidate = HeadingCandidate::new(
            TextLine::new("Stray", 0, 13.0, true, BoundingBox::new(72.0, 10.0, 200.0, 23.0)),
            3,
        );
        assert!(builder().build(&[candidate], "").is_empty());
    }
}
