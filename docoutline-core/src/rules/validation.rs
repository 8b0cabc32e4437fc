use crate::types::*;
use std::collections::HashSet;

// OutlineValidator - structural consistency checks on a finished outline
pub struct OutlineValidator {
    max_levels: usize,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
    pub quality_score: f32,
    pub total_entries: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    LevelOverflow {
        position: usize,
        level: HeadingLevel,
    },
    HierarchyJump {
        from_level: HeadingLevel,
        to_level: HeadingLevel,
        position: usize,
    },
    TitleOverlap {
        position: usize,
        text: String,
    },
    Duplicate {
        position: usize,
        text: String,
    },
    PageOrder {
        position: usize,
        page: u32,
        previous_page: u32,
    },
    EmptyText {
        position: usize,
    },
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues that break an outline invariant, as opposed to stylistic ones
    pub fn violations(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| !matches!(issue, ValidationIssue::HierarchyJump { .. }))
    }
}

impl OutlineValidator {
    pub fn new(max_levels: usize) -> Self {
        Self { max_levels }
    }

    pub fn validate(&self, outline: &DocumentOutline) -> ValidationReport {
        let mut issues = Vec::new();
        let entries = &outline.outline;

        // 1. Level bounds and hierarchy jumps
        self.validate_levels(entries, &mut issues);

        // 2. Reading order across pages
        Self::validate_page_order(entries, &mut issues);

        // 3. Title exclusion, duplicates and empty text
        Self::validate_entries(&outline.title, entries, &mut issues);

        let quality_score = if entries.is_empty() {
            1.0
        } else {
            (1.0 - (issues.len() as f32 / entries.len() as f32)).max(0.0)
        };

        ValidationReport {
            issues,
            quality_score,
            total_entries: entries.len(),
        }
    }

    fn validate_levels(&self, entries: &[OutlineEntry], issues: &mut Vec<ValidationIssue>) {
        let mut previous: Option<HeadingLevel> = None;
        for (position, entry) in entries.iter().enumerate() {
            if entry.level.depth() as usize > self.max_levels {
                issues.push(ValidationIssue::LevelOverflow {
                    position,
                    level: entry.level,
                });
            }
            if let Some(prev) = previous {
                if entry.level.depth() > prev.depth() + 1 {
                    issues.push(ValidationIssue::HierarchyJump {
                        from_level: prev,
                        to_level: entry.level,
                        position,
                    });
                }
            }
            previous = Some(entry.level);
        }
    }

    fn validate_page_order(entries: &[OutlineEntry], issues: &mut Vec<ValidationIssue>) {
        for (position, pair) in entries.windows(2).enumerate() {
            if pair[1].page < pair[0].page {
                issues.push(ValidationIssue::PageOrder {
                    position: position + 1,
                    page: pair[1].page,
                    previous_page: pair[0].page,
                });
            }
        }
    }

    fn validate_entries(title: &str, entries: &[OutlineEntry], issues: &mut Vec<ValidationIssue>) {
        let mut seen = HashSet::new();
        for (position, entry) in entries.iter().enumerate() {
            if entry.text.trim().is_empty() {
                issues.push(ValidationIssue::EmptyText { position });
                continue;
            }
            if !title.is_empty() && title.contains(entry.text.as_str()) {
                issues.push(ValidationIssue::TitleOverlap {
                    position,
                    text: entry.text.clone(),
                });
            }
            if !seen.insert((entry.level, entry.text.as_str(), entry.page)) {
                issues.push(ValidationIssue::Duplicate {
                    position,
                    text: entry.text.clone(),
                });
            }
        }
    }

    pub fn log_report(&self, name: &str, report: &ValidationReport) {
        tracing::debug!(
            "📊 Validation report for {}: quality {:.2}/1.00, {} issues across {} entries",
            name,
            report.quality_score,
            report.issues.len(),
            report.total_entries
        );

        if report.is_clean() {
            tracing::debug!("   ✅ No structural issues detected!");
            return;
        }

        for issue in &report.issues {
            match issue {
                ValidationIssue::LevelOverflow { position, level } => {
                    tracing::warn!(
                        "   🚫 {}: level {} at position {} exceeds the {} configured levels",
                        name, level, position, self.max_levels
                    );
                }
                ValidationIssue::HierarchyJump {
                    from_level,
                    to_level,
                    position,
                } => {
                    tracing::debug!(
                        "   📊 Hierarchy jump: {} → {} at position {}",
                        from_level, to_level, position
                    );
                }
                ValidationIssue::TitleOverlap { position, text } => {
                    tracing::warn!("   🏷️  {}: entry {} (\"{}\") repeats the title", name, position, text);
                }
                ValidationIssue::Duplicate { position, text } => {
                    tracing::warn!("   ♻️  {}: duplicate entry {} (\"{}\")", name, position, text);
                }
                ValidationIssue::PageOrder {
                    position,
                    page,
                    previous_page,
                } => {
                    tracing::warn!(
                        "   📄 {}: entry {} on page {} follows page {}",
                        name, position, page, previous_page
                    );
                }
                ValidationIssue::EmptyText { position } => {
                    tracing::warn!("   🕳️  {}: entry {} has no text", name, position);
                }
            }
        }
    }
}
