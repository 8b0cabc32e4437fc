use crate::config::{TitleConfig, TitleFallback};
use crate::levels::LevelMap;
use crate::types::{size_key, HeadingCandidate, LayoutDocument, TextLine, TitleGroup};

/// Picks the document title from the most prominent heading candidates.
///
/// Only candidates at the largest heading size, on the first `max_pages`
/// pages and in the top `top_fraction` of their page qualify. Qualifying
/// lines are grouped into runs that continue a previous line (same page,
/// same weight, same size, small vertical gap) and the longest run wins.
pub struct TitleResolver<'a> {
    config: &'a TitleConfig,
}

impl<'a> TitleResolver<'a> {
    pub fn new(config: &'a TitleConfig) -> Self {
        Self { config }
    }

    pub fn resolve(
        &self,
        document: &LayoutDocument,
        candidates: &[HeadingCandidate],
        level_map: &LevelMap,
    ) -> TitleGroup {
        let Some(largest) = level_map.largest_size() else {
            return TitleGroup::default();
        };

        let mut qualifying: Vec<&TextLine> = candidates
            .iter()
            .map(|c| &c.line)
            .filter(|line| size_key(line.font_size) == size_key(largest))
            .filter(|line| line.page < self.config.max_pages)
            .filter(|line| {
                document
                    .page_height(line.page)
                    .is_some_and(|height| line.bbox.top < height * self.config.top_fraction)
            })
            .collect();

        if qualifying.is_empty() {
            tracing::debug!("   🏷️  {}: no title candidates in the top of the first pages", document.name);
            return TitleGroup::default();
        }

        qualifying.sort_by(|a, b| a.page.cmp(&b.page).then(a.bbox.top.total_cmp(&b.bbox.top)));

        let mut groups: Vec<Vec<&TextLine>> = Vec::new();
        for line in qualifying {
            match groups.last_mut() {
                Some(group) if self.continues(group, line) => group.push(line),
                _ => groups.push(vec![line]),
            }
        }

        // Longest run, first one on ties
        let mut best = 0;
        for (idx, group) in groups.iter().enumerate() {
            if group.len() > groups[best].len() {
                best = idx;
            }
        }

        tracing::debug!(
            "   🏷️  {}: title from run {} of {} ({} lines)",
            document.name,
            best + 1,
            groups.len(),
            groups[best].len()
        );

        TitleGroup {
            lines: groups[best].iter().map(|line| (*line).clone()).collect(),
        }
    }

    fn continues(&self, group: &[&TextLine], line: &TextLine) -> bool {
        let Some(last) = group.last() else {
            return false;
        };
        last.page == line.page
            && last.bold == line.bold
            && (last.font_size - line.font_size).abs() < self.config.size_tolerance
            && line.bbox.vertical_gap_below(&last.bbox) < self.config.max_gap
    }

    /// Title used when no run qualified
    pub fn fallback(&self, first_heading: Option<&str>) -> String {
        match self.config.fallback {
            TitleFallback::Empty => String::new(),
            TitleFallback::FirstHeading => first_heading.unwrap_or_default().to_string(),
            TitleFallback::Placeholder => self.config.placeholder.clone(),
        }
    }
}
