use crate::config::ClassifierConfig;
use crate::error::{OutlineError, Result};
use crate::font_profile::FontProfile;
use crate::types::*;
use regex::Regex;

use super::heading_rules::{
    BlacklistGuard, BoldBodyGuard, BoldFactor, FormatFactor, HeadingRule, LeftMarginFactor,
    LengthGuard, LowercaseRunGuard, RuleKind, RuleOutcome, SizeFactor,
};

// Debug configuration for per-line rule tracing
#[derive(Debug, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub filter_patterns: Vec<String>,
}

impl DebugConfig {
    pub fn new(enabled: bool, filter_patterns: Vec<String>) -> Self {
        Self {
            enabled,
            filter_patterns,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            filter_patterns: Vec::new(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        self.enabled
            && self.filter_patterns.iter().any(|pattern| {
                // Try regex first, fall back to simple string contains
                if let Ok(regex) = Regex::new(pattern) {
                    regex.is_match(text)
                } else {
                    text.contains(pattern.as_str())
                }
            })
    }
}

/// Sum-and-threshold aggregation: a line is a heading when at least
/// `threshold` factors vote for it and no guard excluded it.
#[derive(Debug, Clone, Copy)]
pub struct ScorePolicy {
    pub threshold: u32,
}

impl ScorePolicy {
    pub fn accepts(&self, score: u32) -> bool {
        score >= self.threshold
    }
}

/// Heading classifier: the configured rule pipeline plus its aggregation policy
pub struct RuleEngine {
    rules: Vec<Box<dyn HeadingRule>>,
    policy: ScorePolicy,
    debug_config: DebugConfig,
}

impl RuleEngine {
    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        let mut rules: Vec<Box<dyn HeadingRule>> = Vec::new();

        for rule_config in &config.rules {
            if !rule_config.enabled {
                tracing::debug!("   ⏭️  Skipping disabled rule: {}", rule_config.name);
                continue;
            }
            match Self::build_rule_by_name(&rule_config.name, config)? {
                Some(rule) => rules.push(rule),
                None => tracing::warn!("⚠️  Unknown rule: {}. Skipping...", rule_config.name),
            }
        }

        Ok(Self {
            rules,
            policy: ScorePolicy {
                threshold: config.score_threshold,
            },
            debug_config: DebugConfig::disabled(),
        })
    }

    fn build_rule_by_name(
        rule_name: &str,
        config: &ClassifierConfig,
    ) -> Result<Option<Box<dyn HeadingRule>>> {
        let rule: Box<dyn HeadingRule> = match rule_name {
            "Length" => Box::new(LengthGuard {
                min_length: config.min_length,
                max_length: config.max_length,
            }),
            "Blacklist" => Box::new(BlacklistGuard::new(&config.blacklist)),
            "LowercaseRun" => Box::new(LowercaseRunGuard {
                min_words: config.lowercase_min_words,
                max_ratio: config.lowercase_max_ratio,
                min_word_len: config.lowercase_min_word_len,
            }),
            "BoldBody" => Box::new(BoldBodyGuard),
            "Size" => Box::new(SizeFactor {
                ratio: config.size_ratio,
            }),
            "Bold" => Box::new(BoldFactor),
            "Format" => {
                let numbering = Regex::new(&config.numbering_pattern).map_err(|e| {
                    OutlineError::Config(format!("classifier.numbering_pattern: {e}"))
                })?;
                Box::new(FormatFactor::new(numbering))
            }
            "LeftMargin" => Box::new(LeftMarginFactor {
                max_left: config.left_margin_max,
            }),
            _ => return Ok(None),
        };
        Ok(Some(rule))
    }

    pub fn set_debug_config(&mut self, debug_config: DebugConfig) {
        self.debug_config = debug_config;
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn factor_count(&self) -> usize {
        self.rules
            .iter()
            .filter(|r| r.kind() == RuleKind::Factor)
            .count()
    }

    /// Number of factor votes, or None when a guard excluded the line
    pub fn score(&self, line: &TextLine, profile: &FontProfile) -> Option<u32> {
        let mut score = 0;
        for rule in &self.rules {
            match rule.evaluate(line, profile) {
                RuleOutcome::Exclude => return None,
                RuleOutcome::Vote(true) => score += 1,
                RuleOutcome::Vote(false) | RuleOutcome::Pass => {}
            }
        }
        Some(score)
    }

    pub fn is_heading(&self, line: &TextLine, profile: &FontProfile) -> bool {
        self.score(line, profile)
            .is_some_and(|score| self.policy.accepts(score))
    }

    /// Classify every line of the document, keeping heading candidates in document order
    pub fn classify(&self, document: &LayoutDocument, profile: &FontProfile) -> Vec<HeadingCandidate> {
        let mut candidates = Vec::new();

        for line in document.lines() {
            if self.debug_config.matches(&line.text) {
                self.trace_line(line, profile);
            }
            if let Some(score) = self.score(line, profile) {
                if self.policy.accepts(score) {
                    candidates.push(HeadingCandidate::new(line.clone(), score));
                }
            }
        }

        tracing::debug!(
            "📝 {}: {} heading candidates out of {} lines (threshold {} of {} factors)",
            document.name,
            candidates.len(),
            document.line_count(),
            self.policy.threshold,
            self.factor_count()
        );
        candidates
    }

    /// Log every rule's verdict for one line
    fn trace_line(&self, line: &TextLine, profile: &FontProfile) {
        let verdicts: Vec<String> = self
            .rules
            .iter()
            .map(|rule| format!("{}={:?}", rule.name(), rule.evaluate(line, profile)))
            .collect();
        tracing::info!(
            "🔍 page {} \"{}\" ({:.1}pt, bold: {}, body {:.1}pt): {}",
            line.page,
            line.text,
            line.font_size,
            line.bold,
            profile.body_size,
            verdicts.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutlineConfig;

    fn line(text: &str, size: f32, bold: bool) -> TextLine {
        TextLine::new(text, 0, size, bold, BoundingBox::new(72.0, 100.0, 400.0, 100.0 + size))
    }

    fn profile() -> FontProfile {
        FontProfile::from_sizes(vec![12.0; 20], 12.0)
    }

    #[test]
    fn test_default_engine_builds_all_rules_in_order() {
        let engine = RuleEngine::from_config(&OutlineConfig::default().classifier).unwrap();
        assert_eq!(
            engine.rule_names(),
            vec!["Length", "Blacklist", "LowercaseRun", "BoldBody", "Size", "Bold", "Format", "LeftMargin"]
        );
        assert_eq!(engine.factor_count(), 4);
    }

    #[test]
    fn test_unknown_and_disabled_rules_are_skipped() {
        let mut config = OutlineConfig::default().classifier;
        config.set_rule_enabled("LeftMargin", false);
        config.set_rule_enabled("Sparkle", true);
        let engine = RuleEngine::from_config(&config).unwrap();
        assert!(!engine.rule_names().contains(&"LeftMargin"));
        assert!(!engine.rule_names().contains(&"Sparkle"));
        assert_eq!(engine.factor_count(), 3);
    }

    #[test]
    fn test_large_bold_heading_scores_all_factors() {
        let engine = RuleEngine::from_config(&OutlineConfig::default().classifier).unwrap();
        assert_eq!(engine.score(&line("Introduction", 24.0, true), &profile()), Some(4));
        assert!(engine.is_heading(&line("Introduction", 24.0, true), &profile()));
    }

    #[test]
    fn test_body_line_is_not_a_heading() {
        let engine = RuleEngine::from_config(&OutlineConfig::default().classifier).unwrap();
        // Format + LeftMargin only
        let body = line("This is ordinary text", 12.0, false);
        assert_eq!(engine.score(&body, &profile()), Some(2));
        assert!(!engine.is_heading(&body, &profile()));
    }

    #[test]
    fn test_guard_excludes_regardless_of_factors() {
        let engine = RuleEngine::from_config(&OutlineConfig::default().classifier).unwrap();
        assert_eq!(engine.score(&line("• Figure 3: results", 30.0, true), &profile()), None);
        assert_eq!(engine.score(&line("Emphasis", 12.0, true), &profile()), None);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let mut config = OutlineConfig::default().classifier;
        config.score_threshold = 2;
        let engine = RuleEngine::from_config(&config).unwrap();
        assert!(engine.is_heading(&line("This is ordinary text", 12.0, false), &profile()));
    }

    #[test]
    fn test_bad_numbering_pattern_is_a_config_error() {
        let mut config = OutlineConfig::default().classifier;
        config.numbering_pattern = "(".to_string();
        assert!(matches!(RuleEngine::from_config(&config), Err(OutlineError::Config(_))));
    }
}
