use crate::font_profile::FontProfile;
use crate::types::TextLine;
use regex::Regex;

/// Result of evaluating one rule against one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// Guard tripped: the line is not a heading, whatever the factors say
    Exclude,
    /// Guard did not trip
    Pass,
    /// Factor vote
    Vote(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Guard,
    Factor,
}

/// One heading heuristic. Rules are independent so each can be enabled,
/// reordered and tested on its own.
pub trait HeadingRule: Send + Sync {
    fn evaluate(&self, line: &TextLine, profile: &FontProfile) -> RuleOutcome;
    fn name(&self) -> &str;
    fn kind(&self) -> RuleKind;
}

// ===== GUARDS =====

/// Paragraph and noise guard on character count
pub struct LengthGuard {
    pub min_length: usize,
    pub max_length: usize,
}

impl HeadingRule for LengthGuard {
    fn evaluate(&self, line: &TextLine, _profile: &FontProfile) -> RuleOutcome {
        let length = line.char_count();
        if length > self.max_length || length < self.min_length {
            RuleOutcome::Exclude
        } else {
            RuleOutcome::Pass
        }
    }

    fn name(&self) -> &str {
        "Length"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Guard
    }
}

/// Boilerplate guard: page/figure/table markers, bullets, URLs
pub struct BlacklistGuard {
    terms: Vec<String>,
}

impl BlacklistGuard {
    pub fn new(terms: &[String]) -> Self {
        Self {
            terms: terms
                .iter()
                .map(|t| t.to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

impl HeadingRule for BlacklistGuard {
    fn evaluate(&self, line: &TextLine, _profile: &FontProfile) -> RuleOutcome {
        let lower = line.text.to_lowercase();
        if self.terms.iter().any(|term| lower.contains(term.as_str())) {
            RuleOutcome::Exclude
        } else {
            RuleOutcome::Pass
        }
    }

    fn name(&self) -> &str {
        "Blacklist"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Guard
    }
}

/// Body-prose guard: long-ish lines made mostly of lowercase words
pub struct LowercaseRunGuard {
    pub min_words: usize,
    pub max_ratio: f32,
    pub min_word_len: usize,
}

impl HeadingRule for LowercaseRunGuard {
    fn evaluate(&self, line: &TextLine, _profile: &FontProfile) -> RuleOutcome {
        let words: Vec<&str> = line.text.split_whitespace().collect();
        if words.len() <= self.min_words {
            return RuleOutcome::Pass;
        }
        let lowercase = words
            .iter()
            .filter(|w| is_lowercase_word(w) && w.chars().count() > self.min_word_len)
            .count();
        if lowercase as f32 / words.len() as f32 > self.max_ratio {
            RuleOutcome::Exclude
        } else {
            RuleOutcome::Pass
        }
    }

    fn name(&self) -> &str {
        "LowercaseRun"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Guard
    }
}

/// Bold text at exactly body size is emphasis, not a heading
pub struct BoldBodyGuard;

impl HeadingRule for BoldBodyGuard {
    fn evaluate(&self, line: &TextLine, profile: &FontProfile) -> RuleOutcome {
        if line.bold && profile.is_body_size(line.font_size) {
            RuleOutcome::Exclude
        } else {
            RuleOutcome::Pass
        }
    }

    fn name(&self) -> &str {
        "BoldBody"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Guard
    }
}

// ===== FACTORS =====

pub struct SizeFactor {
    pub ratio: f32,
}

impl HeadingRule for SizeFactor {
    fn evaluate(&self, line: &TextLine, profile: &FontProfile) -> RuleOutcome {
        RuleOutcome::Vote(line.font_size > profile.body_size * self.ratio)
    }

    fn name(&self) -> &str {
        "Size"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Factor
    }
}

pub struct BoldFactor;

impl HeadingRule for BoldFactor {
    fn evaluate(&self, line: &TextLine, _profile: &FontProfile) -> RuleOutcome {
        RuleOutcome::Vote(line.bold)
    }

    fn name(&self) -> &str {
        "Bold"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Factor
    }
}

/// Heading-like casing or shape: ALL CAPS, Title Case, capitalized,
/// leading number ("1.", "2)"), or trailing colon
pub struct FormatFactor {
    numbering: Regex,
}

impl FormatFactor {
    pub fn new(numbering: Regex) -> Self {
        Self { numbering }
    }
}

impl HeadingRule for FormatFactor {
    fn evaluate(&self, line: &TextLine, _profile: &FontProfile) -> RuleOutcome {
        let text = line.text.as_str();
        let starts_upper = text.chars().next().is_some_and(|c| c.is_uppercase());
        RuleOutcome::Vote(
            is_all_uppercase(text)
                || is_title_case(text)
                || starts_upper
                || self.numbering.is_match(text)
                || text.ends_with(':'),
        )
    }

    fn name(&self) -> &str {
        "Format"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Factor
    }
}

/// Favors body-column headings over marginal annotations
pub struct LeftMarginFactor {
    pub max_left: f32,
}

impl HeadingRule for LeftMarginFactor {
    fn evaluate(&self, line: &TextLine, _profile: &FontProfile) -> RuleOutcome {
        RuleOutcome::Vote(line.bbox.left < self.max_left)
    }

    fn name(&self) -> &str {
        "LeftMargin"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Factor
    }
}

// ===== CASING HELPERS =====

/// At least one cased character and every cased character lowercase
pub fn is_lowercase_word(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_uppercase() {
            return false;
        }
        if c.is_lowercase() {
            cased = true;
        }
    }
    cased
}

/// At least one cased character and every cased character uppercase
pub fn is_all_uppercase(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// Every word starts with an uppercase letter followed only by lowercase
/// ones. Words are split on any uncased character, so "Re-Entry" and
/// "2. Scope" are title case but "McDonald" is not.
pub fn is_title_case(text: &str) -> bool {
    let mut cased = false;
    let mut previous_cased = false;
    for c in text.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else {
            previous_cased = false;
        }
    }
    cased
}
