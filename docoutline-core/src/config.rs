use crate::error::OutlineError;
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_page_base() -> u32 {
    1
}

/// Named bundle of thresholds. Heuristic revisions disagree on the exact
/// numbers, so each style lives here instead of in the rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    #[default]
    Generic,
    Strict,
    Lenient,
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generic" => Ok(Preset::Generic),
            "strict" => Ok(Preset::Strict),
            "lenient" => Ok(Preset::Lenient),
            other => Err(format!("unknown preset '{other}' (expected generic, strict or lenient)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineConfig {
    #[serde(default)]
    pub preset: Preset,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub levels: LevelConfig,
    #[serde(default)]
    pub title: TitleConfig,
    #[serde(default)]
    pub outline: OutlineBuilderConfig,
    #[serde(default)]
    pub font_profile: FontProfileConfig,
    /// Added to 0-based page indices in the output (1 = first page is "1")
    #[serde(default = "default_page_base")]
    pub page_base: u32,
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Name of the rule
    pub name: String,
    /// Whether this rule is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl RuleConfig {
    fn enabled(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
        }
    }
}

fn default_rules() -> Vec<RuleConfig> {
    vec![
        // Guards first: any of them vetoes the line outright
        RuleConfig::enabled("Length"),
        RuleConfig::enabled("Blacklist"),
        RuleConfig::enabled("LowercaseRun"),
        RuleConfig::enabled("BoldBody"),
        // Factors: each votes, votes are summed against score_threshold
        RuleConfig::enabled("Size"),
        RuleConfig::enabled("Bold"),
        RuleConfig::enabled("Format"),
        RuleConfig::enabled("LeftMargin"),
    ]
}

fn default_blacklist() -> Vec<String> {
    vec![
        "page".to_string(),
        "figure".to_string(),
        "table".to_string(),
        "•".to_string(),
        "http".to_string(),
        "www".to_string(),
    ]
}

fn default_numbering_pattern() -> String {
    r"^\d+[.)]".to_string() // 1., 2)
}

fn default_max_length() -> usize {
    100
}

fn default_min_length() -> usize {
    2
}

fn default_size_ratio() -> f32 {
    1.05
}

fn default_score_threshold() -> u32 {
    3
}

fn default_left_margin_max() -> f32 {
    100.0
}

fn default_lowercase_min_words() -> usize {
    3
}

fn default_lowercase_max_ratio() -> f32 {
    0.6
}

fn default_lowercase_min_word_len() -> usize {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Ordered rule pipeline; names must match a known heading rule
    #[serde(default = "default_rules")]
    pub rules: Vec<RuleConfig>,

    /// Lines longer than this (in characters) are paragraphs, not headings
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Lines shorter than this are noise
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    /// Case-insensitive substrings that mark boilerplate (page/figure markers, bullets, URLs)
    #[serde(default = "default_blacklist")]
    pub blacklist: Vec<String>,

    /// Size factor fires when font_size > body_size * size_ratio
    #[serde(default = "default_size_ratio")]
    pub size_ratio: f32,
    /// Minimum number of factor votes for a heading
    #[serde(default = "default_score_threshold")]
    pub score_threshold: u32,
    /// Left-margin factor fires when bbox.left < left_margin_max
    #[serde(default = "default_left_margin_max")]
    pub left_margin_max: f32,
    /// Leading-number pattern for the format factor
    #[serde(default = "default_numbering_pattern")]
    pub numbering_pattern: String,

    /// Lowercase-run guard: only lines with more than this many words are checked
    #[serde(default = "default_lowercase_min_words")]
    pub lowercase_min_words: usize,
    /// Lowercase-run guard: exclude when the lowercase word share exceeds this
    #[serde(default = "default_lowercase_max_ratio")]
    pub lowercase_max_ratio: f32,
    /// Lowercase-run guard: words must be longer than this to count as lowercase
    #[serde(default = "default_lowercase_min_word_len")]
    pub lowercase_min_word_len: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            max_length: default_max_length(),
            min_length: default_min_length(),
            blacklist: default_blacklist(),
            size_ratio: default_size_ratio(),
            score_threshold: default_score_threshold(),
            left_margin_max: default_left_margin_max(),
            numbering_pattern: default_numbering_pattern(),
            lowercase_min_words: default_lowercase_min_words(),
            lowercase_max_ratio: default_lowercase_max_ratio(),
            lowercase_min_word_len: default_lowercase_min_word_len(),
        }
    }
}

impl ClassifierConfig {
    pub fn is_rule_enabled(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name == name && r.enabled)
    }

    pub fn set_rule_enabled(&mut self, name: &str, enabled: bool) {
        match self.rules.iter_mut().find(|r| r.name == name) {
            Some(rule) => rule.enabled = enabled,
            None => self.rules.push(RuleConfig {
                name: name.to_string(),
                enabled,
            }),
        }
    }
}

fn default_max_levels() -> usize {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Number of distinct heading sizes that become levels (H1..Hn)
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            max_levels: default_max_levels(),
        }
    }
}

/// What to use as the title when no title run is found
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TitleFallback {
    #[default]
    Empty,
    FirstHeading,
    Placeholder,
}

fn default_title_max_pages() -> usize {
    2
}

fn default_top_fraction() -> f32 {
    0.5
}

fn default_size_tolerance() -> f32 {
    0.1
}

fn default_gap() -> f32 {
    30.0
}

fn default_placeholder() -> String {
    "Untitled".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleConfig {
    /// Title lines must sit on one of the first `max_pages` pages
    #[serde(default = "default_title_max_pages")]
    pub max_pages: usize,
    /// Title lines must start above `page_height * top_fraction`
    #[serde(default = "default_top_fraction")]
    pub top_fraction: f32,
    /// Font size difference still considered "the same size" within a run
    #[serde(default = "default_size_tolerance")]
    pub size_tolerance: f32,
    /// Maximum distance from the previous line's bottom edge within a run
    #[serde(default = "default_gap")]
    pub max_gap: f32,
    #[serde(default)]
    pub fallback: TitleFallback,
    /// Used when fallback is `placeholder`
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            max_pages: default_title_max_pages(),
            top_fraction: default_top_fraction(),
            size_tolerance: default_size_tolerance(),
            max_gap: default_gap(),
            fallback: TitleFallback::default(),
            placeholder: default_placeholder(),
        }
    }
}

fn default_strip_patterns() -> Vec<String> {
    vec![
        r"^[\s•·‣◦▪■●\-–—*\]]+".to_string(), // bullets, dashes, stray brackets
        r"^\d+[.)]\s*".to_string(),           // 1. / 2)
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineBuilderConfig {
    /// Join consecutive same-level headings that wrapped onto several lines
    #[serde(default = "default_true")]
    pub merge_fragments: bool,
    /// Maximum vertical distance between wrapped fragments
    #[serde(default = "default_gap")]
    pub merge_gap: f32,
    /// Drop repeated (level, text, page) entries
    #[serde(default = "default_true")]
    pub dedupe: bool,
    /// Leading tokens stripped from heading text, applied in order
    #[serde(default = "default_strip_patterns")]
    pub strip_patterns: Vec<String>,
}

impl Default for OutlineBuilderConfig {
    fn default() -> Self {
        Self {
            merge_fragments: true,
            merge_gap: default_gap(),
            dedupe: true,
            strip_patterns: default_strip_patterns(),
        }
    }
}

/// Which observations feed the body-size mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SizeGranularity {
    /// One observation per line (the line's max span size)
    #[default]
    Line,
    /// One observation per raw span; falls back to lines when spans are absent
    Span,
}

fn default_body_size() -> f32 {
    12.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontProfileConfig {
    #[serde(default)]
    pub granularity: SizeGranularity,
    /// Body size assumed when the document has no size data at all
    #[serde(default = "default_body_size")]
    pub default_body_size: f32,
}

impl Default for FontProfileConfig {
    fn default() -> Self {
        Self {
            granularity: SizeGranularity::default(),
            default_body_size: default_body_size(),
        }
    }
}

fn default_input_extension() -> String {
    "json".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Worker threads for the batch driver (0 = one per core)
    #[serde(default)]
    pub workers: usize,
    /// Layout dump extension picked up when walking a directory
    #[serde(default = "default_input_extension")]
    pub input_extension: String,
    /// Treat any failed document as a failed run
    #[serde(default)]
    pub fail_on_error: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            input_extension: default_input_extension(),
            fail_on_error: false,
        }
    }
}

/// Names of rules that vote (as opposed to guards that veto)
pub const FACTOR_RULES: &[&str] = &["Size", "Bold", "Format", "LeftMargin"];

impl Default for OutlineConfig {
    fn default() -> Self {
        ConfigManager::create_default_generic_config()
    }
}

impl OutlineConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
        let config: OutlineConfig =
            serde_yaml::from_str(&content).with_context(|| format!("parsing config {path}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Stable SHA-256 of the serialized configuration, recorded with every run
    pub fn fingerprint(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }

    pub fn enabled_factor_count(&self) -> usize {
        FACTOR_RULES
            .iter()
            .filter(|name| self.classifier.is_rule_enabled(name))
            .count()
    }

    /// Check thresholds and patterns before any document is processed
    pub fn validate(&self) -> std::result::Result<(), OutlineError> {
        let c = &self.classifier;
        if !c.size_ratio.is_finite() || c.size_ratio <= 0.0 {
            return Err(OutlineError::Config(format!(
                "classifier.size_ratio must be positive, got {}",
                c.size_ratio
            )));
        }
        if c.min_length > c.max_length {
            return Err(OutlineError::Config(format!(
                "classifier.min_length ({}) exceeds max_length ({})",
                c.min_length, c.max_length
            )));
        }
        let factors = self.enabled_factor_count();
        if c.score_threshold == 0 || c.score_threshold as usize > factors {
            return Err(OutlineError::Config(format!(
                "classifier.score_threshold must be between 1 and the {} enabled factors, got {}",
                factors, c.score_threshold
            )));
        }
        if !(0.0..=1.0).contains(&c.lowercase_max_ratio) {
            return Err(OutlineError::Config(format!(
                "classifier.lowercase_max_ratio must be within [0, 1], got {}",
                c.lowercase_max_ratio
            )));
        }
        Regex::new(&c.numbering_pattern).map_err(|e| {
            OutlineError::Config(format!("classifier.numbering_pattern: {e}"))
        })?;

        if self.levels.max_levels == 0 || self.levels.max_levels > u8::MAX as usize {
            return Err(OutlineError::Config(format!(
                "levels.max_levels must be between 1 and 255, got {}",
                self.levels.max_levels
            )));
        }

        let t = &self.title;
        if !(t.top_fraction > 0.0 && t.top_fraction <= 1.0) {
            return Err(OutlineError::Config(format!(
                "title.top_fraction must be within (0, 1], got {}",
                t.top_fraction
            )));
        }
        if t.max_gap < 0.0 || t.size_tolerance < 0.0 || self.outline.merge_gap < 0.0 {
            return Err(OutlineError::Config(
                "gap and tolerance values must not be negative".to_string(),
            ));
        }

        for pattern in &self.outline.strip_patterns {
            Regex::new(pattern).map_err(|e| {
                OutlineError::Config(format!("outline.strip_patterns '{pattern}': {e}"))
            })?;
        }

        if self.page_base > 1 {
            return Err(OutlineError::Config(format!(
                "page_base must be 0 or 1, got {}",
                self.page_base
            )));
        }
        if !self.font_profile.default_body_size.is_finite() || self.font_profile.default_body_size <= 0.0 {
            return Err(OutlineError::Config(
                "font_profile.default_body_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Holds the built-in presets; a custom file replaces the preset it names.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    configs: HashMap<Preset, OutlineConfig>,
    default_config: OutlineConfig,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let mut manager = Self {
            configs: HashMap::new(),
            default_config: Self::create_default_generic_config(),
        };

        // Load built-in configs
        manager.load_builtin_configs()?;

        Ok(manager)
    }

    pub fn get_config(&self, preset: &Preset) -> &OutlineConfig {
        self.configs.get(preset).unwrap_or(&self.default_config)
    }

    /// Register a config file under the preset it declares and return that preset
    pub fn load_config_from_file(&mut self, path: &str) -> Result<Preset> {
        let config = OutlineConfig::load_from_file(path)?;
        let preset = config.preset;
        self.configs.insert(preset, config);
        Ok(preset)
    }

    fn load_builtin_configs(&mut self) -> Result<()> {
        let generic_config = Self::create_default_generic_config();
        self.configs.insert(Preset::Generic, generic_config);

        // Strict: fewer, higher-confidence headings
        let mut strict_config = Self::create_default_generic_config();
        strict_config.preset = Preset::Strict;
        strict_config.classifier.size_ratio = 1.15;
        strict_config.classifier.score_threshold = 3;
        strict_config.classifier.max_length = 80;
        strict_config.classifier.min_length = 3;
        strict_config.validate()?;
        self.configs.insert(Preset::Strict, strict_config);

        // Lenient: three factors, two votes, deeper hierarchy
        let mut lenient_config = Self::create_default_generic_config();
        lenient_config.preset = Preset::Lenient;
        lenient_config.classifier.size_ratio = 1.1;
        lenient_config.classifier.score_threshold = 2;
        lenient_config.classifier.max_length = 180;
        lenient_config.classifier.set_rule_enabled("LeftMargin", false);
        lenient_config.levels.max_levels = 4;
        lenient_config.validate()?;
        self.configs.insert(Preset::Lenient, lenient_config);

        Ok(())
    }

    fn create_default_generic_config() -> OutlineConfig {
        OutlineConfig {
            preset: Preset::Generic,
            classifier: ClassifierConfig::default(),
            levels: LevelConfig::default(),
            title: TitleConfig::default(),
            outline: OutlineBuilderConfig::default(),
            font_profile: FontProfileConfig::default(),
            page_base: default_page_base(),
            batch: BatchConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = OutlineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.enabled_factor_count(), 4);
        assert_eq!(config.page_base, 1);
    }

    #[test]
    fn test_all_presets_are_valid() {
        let manager = ConfigManager::new().unwrap();
        for preset in [Preset::Generic, Preset::Strict, Preset::Lenient] {
            let config = manager.get_config(&preset);
            assert_eq!(config.preset, preset);
            assert!(config.validate().is_ok(), "{preset:?} should validate");
        }
        assert_eq!(manager.get_config(&Preset::Lenient).enabled_factor_count(), 3);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "classifier:\n  size_ratio: 1.1\n  score_threshold: 2\nlevels:\n  max_levels: 4\n";
        let config: OutlineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.classifier.size_ratio, 1.1);
        assert_eq!(config.classifier.max_length, 100);
        assert_eq!(config.classifier.rules.len(), 8);
        assert_eq!(config.levels.max_levels, 4);
        assert_eq!(config.title.max_gap, 30.0);
        assert_eq!(config.page_base, 1);
    }

    #[test]
    fn test_yaml_round_trip_preserves_fingerprint() {
        let config = OutlineConfig::default();
        let yaml = config.to_yaml().unwrap();
        let reparsed: OutlineConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.fingerprint().unwrap(), reparsed.fingerprint().unwrap());
    }

    #[test]
    fn test_fingerprint_changes_with_thresholds() {
        let a = OutlineConfig::default();
        let mut b = OutlineConfig::default();
        b.classifier.size_ratio = 1.15;
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn test_threshold_above_factor_count_rejected() {
        let mut config = OutlineConfig::default();
        config.classifier.set_rule_enabled("LeftMargin", false);
        config.classifier.score_threshold = 4;
        assert!(matches!(config.validate(), Err(OutlineError::Config(_))));
    }

    #[test]
    fn test_invalid_strip_pattern_rejected() {
        let mut config = OutlineConfig::default();
        config.outline.strip_patterns.push("([unclosed".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_page_base_must_be_zero_or_one() {
        let mut config = OutlineConfig::default();
        config.page_base = 0;
        assert!(config.validate().is_ok());
        config.page_base = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!("Strict".parse::<Preset>().unwrap(), Preset::Strict);
        assert!("aggressive".parse::<Preset>().is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = OutlineConfig::load_from_file("/nonexistent/outline.yaml").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/outline.yaml"));
    }
}
