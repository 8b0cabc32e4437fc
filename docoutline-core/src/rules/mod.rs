// Heading rules module
// - heading_rules.rs: the individual guards and factors
// - engine.rs: RuleEngine, builds the configured pipeline and scores lines
// - validation.rs: structural checks on a finished outline

pub mod engine;
pub mod heading_rules;
pub mod validation;

pub use engine::*;
pub use heading_rules::{HeadingRule, RuleKind, RuleOutcome};
pub use validation::{OutlineValidator, ValidationIssue, ValidationReport};
