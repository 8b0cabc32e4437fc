//! Pipeline boundary tests: layout dump in, outline out.
//!
//! These tests load layout dumps from `test_fixtures/layouts/` and assert
//! properties at the pipeline boundaries:
//!
//! - Boundary 1 (reader output): pages, lines, span-level assembly
//! - Boundary 2 (outline output): title, levels, pages, cleaning
//!
//! `annual_report` is additionally compared against the full expected
//! output in `test_fixtures/expected/`.

use docoutline_core::config::{SizeGranularity, TitleFallback};
use docoutline_core::*;
use serde_json::Value;
use std::path::PathBuf;

// ============================================================================
// Fixture helpers
// ============================================================================

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_fixtures")
}

fn load_layout(fixture_name: &str) -> LayoutDocument {
    let path = fixtures_dir().join("layouts").join(format!("{fixture_name}.json"));
    JsonLayoutSource::new()
        .read_document(&path)
        .unwrap_or_else(|e| panic!("Missing or invalid fixture {}: {e}", path.display()))
}

fn load_expected(fixture_name: &str) -> Value {
    let path = fixtures_dir().join("expected").join(format!("{fixture_name}.json"));
    let contents = std::fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("Missing fixture: {}", path.display()));
    serde_json::from_str(&contents).expect("Invalid expected output")
}

fn extract_with(config: OutlineConfig, fixture_name: &str) -> DocumentOutline {
    OutlineExtractor::new(config)
        .expect("config should build")
        .process(&load_layout(fixture_name))
        .expect("fixture should process")
}

fn extract(fixture_name: &str) -> DocumentOutline {
    extract_with(OutlineConfig::default(), fixture_name)
}

fn entries(outline: &DocumentOutline) -> Vec<(String, String, u32)> {
    outline
        .outline
        .iter()
        .map(|e| (e.level.to_string(), e.text.clone(), e.page))
        .collect()
}

fn entry(level: &str, text: &str, page: u32) -> (String, String, u32) {
    (level.to_string(), text.to_string(), page)
}

// ============================================================================
// Boundary 1: reader output
// ============================================================================

mod reader_boundary {
    use super::*;

    #[test]
    fn annual_report_pages_and_lines() {
        let doc = load_layout("annual_report");
        assert_eq!(doc.name, "annual_report");
        assert_eq!(doc.pages.len(), 3);
        assert!(doc.pages.iter().all(|p| p.height == 792.0));
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn span_lines_are_assembled() {
        let doc = load_layout("annual_report");
        let first_page: Vec<&TextLine> = doc.pages[0].lines.iter().collect();

        assert_eq!(first_page[1].text, "Review 2024");
        assert_eq!(first_page[1].font_size, 26.0);
        assert!(first_page[1].bold);

        let findings = &doc.pages[1].lines[0];
        assert_eq!(findings.text, "2. Findings");
        assert_eq!(findings.page, 1);
    }

    #[test]
    fn line_pages_follow_page_order() {
        let doc = load_layout("body_only");
        assert!(doc.pages[1].lines.iter().all(|l| l.page == 1));
    }
}

// ============================================================================
// Boundary 2: outline output
// ============================================================================

mod outline_boundary {
    use super::*;

    #[test]
    fn annual_report_matches_expected_output() {
        let outline = extract("annual_report");
        let actual = serde_json::to_value(&outline).unwrap();
        assert_eq!(actual, load_expected("annual_report"));
    }

    #[test]
    fn heading_in_top_half_becomes_the_title() {
        let outline = extract("heading_top_half");
        assert_eq!(outline.title, "Introduction");
        assert!(outline.outline.is_empty());
    }

    #[test]
    fn heading_in_bottom_half_is_a_single_entry() {
        let outline = extract("heading_bottom_half");
        assert_eq!(outline.title, "");
        assert_eq!(entries(&outline), vec![entry("H1", "Introduction", 1)]);
    }

    #[test]
    fn wrapped_heading_is_merged() {
        let outline = extract("wrapped_heading");
        assert_eq!(
            entries(&outline),
            vec![entry("H1", "Chapter One Overview of the System", 1)]
        );
    }

    #[test]
    fn figure_caption_is_excluded() {
        let outline = extract("figure_caption");
        assert!(outline.outline.is_empty());
        assert_eq!(outline.title, "");
    }

    #[test]
    fn body_only_document_has_no_outline() {
        assert_eq!(extract("body_only"), DocumentOutline::empty());
    }

    #[test]
    fn repeated_heading_appears_once() {
        let outline = extract("repeated_heading");
        assert_eq!(entries(&outline), vec![entry("H1", "Summary", 1)]);
    }

    #[test]
    fn output_uses_heading_tags() {
        let json = serde_json::to_string(&extract("heading_bottom_half")).unwrap();
        assert!(json.contains(r#""level":"H1""#));
    }
}

// ============================================================================
// Invariants
// ============================================================================

mod invariants {
    use super::*;

    const FIXTURES: &[&str] = &[
        "annual_report",
        "body_only",
        "figure_caption",
        "heading_bottom_half",
        "heading_top_half",
        "repeated_heading",
        "single_page_sections",
        "wrapped_heading",
    ];

    #[test]
    fn extraction_is_deterministic() {
        for name in FIXTURES {
            assert_eq!(extract(name), extract(name), "{name} differs between runs");
        }
    }

    #[test]
    fn levels_stay_within_bound() {
        for max_levels in 1..=3 {
            let mut config = OutlineConfig::default();
            config.levels.max_levels = max_levels;
            let outline = extract_with(config, "annual_report");
            assert!(outline
                .outline
                .iter()
                .all(|e| (e.level.depth() as usize) <= max_levels));
        }
    }

    #[test]
    fn no_entry_is_contained_in_the_title() {
        for fallback in [
            TitleFallback::Empty,
            TitleFallback::FirstHeading,
            TitleFallback::Placeholder,
        ] {
            for name in FIXTURES {
                let mut config = OutlineConfig::default();
                config.title.fallback = fallback;
                let outline = extract_with(config, name);
                if outline.title.is_empty() {
                    continue;
                }
                assert!(
                    outline
                        .outline
                        .iter()
                        .all(|e| !outline.title.contains(e.text.as_str())),
                    "{name} with {fallback:?}: {outline:?}"
                );
            }
        }
    }

    #[test]
    fn entries_keep_reading_order() {
        for name in FIXTURES {
            let doc = load_layout(name);
            let positions: Vec<(u32, f32)> = extract(name)
                .outline
                .iter()
                .map(|e| {
                    let page = &doc.pages[(e.page - 1) as usize];
                    let line = page
                        .lines
                        .iter()
                        .find(|l| l.text.ends_with(e.text.as_str()) || e.text.starts_with(l.text.as_str()))
                        .unwrap_or_else(|| panic!("{name}: no line for {:?}", e.text));
                    (e.page, line.bbox.top)
                })
                .collect();
            assert!(
                positions.windows(2).all(|w| w[0].0 < w[1].0
                    || (w[0].0 == w[1].0 && w[0].1 < w[1].1)),
                "{name}: {positions:?}"
            );
        }
    }

    #[test]
    fn headings_on_one_page_follow_vertical_position() {
        let outline = extract("single_page_sections");
        assert_eq!(outline.title, "");
        assert_eq!(
            entries(&outline),
            vec![
                entry("H1", "Methods", 1),
                entry("H2", "Sampling Plan", 1),
                entry("H1", "Results", 1),
                entry("H2", "Regional Breakdown", 1),
                entry("H1", "Discussion", 1),
            ]
        );
    }

    #[test]
    fn validator_finds_no_violations() {
        let validator = rules::OutlineValidator::new(3);
        for name in FIXTURES {
            let report = validator.validate(&extract(name));
            assert_eq!(report.violations().count(), 0, "{name}: {:?}", report.issues);
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

mod configuration {
    use super::*;

    #[test]
    fn zero_page_base() {
        let mut config = OutlineConfig::default();
        config.page_base = 0;
        let outline = extract_with(config, "annual_report");
        let pages: Vec<u32> = outline.outline.iter().map(|e| e.page).collect();
        assert_eq!(pages, vec![0, 0, 1, 1, 2]);
    }

    #[test]
    fn first_heading_title_leaves_the_outline() {
        let mut config = OutlineConfig::default();
        config.title.fallback = TitleFallback::FirstHeading;
        let outline = extract_with(config, "single_page_sections");
        assert_eq!(outline.title, "Methods");
        assert_eq!(outline.outline.len(), 4);
        assert_eq!(outline.outline[0].text, "Sampling Plan");
    }

    #[test]
    fn placeholder_title_keeps_entries() {
        let mut config = OutlineConfig::default();
        config.title.fallback = TitleFallback::Placeholder;
        config.title.placeholder = "Untitled".to_string();
        let outline = extract_with(config, "heading_bottom_half");
        assert_eq!(outline.title, "Untitled");
        assert_eq!(outline.outline.len(), 1);
    }

    #[test]
    fn span_granularity_agrees_on_body_size() {
        let mut config = OutlineConfig::default();
        config.font_profile.granularity = SizeGranularity::Span;
        assert_eq!(extract_with(config, "annual_report"), extract("annual_report"));
    }

    #[test]
    fn disabling_merge_keeps_fragments() {
        let mut config = OutlineConfig::default();
        config.outline.merge_fragments = false;
        let outline = extract_with(config, "wrapped_heading");
        assert_eq!(
            entries(&outline),
            vec![
                entry("H1", "Chapter One", 1),
                entry("H1", "Overview of the System", 1),
            ]
        );
    }

    #[test]
    fn every_preset_processes_every_fixture() {
        let manager = ConfigManager::new().unwrap();
        for preset in [Preset::Generic, Preset::Strict, Preset::Lenient] {
            let config = manager.get_config(&preset).clone();
            let max_levels = config.levels.max_levels;
            let extractor = OutlineExtractor::new(config).unwrap();
            let outline = extractor.process(&load_layout("annual_report")).unwrap();
            assert!(outline
                .outline
                .iter()
                .all(|e| (e.level.depth() as usize) <= max_levels));
        }
    }

    #[test]
    fn yaml_config_round_trips_through_a_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(
            &path,
            "preset: strict\npage_base: 0\nlevels:\n  max_levels: 2\n",
        )
        .unwrap();

        let mut manager = ConfigManager::new().unwrap();
        let preset = manager.load_config_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(preset, Preset::Strict);
        let config = manager.get_config(&preset);
        assert_eq!(config.page_base, 0);
        assert_eq!(config.levels.max_levels, 2);
    }
}

// ============================================================================
// Batch
// ============================================================================

mod batch_run {
    use super::*;
    use docoutline_core::batch::collect_inputs;

    #[test]
    fn fixture_directory_runs_in_parallel_and_in_order() {
        let inputs = collect_inputs(&fixtures_dir().join("layouts"), "json").unwrap();
        assert_eq!(inputs.len(), 8);

        let extractor = OutlineExtractor::new(OutlineConfig::default()).unwrap();
        let processor = BatchProcessor::new(extractor, Box::new(JsonLayoutSource::new()), 3);
        let reports = processor.process_all(&inputs, BatchOptions::default()).unwrap();

        assert_eq!(reports.len(), inputs.len());
        for (report, input) in reports.iter().zip(&inputs) {
            assert_eq!(&report.input, input);
            let name = input.file_stem().unwrap().to_string_lossy().into_owned();
            assert_eq!(report.result.as_ref().unwrap(), &extract(&name));
        }
        assert_eq!(BatchSummary::from_reports(&reports).failed, 0);
    }
}
