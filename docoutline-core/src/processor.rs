use crate::config::OutlineConfig;
use crate::error::Result;
use crate::font_profile::FontProfile;
use crate::levels::LevelMap;
use crate::outline::OutlineBuilder;
use crate::rules::{engine::DebugConfig, OutlineValidator, RuleEngine};
use crate::title::TitleResolver;
use crate::types::*;
use std::time::{Duration, Instant};

/// Captured intermediate outputs from each pipeline stage
/// Used for testing and diagnostics: lets you inspect each boundary
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineStages {
    pub font_profile: FontProfile,
    pub candidates: Vec<HeadingCandidate>,
    pub level_map: LevelMap,
    pub title_group: TitleGroup,
    pub outline: DocumentOutline,
}

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        tracing::info!("⏱️  {}: {}µs", step_name, elapsed.as_micros());

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn log_summary(&self, name: &str) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        tracing::info!("📊 Performance Summary for {}:", name);
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            tracing::info!(
                "   {:.<35} {}µs ({:.1}%)",
                step,
                duration.as_micros(),
                percentage
            );
        }
        tracing::info!("   {:.<35} {}µs", "Total", total.as_micros());
    }
}

/// Runs the outline pipeline: font profile, heading classification, level
/// assignment, title resolution and outline assembly.
///
/// Construction compiles every configured pattern, so a built extractor
/// cannot fail on a valid document.
pub struct OutlineExtractor {
    config: OutlineConfig,
    rule_engine: RuleEngine,
    outline_builder: OutlineBuilder,
    validator: OutlineValidator,
}

impl OutlineExtractor {
    pub fn new(config: OutlineConfig) -> Result<Self> {
        config.validate()?;
        let rule_engine = RuleEngine::from_config(&config.classifier)?;
        let outline_builder = OutlineBuilder::new(&config.outline, config.page_base)?;
        let validator = OutlineValidator::new(config.levels.max_levels);

        Ok(Self {
            config,
            rule_engine,
            outline_builder,
            validator,
        })
    }

    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    pub fn set_debug_config(&mut self, debug_config: DebugConfig) {
        self.rule_engine.set_debug_config(debug_config);
    }

    /// Validate the document, then extract its outline
    pub fn process(&self, document: &LayoutDocument) -> Result<DocumentOutline> {
        document.validate()?;
        Ok(self.extract(document))
    }

    /// Validate the document, then extract with every intermediate captured
    pub fn process_capture_stages(
        &self,
        document: &LayoutDocument,
        profiler: &mut StepProfiler,
    ) -> Result<PipelineStages> {
        document.validate()?;
        Ok(self.extract_with_profiler(document, profiler))
    }

    pub fn extract(&self, document: &LayoutDocument) -> DocumentOutline {
        self.extract_with_profiler(document, &mut StepProfiler::new(false))
            .outline
    }

    pub fn extract_with_stages(&self, document: &LayoutDocument) -> PipelineStages {
        self.extract_with_profiler(document, &mut StepProfiler::new(false))
    }

    pub fn extract_with_profiler(
        &self,
        document: &LayoutDocument,
        profiler: &mut StepProfiler,
    ) -> PipelineStages {
        if document.line_count() == 0 {
            tracing::debug!("📄 {}: no text lines, empty outline", document.name);
            return PipelineStages {
                font_profile: FontProfile {
                    body_size: self.config.font_profile.default_body_size,
                    ..FontProfile::default()
                },
                candidates: Vec::new(),
                level_map: LevelMap::default(),
                title_group: TitleGroup::default(),
                outline: DocumentOutline::empty(),
            };
        }

        // Stage 1: Body size
        let font_profile = profiler.time_step("1. Font Profile", || {
            FontProfile::from_document(document, &self.config.font_profile)
        });

        // Stage 2: Heading classification
        let candidates = profiler.time_step("2. Heading Classification", || {
            self.rule_engine.classify(document, &font_profile)
        });

        // Stage 3: Levels
        let (level_map, candidates) = profiler.time_step("3. Level Assignment", || {
            let level_map = LevelMap::from_candidates(&candidates, self.config.levels.max_levels);
            let leveled = level_map.assign(candidates);
            (level_map, leveled)
        });

        // Stage 4: Title
        let resolver = TitleResolver::new(&self.config.title);
        let title_group = profiler.time_step("4. Title Resolution", || {
            resolver.resolve(document, &candidates, &level_map)
        });
        let title = title_group.text();

        // Stage 5: Outline
        let entries = profiler.time_step("5. Outline Assembly", || {
            self.outline_builder.build(&candidates, &title)
        });

        let mut outline = DocumentOutline {
            title,
            outline: entries,
        };
        if outline.title.is_empty() {
            let first_heading = outline.outline.first().map(|entry| entry.text.as_str());
            outline.title = resolver.fallback(first_heading);
            outline.outline = self
                .outline_builder
                .exclude_title(std::mem::take(&mut outline.outline), &outline.title);
        }

        let report = self.validator.validate(&outline);
        self.validator.log_report(&document.name, &report);

        tracing::debug!(
            "✅ {}: title \"{}\", {} outline entries (body {:.1}pt, {} levels)",
            document.name,
            outline.title,
            outline.outline.len(),
            font_profile.body_size,
            level_map.entries.len()
        );

        PipelineStages {
            font_profile,
            candidates,
            level_map,
            title_group,
            outline,
        }
    }
}
