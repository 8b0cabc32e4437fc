use crate::error::{OutlineError, Result};
use crate::preprocessors::LineSource;
use crate::processor::{OutlineExtractor, PipelineStages, StepProfiler};
use crate::types::DocumentOutline;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Keep every document's intermediate stages
    pub capture_stages: bool,
    /// Log per-stage timings for every document
    pub profile: bool,
}

/// Outcome of one document. Failures stay typed so the caller decides how
/// to report them.
#[derive(Debug)]
pub struct DocumentReport {
    pub input: PathBuf,
    pub result: Result<DocumentOutline>,
    pub stages: Option<PipelineStages>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub input: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<FailureRecord>,
}

impl BatchSummary {
    pub fn from_reports(reports: &[DocumentReport]) -> Self {
        let failures: Vec<FailureRecord> = reports
            .iter()
            .filter_map(|report| {
                report.result.as_ref().err().map(|err| FailureRecord {
                    input: report.input.clone(),
                    error: err.to_string(),
                })
            })
            .collect();

        Self {
            total: reports.len(),
            succeeded: reports.len() - failures.len(),
            failed: failures.len(),
            failures,
        }
    }

    /// Count a document that processed but could not be written as failed
    pub fn record_write_failures(&mut self, failures: Vec<FailureRecord>) {
        for failure in failures {
            if !self.failures.iter().any(|f| f.input == failure.input) {
                self.succeeded = self.succeeded.saturating_sub(1);
                self.failed += 1;
            }
            self.failures.push(failure);
        }
    }
}

/// Runs the extractor over many layout dumps on a rayon pool
pub struct BatchProcessor {
    extractor: OutlineExtractor,
    source: Box<dyn LineSource>,
    workers: usize,
}

impl BatchProcessor {
    /// `workers == 0` lets rayon pick the pool size
    pub fn new(extractor: OutlineExtractor, source: Box<dyn LineSource>, workers: usize) -> Self {
        Self {
            extractor,
            source,
            workers,
        }
    }

    pub fn extractor(&self) -> &OutlineExtractor {
        &self.extractor
    }

    /// Process every input. Results come back in input order and a failed
    /// document never stops the others.
    pub fn process_all(&self, inputs: &[PathBuf], options: BatchOptions) -> Result<Vec<DocumentReport>> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if self.workers > 0 {
            builder = builder.num_threads(self.workers);
        }
        let pool = builder
            .build()
            .map_err(|e| OutlineError::Batch(format!("failed to build worker pool: {e}")))?;

        tracing::info!(
            "🚀 Processing {} documents on {} workers",
            inputs.len(),
            pool.current_num_threads()
        );

        let reports = pool.install(|| {
            inputs
                .par_iter()
                .map(|input| self.process_one(input, options))
                .collect::<Vec<_>>()
        });
        Ok(reports)
    }

    pub fn process_one(&self, input: &Path, options: BatchOptions) -> DocumentReport {
        let mut profiler = StepProfiler::new(options.profile);

        let outcome = profiler
            .time_step("0. Read Layout Dump", || self.source.read_document(input))
            .and_then(|document| {
                if options.capture_stages || options.profile {
                    let stages = self.extractor.process_capture_stages(&document, &mut profiler)?;
                    profiler.log_summary(&document.name);
                    Ok((stages.outline.clone(), Some(stages)))
                } else {
                    Ok((self.extractor.process(&document)?, None))
                }
            });

        match outcome {
            Ok((outline, stages)) => {
                tracing::info!(
                    "✅ {}: \"{}\" with {} outline entries",
                    input.display(),
                    outline.title,
                    outline.outline.len()
                );
                DocumentReport {
                    input: input.to_path_buf(),
                    result: Ok(outline),
                    stages: stages.filter(|_| options.capture_stages),
                }
            }
            Err(err) => {
                tracing::error!("❌ {}: {}", input.display(), err);
                DocumentReport {
                    input: input.to_path_buf(),
                    result: Err(err),
                    stages: None,
                }
            }
        }
    }
}

/// A single file, or every file with `extension` directly inside a
/// directory, sorted by path
pub fn collect_inputs(path: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let entries = std::fs::read_dir(path).map_err(|source| OutlineError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut inputs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| OutlineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let candidate = entry.path();
        let matches = candidate
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if candidate.is_file() && matches {
            inputs.push(candidate);
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// `<out_dir>/<stem><suffix>`
pub fn output_path_for(input: &Path, out_dir: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    out_dir.join(format!("{stem}{suffix}"))
}

/// Write a value as pretty JSON, non-ASCII text kept as is
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| OutlineError::Output {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| OutlineError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `<stem>.json` (and `<stem>.stages.json` when captured) for every
/// successful report. A failed write is logged and returned; the remaining
/// reports are still written.
pub fn write_reports(reports: &[DocumentReport], out_dir: &Path) -> Vec<FailureRecord> {
    reports
        .iter()
        .filter_map(|report| {
            write_report(report, out_dir).err().map(|err| {
                tracing::error!("❌ {}: {}", report.input.display(), err);
                FailureRecord {
                    input: report.input.clone(),
                    error: err.to_string(),
                }
            })
        })
        .collect()
}

fn write_report(report: &DocumentReport, out_dir: &Path) -> Result<()> {
    let Ok(outline) = &report.result else {
        return Ok(());
    };

    let output_path = output_path_for(&report.input, out_dir, ".json");
    write_json(outline, &output_path)?;
    tracing::info!("💾 {}", output_path.display());

    if let Some(stages) = &report.stages {
        let stages_path = output_path_for(&report.input, out_dir, ".stages.json");
        write_json(stages, &stages_path)?;
        tracing::info!(
            "  💾 {} ({} candidates, {} levels)",
            stages_path.display(),
            stages.candidates.len(),
            stages.level_map.entries.len()
        );
    }
    Ok(())
}
