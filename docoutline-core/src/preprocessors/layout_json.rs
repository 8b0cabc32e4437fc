use super::preprocessor::{document_name, LineSource};
use crate::error::{OutlineError, Result};
use crate::types::*;
use serde::Deserialize;
use std::path::Path;

/// Span flag bit marking bold text
const BOLD_FLAG: u32 = 16;

#[derive(Debug, Deserialize)]
struct RawDump {
    pages: Vec<RawPage>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    height: f32,
    #[serde(default)]
    width: Option<f32>,
    #[serde(default)]
    lines: Vec<RawLine>,
}

/// A line record is either pre-assembled or a list of spans.
/// Span records are tried first.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLine {
    Spans {
        spans: Vec<RawSpan>,
        bbox: BoundingBox,
    },
    Line {
        text: String,
        font_size: f32,
        #[serde(default)]
        bold: bool,
        bbox: BoundingBox,
    },
}

#[derive(Debug, Deserialize)]
struct RawSpan {
    text: String,
    size: f32,
    #[serde(default)]
    flags: u32,
    #[serde(default)]
    bold: bool,
}

impl RawSpan {
    fn is_bold(&self) -> bool {
        self.bold || self.flags & BOLD_FLAG != 0
    }
}

/// Reads the JSON layout dump produced by an external PDF reader
#[derive(Debug, Default)]
pub struct JsonLayoutSource;

impl JsonLayoutSource {
    pub fn new() -> Self {
        Self
    }
}

impl LineSource for JsonLayoutSource {
    fn parse_bytes(&self, bytes: &[u8], origin: &Path) -> Result<LayoutDocument> {
        let dump: RawDump = serde_json::from_slice(bytes).map_err(|source| OutlineError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;

        let mut span_sizes = Vec::new();
        let mut dropped = 0;
        let pages: Vec<Page> = dump
            .pages
            .into_iter()
            .enumerate()
            .map(|(index, raw_page)| {
                let mut lines = Vec::with_capacity(raw_page.lines.len());
                for raw_line in raw_page.lines {
                    match assemble_line(raw_line, index, &mut span_sizes) {
                        Some(line) => lines.push(line),
                        None => dropped += 1,
                    }
                }
                Page {
                    index,
                    height: raw_page.height,
                    width: raw_page.width,
                    lines,
                }
            })
            .collect();

        let mut document = LayoutDocument::new(&document_name(origin), pages);
        document.span_sizes = span_sizes;

        tracing::debug!(
            "📋 {}: {} pages, {} lines ({} noise lines dropped)",
            document.name,
            document.pages.len(),
            document.line_count(),
            dropped
        );
        Ok(document)
    }
}

/// Build one TextLine from a raw record.
///
/// Span records: texts are concatenated, the size is the largest rounded span
/// size, and the line is bold when more than half its characters are bold.
/// Every span size is recorded in `span_sizes`, including those of lines
/// dropped as noise. Lines of one character or less are dropped.
fn assemble_line(raw: RawLine, page: usize, span_sizes: &mut Vec<f32>) -> Option<TextLine> {
    let (text, font_size, bold, bbox) = match raw {
        RawLine::Spans { spans, bbox } => {
            let mut text = String::new();
            let mut max_size: f32 = 0.0;
            let mut bold_chars = 0usize;
            let mut total_chars = 0usize;

            for span in &spans {
                let size = round_size(span.size);
                span_sizes.push(size);
                max_size = max_size.max(size);

                let chars = span.text.chars().count();
                total_chars += chars;
                if span.is_bold() {
                    bold_chars += chars;
                }
                text.push_str(&span.text);
            }

            let bold = total_chars > 0 && bold_chars as f32 / total_chars as f32 > 0.5;
            (text, max_size, bold, bbox)
        }
        RawLine::Line {
            text,
            font_size,
            bold,
            bbox,
        } => {
            span_sizes.push(round_size(font_size));
            (text, font_size, bold, bbox)
        }
    };

    if text.trim().chars().count() <= 1 {
        return None;
    }
    Some(TextLine::new(&text, page, font_size, bold, bbox))
}
