use crate::error::{OutlineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// ===== LINE MODEL =====
// One TextLine per physical line of the source document. Lines are created
// once by a LineSource and never mutated; the outline builder cleans copies.

/// Bounding box of a line in page coordinates (origin top-left, y grows down).
/// Serialized as `[left, top, right, bottom]`, the reader's native form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl From<[f32; 4]> for BoundingBox {
    fn from([left, top, right, bottom]: [f32; 4]) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.left, bbox.top, bbox.right, bbox.bottom]
    }
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Smallest box covering both boxes
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Vertical distance between this box's top edge and the bottom edge of
    /// the line above it. Overlapping lines yield a small value, not a negative one.
    pub fn vertical_gap_below(&self, above: &BoundingBox) -> f32 {
        (self.top - above.bottom).abs()
    }

    pub fn is_finite(&self) -> bool {
        self.left.is_finite() && self.top.is_finite() && self.right.is_finite() && self.bottom.is_finite()
    }
}

/// Round a font size to one decimal to absorb floating-point jitter between spans
pub fn round_size(size: f32) -> f32 {
    (size * 10.0).round() / 10.0
}

/// Integer key for a rounded size, used wherever sizes are compared for equality
pub(crate) fn size_key(size: f32) -> i64 {
    (size * 10.0).round() as i64
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// Whitespace-collapsed line text
    pub text: String,
    /// 0-based page index; the output page number adds `page_base`
    pub page: usize,
    /// Largest span size on the line, rounded to one decimal
    pub font_size: f32,
    /// More than half of the line's characters are bold
    pub bold: bool,
    pub bbox: BoundingBox,
}

impl TextLine {
    pub fn new(text: &str, page: usize, font_size: f32, bold: bool, bbox: BoundingBox) -> Self {
        Self {
            text: collapse_whitespace(text),
            page,
            font_size: round_size(font_size),
            bold,
            bbox,
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub index: usize,
    pub height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    pub lines: Vec<TextLine>,
}

/// Fully materialized layout of one document, in reading order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutDocument {
    /// Base name of the source document (used for logging and output naming)
    pub name: String,
    pub pages: Vec<Page>,
    /// Every raw span size (rounded), when the source was span-level
    #[serde(default)]
    pub span_sizes: Vec<f32>,
}

impl LayoutDocument {
    pub fn new(name: &str, pages: Vec<Page>) -> Self {
        Self {
            name: name.to_string(),
            pages,
            span_sizes: Vec::new(),
        }
    }

    /// All lines in document order (page, then reading order within the page)
    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.pages.iter().flat_map(|page| page.lines.iter())
    }

    pub fn line_count(&self) -> usize {
        self.pages.iter().map(|page| page.lines.len()).sum()
    }

    pub fn page_height(&self, page: usize) -> Option<f32> {
        self.pages.iter().find(|p| p.index == page).map(|p| p.height)
    }

    /// Reject input the pipeline cannot reason about: non-finite geometry or
    /// sizes, non-positive page heights, lines tagged with a foreign page.
    pub fn validate(&self) -> Result<()> {
        for page in &self.pages {
            if !page.height.is_finite() || page.height <= 0.0 {
                return Err(OutlineError::InvalidInput(format!(
                    "{}: page {} has invalid height {}",
                    self.name, page.index, page.height
                )));
            }
            for line in &page.lines {
                if line.page != page.index {
                    return Err(OutlineError::InvalidInput(format!(
                        "{}: line \"{}\" is tagged page {} but listed under page {}",
                        self.name, line.text, line.page, page.index
                    )));
                }
                if !line.font_size.is_finite() || line.font_size < 0.0 {
                    return Err(OutlineError::InvalidInput(format!(
                        "{}: line \"{}\" has invalid font size {}",
                        self.name, line.text, line.font_size
                    )));
                }
                if !line.bbox.is_finite() {
                    return Err(OutlineError::InvalidInput(format!(
                        "{}: line \"{}\" has a non-finite bounding box",
                        self.name, line.text
                    )));
                }
            }
        }
        if self.span_sizes.iter().any(|s| !s.is_finite()) {
            return Err(OutlineError::InvalidInput(format!(
                "{}: non-finite span size",
                self.name
            )));
        }
        Ok(())
    }
}

// ===== HEADINGS =====

/// Heading depth, 1-based. Displays and serializes as `H<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    /// `depth` is clamped to at least 1
    pub fn new(depth: u8) -> Self {
        Self(depth.max(1))
    }

    pub fn depth(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.0)
    }
}

impl TryFrom<String> for HeadingLevel {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value
            .strip_prefix('H')
            .and_then(|digits| digits.parse::<u8>().ok())
            .filter(|depth| *depth >= 1)
            .map(HeadingLevel)
            .ok_or_else(|| format!("invalid heading level: {value}"))
    }
}

impl From<HeadingLevel> for String {
    fn from(level: HeadingLevel) -> Self {
        level.to_string()
    }
}

/// A line the classifier judged to be a heading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadingCandidate {
    pub line: TextLine,
    /// Number of heading factors that voted for this line
    pub score: u32,
    /// Set by the level assigner; None until then
    pub level: Option<HeadingLevel>,
}

impl HeadingCandidate {
    pub fn new(line: TextLine, score: u32) -> Self {
        Self {
            line,
            score,
            level: None,
        }
    }
}

/// The run of lines chosen as the document title
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TitleGroup {
    pub lines: Vec<TextLine>,
}

impl TitleGroup {
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// ===== OUTPUT =====

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    pub page: u32,
}

/// The record handed back for every document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentOutline {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}

impl DocumentOutline {
    pub fn empty() -> Self {
        Self::default()
    }
}
