//! Line-oriented chapter segmentation.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Chapter;
use super::headings::{HeadingPatterns, clean_heading};
use super::normalizer::normalize_text;

static DASH_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\-–—]\s*").expect("dash marker pattern should compile"));

static NUMBER_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.)]\s+").expect("number marker pattern should compile"));

/// Bullet prefix for rewritten list lines.
pub const BULLET: &str = "• ";

/// Splits text into chapters using a heading pattern table.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter<'a> {
    patterns: &'a HeadingPatterns,
}

/// Chapter being accumulated during the line walk.
#[derive(Debug, Default)]
struct Draft {
    title: String,
    lines: Vec<String>,
}

impl Draft {
    fn titled(title: String) -> Self {
        Self {
            title,
            lines: Vec::new(),
        }
    }

    fn finish(self) -> Option<Chapter> {
        let body = self
            .lines
            .iter()
            .map(|line| format_content_line(line))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        let chapter = Chapter::new(self.title, body.trim());
        chapter.has_content().then_some(chapter)
    }
}

impl<'a> Segmenter<'a> {
    pub fn new(patterns: &'a HeadingPatterns) -> Self {
        Self { patterns }
    }

    /// Split `text` into chapters.
    ///
    /// Returns an empty list when no line is recognized as a heading, so
    /// callers can tell "unstructured" apart from "one chapter".
    pub fn segment(&self, text: &str) -> Vec<Chapter> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return Vec::new();
        }
        let prepared = self.patterns.split_inline_headings(&normalized);

        let mut chapters = Vec::new();
        let mut current: Option<Draft> = None;
        let mut detected_heading = false;

        for line in prepared.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if self.patterns.is_heading(line) {
                detected_heading = true;
                if let Some(chapter) = current.take().and_then(Draft::finish) {
                    chapters.push(chapter);
                }
                current = Some(Draft::titled(clean_heading(line)));
            } else {
                current
                    .get_or_insert_with(Draft::default)
                    .lines
                    .push(line.to_string());
            }
        }

        if let Some(chapter) = current.and_then(Draft::finish) {
            chapters.push(chapter);
        }

        if !detected_heading {
            return Vec::new();
        }
        chapters
    }
}

/// Segment with the process-wide default pattern table.
pub fn segment(text: &str) -> Vec<Chapter> {
    Segmenter::new(HeadingPatterns::global()).segment(text)
}

/// Rewrite dash and numbered list markers as bullets; trim everything else.
pub fn format_content_line(line: &str) -> String {
    let line = line.trim();
    if let Some(marker) = DASH_MARKER.find(line) {
        return format!("{}{}", BULLET, &line[marker.end()..]).trim().to_string();
    }
    if let Some(marker) = NUMBER_MARKER.find(line) {
        return format!("{}{}", BULLET, &line[marker.end()..]).trim().to_string();
    }
    line.to_string()
}
