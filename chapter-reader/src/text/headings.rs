//! Heading detection and heading text cleanup.
//!
//! Headings in source documents are styled inconsistently: some use
//! structural words ("Chapter 3", "Epilogue"), others only a numbering
//! scheme ("2. ...", "IV) ..."). Detection is a fixed, ordered pattern table
//! matched case-insensitively against a single trimmed line.

use once_cell::sync::Lazy;
use regex::Regex;

/// Structural keywords recognized at the start of a heading line.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "prologue",
    "epilogue",
    "afterword",
    "preface",
    "introduction",
    "conclusion",
    "summary",
    "chapter",
    "part",
    "section",
    "пролог",
    "эпилог",
    "послесловие",
    "предисловие",
    "введение",
    "заключение",
    "итоги",
    "глава",
    "часть",
    "раздел",
];

/// Numbering schemes that mark a heading without a keyword.
const ORDINAL_PATTERNS: &[&str] = &[
    r"^\d+\.\s+",
    r"^\d+\)\s+",
    r"(?i)^[ivxlcdm]+\.\s+",
    r"(?i)^[ivxlcdm]+\)\s+",
    r"^№\s*\d+",
];

static DEFAULT_PATTERNS: Lazy<HeadingPatterns> = Lazy::new(|| {
    HeadingPatterns::with_keywords(DEFAULT_KEYWORDS.iter().copied())
        .expect("built-in heading patterns should compile")
});

static LEADING_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:№\s*\d+\s*[.)\-–—]?|\d+\s*[.)\-–—]|\d+\s|[ivxlcdm]+[.)])\s*")
        .expect("leading marker pattern should compile")
});

/// Immutable heading pattern table.
///
/// Built once at startup and shared read-only; segmentation is a pure
/// function of the text and this table.
#[derive(Debug, Clone)]
pub struct HeadingPatterns {
    keywords: Vec<String>,
    line_patterns: Vec<Regex>,
    inline_keyword: Option<Regex>,
}

impl HeadingPatterns {
    /// Build a table from a keyword list plus the fixed ordinal patterns.
    pub fn with_keywords<'a>(keywords: impl IntoIterator<Item = &'a str>) -> Result<Self, regex::Error> {
        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.trim().to_lowercase();
            if !keyword.is_empty() && !normalized.contains(&keyword) {
                normalized.push(keyword);
            }
        }

        let alternation = normalized
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");

        let mut line_patterns = Vec::with_capacity(ORDINAL_PATTERNS.len() + 1);
        if !alternation.is_empty() {
            line_patterns.push(Regex::new(&format!(
                r"(?i)^(?:{})(?:[\d\-–—]|\b)",
                alternation
            ))?);
        }
        for pattern in ORDINAL_PATTERNS {
            line_patterns.push(Regex::new(pattern)?);
        }

        let inline_keyword = if alternation.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(
                r"(?i)[^\S\n]+((?:{})(?:[\d\-–—]|\b))",
                alternation
            ))?)
        };

        Ok(Self {
            keywords: normalized,
            line_patterns,
            inline_keyword,
        })
    }

    /// The default table extended with extra keywords (e.g. from config).
    pub fn with_extra_keywords(extra: &[String]) -> Result<Self, regex::Error> {
        let mut keywords: Vec<&str> = DEFAULT_KEYWORDS.to_vec();
        keywords.extend(extra.iter().map(String::as_str));
        Self::with_keywords(keywords)
    }

    /// Process-wide default table.
    pub fn global() -> &'static HeadingPatterns {
        &DEFAULT_PATTERNS
    }

    /// Keywords in match order, lowercased.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Whether a single line reads as a chapter or section heading.
    pub fn is_heading(&self, line: &str) -> bool {
        let line = line.trim();
        !line.is_empty() && self.line_patterns.iter().any(|p| p.is_match(line))
    }

    /// Break lines before keywords that were glued onto the previous
    /// paragraph, a common document-extraction artifact.
    pub fn split_inline_headings(&self, text: &str) -> String {
        match &self.inline_keyword {
            Some(pattern) => pattern.replace_all(text, "\n${1}").into_owned(),
            None => text.to_string(),
        }
    }
}

impl Default for HeadingPatterns {
    fn default() -> Self {
        Self::global().clone()
    }
}

/// Classify a line using the default table.
pub fn is_heading(line: &str) -> bool {
    HeadingPatterns::global().is_heading(line)
}

/// Turn a raw heading line into a chapter title.
///
/// Strips one pair of surrounding quotes and a leading ordinal marker
/// (`3.`, `IV)`, `№ 2`), then capitalizes the first letter.
pub fn clean_heading(heading: &str) -> String {
    let mut text = heading.trim();
    if let Some(rest) = text.strip_prefix(['«', '"', '\'']) {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix(['»', '"', '\'']) {
        text = rest;
    }
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    let cleaned = match LEADING_MARKER.find(text) {
        Some(marker) => text[marker.end()..].trim(),
        None => text,
    };

    capitalize_first(cleaned)
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => first.to_uppercase().chain(chars).collect(),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_headings() {
        assert!(is_heading("Chapter 1"));
        assert!(is_heading("CHAPTER XII"));
        assert!(is_heading("Epilogue"));
        assert!(is_heading("part-2"));
        assert!(is_heading("Chapter3"));
        assert!(is_heading("Глава 5"));
        assert!(is_heading("ЭПИЛОГ"));
    }

    #[test]
    fn test_keyword_must_be_whole_word() {
        assert!(!is_heading("Particles drift slowly."));
        assert!(!is_heading("Sectional sofas are comfortable."));
        assert!(!is_heading("Главная мысль книги"));
    }

    #[test]
    fn test_ordinal_headings() {
        assert!(is_heading("1. Getting started"));
        assert!(is_heading("12) Habits"));
        assert!(is_heading("iv. The turn"));
        assert!(is_heading("XI) Return"));
        assert!(is_heading("№ 7"));
        assert!(is_heading("№3 Notes"));
    }

    #[test]
    fn test_body_lines() {
        assert!(!is_heading("It was a bright cold day."));
        assert!(!is_heading("3 things to remember"));
        assert!(!is_heading("1.5 million copies"));
        assert!(!is_heading(""));
        assert!(!is_heading("   "));
    }

    #[test]
    fn test_numbered_prose_is_accepted_false_positive() {
        assert!(is_heading("3. Things to remember"));
    }

    #[test]
    fn test_clean_keyword_heading_keeps_text() {
        assert_eq!(clean_heading("Chapter 1"), "Chapter 1");
        assert_eq!(clean_heading("introduction"), "Introduction");
        assert_eq!(clean_heading("conclusion"), "Conclusion");
    }

    #[test]
    fn test_clean_strips_ordinals() {
        assert_eq!(clean_heading("1. getting started"), "Getting started");
        assert_eq!(clean_heading("IV) The fall"), "The fall");
        assert_eq!(clean_heading("№ 2 — notes"), "Notes");
        assert_eq!(clean_heading("1984 and after"), "And after");
        assert_eq!(clean_heading("3 - habits"), "Habits");
    }

    #[test]
    fn test_clean_strips_quotes() {
        assert_eq!(clean_heading("«глава первая»"), "Глава первая");
        assert_eq!(clean_heading("\"part one\""), "Part one");
    }

    #[test]
    fn test_clean_keeps_roman_looking_words() {
        assert_eq!(clean_heading("Did you know"), "Did you know");
        assert_eq!(clean_heading("Mild ideas"), "Mild ideas");
    }

    #[test]
    fn test_clean_empty() {
        assert_eq!(clean_heading(""), "");
        assert_eq!(clean_heading("  \"\" "), "");
    }

    #[test]
    fn test_split_inline_headings() {
        let patterns = HeadingPatterns::global();
        let split = patterns.split_inline_headings("The end of it. Chapter 2 The next part");
        assert_eq!(split, "The end of it.\nChapter 2 The next\npart");
    }

    #[test]
    fn test_split_leaves_line_start_alone() {
        let patterns = HeadingPatterns::global();
        assert_eq!(patterns.split_inline_headings("Chapter 1\nText"), "Chapter 1\nText");
    }

    #[test]
    fn test_extra_keywords() {
        let patterns = HeadingPatterns::with_extra_keywords(&["Interlude".to_string()]).unwrap();
        assert!(patterns.is_heading("Interlude"));
        assert!(patterns.is_heading("Chapter 9"));
        assert!(!is_heading("Interlude"));
        assert!(patterns.keywords().contains(&"interlude".to_string()));
    }

    #[test]
    fn test_empty_keyword_table() {
        let patterns = HeadingPatterns::with_keywords(Vec::<&str>::new()).unwrap();
        assert!(!patterns.is_heading("Chapter 1"));
        assert!(patterns.is_heading("1. First"));
        assert_eq!(patterns.split_inline_headings("a chapter b"), "a chapter b");
    }
}
