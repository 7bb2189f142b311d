//! Fallback chapters built from a book synopsis.

use super::headings::HeadingPatterns;
use super::normalizer::normalize_text;
use super::segmenter::Segmenter;
use super::{Chapter, ChapterList};

/// Build chapters from a synopsis with the default pattern table.
pub fn build_fallback(synopsis: &str) -> ChapterList {
    build_fallback_with(synopsis, HeadingPatterns::global())
}

/// Segment the synopsis, or keep it whole as one untitled chapter.
///
/// Only an empty synopsis yields an empty list.
pub fn build_fallback_with(synopsis: &str, patterns: &HeadingPatterns) -> ChapterList {
    let synopsis = normalize_text(synopsis);
    if synopsis.is_empty() {
        return Vec::new();
    }

    let chapters = Segmenter::new(patterns).segment(&synopsis);
    if !chapters.is_empty() {
        return chapters;
    }

    vec![Chapter::new("", synopsis)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_synopsis() {
        assert!(build_fallback("").is_empty());
        assert!(build_fallback(" \n\u{00a0}").is_empty());
    }

    #[test]
    fn test_unstructured_synopsis() {
        assert_eq!(build_fallback("Hello world."), vec![Chapter::new("", "Hello world.")]);
    }

    #[test]
    fn test_unstructured_synopsis_is_normalized() {
        assert_eq!(
            build_fallback("  Line one.\r\nLine\ttwo. "),
            vec![Chapter::new("", "Line one.\nLine two.")]
        );
    }

    #[test]
    fn test_unstructured_bullets_stay_verbatim() {
        assert_eq!(
            build_fallback("- item one - item two"),
            vec![Chapter::new("", "- item one - item two")]
        );
    }

    #[test]
    fn test_structured_synopsis() {
        let chapters = build_fallback("Preface\nWhy read this.\nChapter 1\nStart.");
        assert_eq!(
            chapters,
            vec![
                Chapter::new("Preface", "Why read this."),
                Chapter::new("Chapter 1", "Start."),
            ]
        );
    }
}
