//! Flattening externally supplied sections into one chapter list.

use doc_source::SourceSection;

use super::headings::{HeadingPatterns, clean_heading};
use super::normalizer::normalize_text;
use super::segmenter::Segmenter;
use super::{Chapter, ChapterList};

/// Normalize document sections with the default pattern table.
pub fn normalize_sections(blocks: &[SourceSection]) -> ChapterList {
    normalize_sections_with(blocks, HeadingPatterns::global())
}

/// Re-segment every block body and flatten the result.
///
/// Nested headings win over the block title. The block title only fills a
/// blank leading title, and only for the first block. A block without
/// nested structure is kept whole. An empty result means the source
/// provided no usable structure.
pub fn normalize_sections_with(blocks: &[SourceSection], patterns: &HeadingPatterns) -> ChapterList {
    let segmenter = Segmenter::new(patterns);

    blocks
        .iter()
        .enumerate()
        .fold(Vec::new(), |mut chapters, (block_index, block)| {
            let body = normalize_text(&block.body);
            let title = clean_heading(&block.title);
            let nested = segmenter.segment(&body);

            if nested.is_empty() {
                chapters.push(Chapter::new(title, body));
            } else {
                chapters.extend(nested.into_iter().enumerate().map(|(i, chapter)| {
                    if block_index == 0 && i == 0 && chapter.title.is_empty() {
                        Chapter::new(title.clone(), chapter.body)
                    } else {
                        chapter
                    }
                }));
            }
            chapters
        })
        .into_iter()
        .filter(Chapter::has_content)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(normalize_sections(&[]).is_empty());
    }

    #[test]
    fn test_unstructured_blocks_kept_whole() {
        let blocks = vec![
            SourceSection::new("1. Opening", "Some\u{00a0}text.\r\nMore text."),
            SourceSection::new("closing thoughts", "Done."),
        ];
        let chapters = normalize_sections(&blocks);
        assert_eq!(
            chapters,
            vec![
                Chapter::new("Opening", "Some text.\nMore text."),
                Chapter::new("Closing thoughts", "Done."),
            ]
        );
    }

    #[test]
    fn test_nested_structure_flattened() {
        let blocks = vec![
            SourceSection::new("Book", "Chapter 1\nOne.\nChapter 2\nTwo."),
            SourceSection::new("Appendix", "Plain appendix."),
        ];
        let chapters = normalize_sections(&blocks);
        assert_eq!(
            chapters,
            vec![
                Chapter::new("Chapter 1", "One."),
                Chapter::new("Chapter 2", "Two."),
                Chapter::new("Appendix", "Plain appendix."),
            ]
        );
    }

    #[test]
    fn test_first_block_fills_blank_leading_title() {
        let blocks = vec![SourceSection::new(
            "Overview",
            "Opening words.\nChapter 1\nOne.",
        )];
        let chapters = normalize_sections(&blocks);
        assert_eq!(chapters[0], Chapter::new("Overview", "Opening words."));
        assert_eq!(chapters[1], Chapter::new("Chapter 1", "One."));
    }

    #[test]
    fn test_later_blocks_keep_blank_leading_title() {
        let blocks = vec![
            SourceSection::new("Intro block", "Welcome."),
            SourceSection::new("Second block", "Lead in.\nChapter 4\nFour."),
        ];
        let chapters = normalize_sections(&blocks);
        assert_eq!(
            chapters,
            vec![
                Chapter::new("Intro block", "Welcome."),
                Chapter::new("", "Lead in."),
                Chapter::new("Chapter 4", "Four."),
            ]
        );
    }

    #[test]
    fn test_empty_blocks_filtered() {
        let blocks = vec![
            SourceSection::new("", "  "),
            SourceSection::new("\"\"", "\t"),
        ];
        assert!(normalize_sections(&blocks).is_empty());
    }
}
