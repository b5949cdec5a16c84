use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::arxiv::Paper;
use crate::error::DigestError;

/// Assemble the Markdown digest: preface, then one section per pick with a
/// hyperlinked title heading and the abstract as body.
///
/// Picks are 1-based; anything outside the batch is a typed
/// `IndexOutOfRange` failure rather than a silent truncation.
pub fn render_markdown(
    preface: &str,
    papers: &[Paper],
    picks: &[usize],
) -> Result<String, DigestError> {
    let mut lines: Vec<String> = vec![preface.to_string(), String::new()];

    for &idx in picks {
        let paper = idx
            .checked_sub(1)
            .and_then(|i| papers.get(i))
            .ok_or(DigestError::IndexOutOfRange {
                index: idx,
                len: papers.len(),
            })?;

        lines.push(format!("## [{}]({})", paper.title, paper.url));
        lines.push(String::new());
        lines.push(paper.abstract_text.clone());
        lines.push(String::new());
    }

    Ok(lines.join("\n"))
}

pub fn digest_filename(date: NaiveDate) -> String {
    format!("mt_digest_{}.md", date.format("%Y-%m-%d"))
}

/// Write the digest next to the working directory, named by target date.
pub fn save_markdown(content: &str, date: NaiveDate) -> Result<PathBuf> {
    let filepath = PathBuf::from(digest_filename(date));
    fs::write(&filepath, content).context("Failed to write digest file")?;
    Ok(filepath)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(n: usize) -> Paper {
        Paper {
            id: format!("2505.0000{n}v1"),
            title: format!("Paper {n}"),
            abstract_text: format!("Abstract {n}."),
            url: format!("http://arxiv.org/pdf/2505.0000{n}v1"),
        }
    }

    fn batch(len: usize) -> Vec<Paper> {
        (1..=len).map(paper).collect()
    }

    #[test]
    fn test_render_contains_preface_and_sections() {
        let md = render_markdown("Today's picks.", &batch(3), &[2, 1]).unwrap();

        assert!(md.starts_with("Today's picks.\n"));
        assert!(md.contains("## [Paper 2](http://arxiv.org/pdf/2505.00002v1)"));
        assert!(md.contains("Abstract 2."));
        assert!(md.contains("## [Paper 1](http://arxiv.org/pdf/2505.00001v1)"));

        // Sections appear in selection order
        let pos2 = md.find("Paper 2").unwrap();
        let pos1 = md.find("Paper 1").unwrap();
        assert!(pos2 < pos1);
    }

    #[test]
    fn test_render_empty_picks_is_just_preface() {
        let md = render_markdown("Nothing today.", &batch(3), &[]).unwrap();
        assert_eq!(md, "Nothing today.\n");
        assert!(!md.contains("##"));
    }

    #[test]
    fn test_render_out_of_range_pick_is_typed_error() {
        // Index 9 into a 5-paper batch: distinct failure, not truncation
        let err = render_markdown("p", &batch(5), &[2, 4, 9]).unwrap_err();
        match err {
            DigestError::IndexOutOfRange { index, len } => {
                assert_eq!(index, 9);
                assert_eq!(len, 5);
            }
            other => panic!("expected IndexOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_render_zero_pick_is_typed_error() {
        let err = render_markdown("p", &batch(5), &[0]).unwrap_err();
        assert!(matches!(err, DigestError::IndexOutOfRange { index: 0, .. }));
    }

    #[test]
    fn test_digest_filename() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
        assert_eq!(digest_filename(date), "mt_digest_2025-05-20.md");
    }
}
