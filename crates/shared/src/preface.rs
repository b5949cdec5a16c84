use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::arxiv::Paper;
use crate::openai::{ChatMessage, OpenAiClient, TokenUsage};

pub const PREFACE_MODEL: &str = "gpt-4o";

/// Editorial framing for one digest, plus the audit trail of the call that
/// produced it.
#[derive(Debug, Clone)]
pub struct Preface {
    pub text: String,
    pub prompt: String,
    pub usage: TokenUsage,
}

pub struct PrefaceWriter {
    client: OpenAiClient,
    model: String,
}

impl PrefaceWriter {
    pub fn new(client: OpenAiClient) -> Self {
        Self {
            client,
            model: PREFACE_MODEL.to_string(),
        }
    }

    /// One model call, no retry; a failure aborts the run.
    pub async fn draft(
        &self,
        date: NaiveDate,
        papers: &[Paper],
        picks: &[usize],
    ) -> Result<Preface> {
        let prompt = build_preface_prompt(date, papers, picks);
        let messages = vec![
            ChatMessage::system("You are a helpful research newsletter editor."),
            ChatMessage::user(prompt.clone()),
        ];

        let (text, usage) = self
            .client
            .chat(&self.model, &messages, 0.7)
            .await
            .context("Preface call failed")?;

        Ok(Preface {
            text,
            prompt,
            usage,
        })
    }
}

fn build_preface_prompt(date: NaiveDate, papers: &[Paper], picks: &[usize]) -> String {
    let titles_block = picks
        .iter()
        .filter_map(|&idx| idx.checked_sub(1).and_then(|i| papers.get(i)))
        .map(|p| format!("• {}", p.title))
        .collect::<Vec<_>>()
        .join("\n");

    let titles_block = if titles_block.is_empty() {
        "(no MT-specific papers today)".to_string()
    } else {
        titles_block
    };

    format!(
        "You are writing the short introduction for a daily Machine Translation (MT) research digest.\n\
         Today is {}.\n\n\
         Please produce **exactly 2-3 sentences**:\n\
         • Sentence 1: An introduction like \"Here is today's selection of cs.CL papers most closely related to machine translation.\"\n\
         • Sentence 2-3: A concise summary of the main shared topic(s) or insight(s) you observe across the selected papers.\n\n\
         Do **not** apologise, explain relevance level, or list the papers again.\n\n\
         Selected papers (titles only):\n{}",
        date.format("%Y-%m-%d"),
        titles_block
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(title: &str) -> Paper {
        Paper {
            id: "0000.00000v1".to_string(),
            title: title.to_string(),
            abstract_text: "An abstract.".to_string(),
            url: "http://arxiv.org/abs/0000.00000v1".to_string(),
        }
    }

    #[test]
    fn test_prompt_lists_only_selected_titles() {
        let papers = vec![paper("First"), paper("Second"), paper("Third")];
        let date = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();

        let prompt = build_preface_prompt(date, &papers, &[3, 1]);

        assert!(prompt.contains("2025-05-20"));
        assert!(prompt.contains("• Third"));
        assert!(prompt.contains("• First"));
        assert!(!prompt.contains("• Second"));
    }

    #[test]
    fn test_prompt_handles_empty_selection() {
        let papers = vec![paper("First")];
        let date = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();

        let prompt = build_preface_prompt(date, &papers, &[]);
        assert!(prompt.contains("(no MT-specific papers today)"));
    }
}
