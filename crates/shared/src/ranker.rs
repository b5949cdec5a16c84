use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;

use crate::arxiv::Paper;
use crate::encoder::{concept_vector, dot, TextEncoder};
use crate::error::DigestError;
use crate::openai::{ChatMessage, OpenAiClient, TokenUsage};

pub const CLASSIFIER_MODEL: &str = "gpt-4o";

/// Audit record of one chat completion made during ranking.
#[derive(Debug, Clone, Serialize)]
pub struct ModelCall {
    pub prompt: String,
    pub reply: String,
    pub usage: TokenUsage,
}

/// Result of one ranking pass.
///
/// `indices` are 1-based into the fetched batch, unique, in range, at most
/// `max_picks` long. `call` is the classification call record when the LLM
/// strategy was used.
#[derive(Debug, Clone)]
pub struct Selection {
    pub indices: Vec<usize>,
    pub call: Option<ModelCall>,
}

/// Picks the MT-relevant subset of a fetched batch.
///
/// Both strategies sit behind this one method so the pipeline never cares
/// which is in use.
#[async_trait]
pub trait Ranker: Send + Sync {
    async fn select(&self, papers: &[Paper], max_picks: usize) -> Result<Selection>;
}

// ---------------------------------------------------------------------------
// Strategy A: LLM classification
// ---------------------------------------------------------------------------

pub struct LlmRanker {
    client: OpenAiClient,
    model: String,
}

impl LlmRanker {
    pub fn new(client: OpenAiClient) -> Self {
        Self {
            client,
            model: CLASSIFIER_MODEL.to_string(),
        }
    }
}

#[async_trait]
impl Ranker for LlmRanker {
    async fn select(&self, papers: &[Paper], max_picks: usize) -> Result<Selection> {
        if papers.is_empty() || max_picks == 0 {
            return Ok(Selection {
                indices: Vec::new(),
                call: None,
            });
        }

        let prompt = build_catalogue_prompt(papers, max_picks);
        let messages = vec![
            ChatMessage::system("You classify research papers for a machine translation digest."),
            ChatMessage::user(prompt.clone()),
        ];

        // Temperature 0 keeps the ordering as reproducible as the model allows
        let (reply, usage) = self
            .client
            .chat(&self.model, &messages, 0.0)
            .await
            .context("Classification call failed")?;

        let raw = parse_selection(&reply)?;
        let indices = validate_picks(raw, papers.len(), max_picks);

        Ok(Selection {
            indices,
            call: Some(ModelCall {
                prompt,
                reply,
                usage,
            }),
        })
    }
}

fn build_catalogue_prompt(papers: &[Paper], max_picks: usize) -> String {
    let catalogue = papers
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {}\n{}", i + 1, p.title, p.abstract_text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Below is a numbered list of today's cs.CL papers (index, title, abstract).\n\
         Select up to {max_picks} papers most closely related to machine translation \
         or LLM-based machine translation. Prefer practical, implementation-oriented \
         work over purely theoretical surveys.\n\n\
         Respond with ONLY a JSON array of the chosen 1-based indices, most relevant \
         first, e.g. [3, 1, 7]. If nothing qualifies, respond with [].\n\n\
         Papers:\n{catalogue}"
    )
}

/// Extract the first bracketed JSON array from a free-form model reply.
///
/// The model is told to answer with only an array, but prose around it is
/// tolerated; no array at all (or one that fails to decode) is a
/// `SelectionParse` failure, fatal for the run.
pub fn parse_selection(reply: &str) -> Result<Vec<usize>, DigestError> {
    let array_re = Regex::new(r"\[[^\]]*\]").expect("static regex");

    let fragment = array_re
        .find(reply)
        .ok_or_else(|| DigestError::SelectionParse {
            reply: reply.to_string(),
        })?
        .as_str();

    let values: Vec<i64> =
        serde_json::from_str(fragment).map_err(|_| DigestError::SelectionParse {
            reply: reply.to_string(),
        })?;

    Ok(values.into_iter().map(|v| v.max(0) as usize).collect())
}

/// Clamp raw model output to the known batch: drop indices outside
/// `1..=total`, deduplicate preserving first-seen order, cap at `max_picks`.
pub fn validate_picks(raw: Vec<usize>, total: usize, max_picks: usize) -> Vec<usize> {
    let mut seen = Vec::with_capacity(raw.len().min(max_picks));
    for idx in raw {
        if idx >= 1 && idx <= total && !seen.contains(&idx) {
            seen.push(idx);
            if seen.len() == max_picks {
                break;
            }
        }
    }
    seen
}

// ---------------------------------------------------------------------------
// Strategy B: embedding similarity
// ---------------------------------------------------------------------------

pub struct EmbeddingRanker {
    encoder: Arc<dyn TextEncoder>,
    concept: Vec<f32>,
}

impl EmbeddingRanker {
    /// Builds the fixed concept vector once; the encoder is injected so tests
    /// can swap in a deterministic one.
    pub fn new(encoder: Arc<dyn TextEncoder>) -> Result<Self, DigestError> {
        let concept = concept_vector(encoder.as_ref())?;
        Ok(Self { encoder, concept })
    }
}

#[async_trait]
impl Ranker for EmbeddingRanker {
    async fn select(&self, papers: &[Paper], max_picks: usize) -> Result<Selection> {
        let mut scored: Vec<(f32, usize)> = Vec::with_capacity(papers.len());

        for (i, paper) in papers.iter().enumerate() {
            let text = format!("{} {}", paper.title, paper.abstract_text);
            let vector = self.encoder.encode(&text)?;
            scored.push((dot(&self.concept, &vector), i + 1));
        }

        Ok(Selection {
            indices: rank_by_score(scored, max_picks),
            call: None,
        })
    }
}

/// Order (score, 1-based index) pairs by score descending, ties broken by
/// index ascending, and keep the top `max_picks` indices. The explicit index
/// tie-break makes equal-score output deterministic.
pub fn rank_by_score(mut scored: Vec<(f32, usize)>, max_picks: usize) -> Vec<usize> {
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });

    scored
        .into_iter()
        .take(max_picks)
        .map(|(_, idx)| idx)
        .collect()
}
