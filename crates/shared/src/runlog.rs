use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, SecondsFormat, Utc};
use serde::Serialize;

use crate::openai::TokenUsage;
use crate::ranker::ModelCall;

/// Flat per-token price used for the approximate cost line.
pub const USD_PER_TOKEN: f64 = 0.000005;

const LOG_DIR: &str = "logs";

/// Per-run token and cost accounting across every model call.
#[derive(Debug, Serialize)]
pub struct TokenAccounting {
    pub preface_call: TokenUsage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection_call: Option<TokenUsage>,
    pub grand_total: u32,
    pub approx_cost_usd: f64,
}

impl TokenAccounting {
    pub fn new(preface: TokenUsage, selection: Option<TokenUsage>) -> Self {
        let grand_total = preface.total_tokens
            + selection.as_ref().map(|u| u.total_tokens).unwrap_or(0);

        Self {
            preface_call: preface,
            selection_call: selection,
            grand_total,
            approx_cost_usd: approx_cost(grand_total),
        }
    }
}

/// Round to 4 decimal places, matching the audit-log convention.
pub fn approx_cost(total_tokens: u32) -> f64 {
    (total_tokens as f64 * USD_PER_TOKEN * 10_000.0).round() / 10_000.0
}

/// Structured audit record for one run. Written once, never read back here.
#[derive(Debug, Serialize)]
pub struct RunLog {
    pub timestamp_utc: String,
    pub target_date: String,
    pub total_papers: usize,
    pub picked_indices: Vec<usize>,
    pub token_usage: TokenAccounting,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection_call: Option<ModelCall>,
    pub preface_prompt_sent: String,
    pub preface_reply: String,
}

impl RunLog {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        target_date: NaiveDate,
        total_papers: usize,
        picked_indices: Vec<usize>,
        token_usage: TokenAccounting,
        selection_call: Option<ModelCall>,
        preface_prompt_sent: String,
        preface_reply: String,
    ) -> Self {
        Self {
            timestamp_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            target_date: target_date.format("%Y-%m-%d").to_string(),
            total_papers,
            picked_indices,
            token_usage,
            selection_call,
            preface_prompt_sent,
            preface_reply,
        }
    }

    /// Persist as pretty JSON under `logs/`, keyed by target date.
    pub fn write(&self, date: NaiveDate) -> Result<PathBuf> {
        fs::create_dir_all(LOG_DIR).context("Failed to create logs directory")?;

        let filepath = PathBuf::from(LOG_DIR).join(format!(
            "mt_digest_{}.log",
            date.format("%Y-%m-%d")
        ));

        // Every field is a plain string/number, so serialization cannot fail
        // on values; only the write itself can.
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run log")?;
        fs::write(&filepath, json).context("Failed to write run log")?;

        Ok(filepath)
    }
}
