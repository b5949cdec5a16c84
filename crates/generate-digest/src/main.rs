use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use shared::{
    digest, ArxivClient, DigestConfig, EmbeddingRanker, LlmRanker, MiniLmEncoder, OpenAiClient,
    PrefaceWriter, Ranker, RunLog, TokenAccounting, MAX_RESULTS,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Local embedding similarity against the MT concept vector
    Embedding,
    /// One LLM classification call over the whole batch
    Llm,
}

#[derive(Parser)]
#[command(name = "generate-digest")]
#[command(about = "Generate the daily MT-centric arXiv digest")]
struct Args {
    /// Target UTC date YYYY-MM-DD (positional)
    date: Option<String>,

    /// Target UTC date (flag). Ignored if the positional date is given.
    #[arg(long = "date")]
    date_flag: Option<String>,

    /// Maximum papers to include
    #[arg(long = "max", default_value = "5")]
    max_picks: usize,

    /// Ranking strategy
    #[arg(long, value_enum, default_value = "embedding")]
    strategy: Strategy,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = DigestConfig::from_env()?;

    let target_date = shared::resolve_target_date(
        args.date.as_deref(),
        args.date_flag.as_deref(),
        config.date_override.as_deref(),
    )?;

    println!("📚 Fetching cs.CL submissions for {}...", target_date);
    let arxiv = ArxivClient::new()?;
    let papers = arxiv
        .fetch_cs_cl(target_date, MAX_RESULTS)
        .await
        .context("Failed to fetch papers")?;

    if papers.is_empty() {
        println!("No cs.CL papers on that date.");
        return Ok(());
    }

    println!("✓ Found {} papers", papers.len());

    let openai = OpenAiClient::new(config.openai_api_key.clone())?;

    let ranker: Box<dyn Ranker> = match args.strategy {
        Strategy::Embedding => {
            println!("🔢 Loading embedding model...");
            let encoder = Arc::new(MiniLmEncoder::new()?);
            Box::new(EmbeddingRanker::new(encoder)?)
        }
        Strategy::Llm => Box::new(LlmRanker::new(OpenAiClient::new(
            config.openai_api_key.clone(),
        )?)),
    };

    println!("🔍 Ranking papers...");
    let selection = ranker
        .select(&papers, args.max_picks)
        .await
        .context("Failed to rank papers")?;
    println!("✓ Selected {} papers", selection.indices.len());

    println!("📝 Drafting preface...");
    let preface = PrefaceWriter::new(openai)
        .draft(target_date, &papers, &selection.indices)
        .await
        .context("Failed to draft preface")?;

    let markdown = digest::render_markdown(&preface.text, &papers, &selection.indices)?;
    let md_path = digest::save_markdown(&markdown, target_date)?;

    let accounting = TokenAccounting::new(
        preface.usage.clone(),
        selection.call.as_ref().map(|c| c.usage.clone()),
    );
    let log = RunLog::new(
        target_date,
        papers.len(),
        selection.indices.clone(),
        accounting,
        selection.call.clone(),
        preface.prompt.clone(),
        preface.text.clone(),
    );
    let log_path = log.write(target_date)?;

    println!(
        "✓ Digest saved at {}  |  Log → {}",
        md_path.display(),
        log_path.display()
    );

    Ok(())
}
