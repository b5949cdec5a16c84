use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use shared::{date_from_filename, subject_for_date, ButtondownClient, SendConfig};

#[derive(Parser)]
#[command(name = "send-digest")]
#[command(about = "Upload a digest as a Buttondown draft and send it to all subscribers")]
struct Args {
    /// Path to a Markdown digest whose name ends in _YYYY-MM-DD
    file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if !args.file.exists() {
        anyhow::bail!("File not found: {}", args.file.display());
    }

    let config = SendConfig::from_env()?;

    let date = date_from_filename(&args.file)?;
    let subject = subject_for_date(date);

    let body = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read digest: {}", args.file.display()))?;

    let client = ButtondownClient::new(config.buttondown_token)?;

    println!("⏳ Uploading draft...");
    let email_id = client.create_draft(&subject, &body).await?;
    println!("✓ Draft ready: {}", email_id);

    println!("⏳ Sending to subscribers...");
    client.send_draft(&email_id).await?;

    println!("✅ Sent at {} UTC", Utc::now().format("%Y-%m-%d %H:%M:%S"));

    Ok(())
}
