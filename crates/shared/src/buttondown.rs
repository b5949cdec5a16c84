use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::DigestError;

const BTN_API: &str = "https://api.buttondown.email/v1";
const DUPLICATE_CODE: &str = "email_duplicate";

#[derive(Serialize)]
struct DraftPayload<'a> {
    subject: &'a str,
    body: &'a str,
    markdown: bool,
    publish_url: bool,
}

#[derive(Deserialize)]
struct EmailResource {
    id: String,
}

#[derive(Deserialize)]
struct EmailList {
    results: Vec<EmailResource>,
}

#[derive(Deserialize, Default)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
}

fn is_duplicate(body: &str) -> bool {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|e| e.code)
        .as_deref()
        == Some(DUPLICATE_CODE)
}

pub struct ButtondownClient {
    client: Client,
    token: String,
}

impl ButtondownClient {
    pub fn new(token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, token })
    }

    fn auth(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Queue the digest as a draft and return its id.
    ///
    /// A duplicate response means an identical draft already exists; it is
    /// looked up by subject and reused instead of failing the run.
    pub async fn create_draft(&self, subject: &str, body_md: &str) -> Result<String> {
        let payload = DraftPayload {
            subject,
            body: body_md,
            markdown: true,
            publish_url: false,
        };

        let response = self
            .client
            .post(format!("{BTN_API}/emails"))
            .header("Authorization", self.auth())
            .json(&payload)
            .send()
            .await
            .context("Failed to upload draft to Buttondown")?;

        let status = response.status();
        if status.is_success() {
            let created = response
                .json::<EmailResource>()
                .await
                .context("Failed to parse draft-create response")?;
            return Ok(created.id);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("unknown error"));

        if is_duplicate(&error_text) {
            println!("ℹ️  Draft already exists - fetching its ID");
            // The just-rejected draft may not be searchable immediately
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            return self.find_draft(subject).await;
        }

        anyhow::bail!("Draft upload failed: {} - {}", status, error_text);
    }

    async fn find_draft(&self, subject: &str) -> Result<String> {
        let url = format!(
            "{BTN_API}/emails?state=draft&search={}",
            urlencoding::encode(subject)
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth())
            .send()
            .await
            .context("Failed to search Buttondown drafts")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Draft search failed: {} - {}", status, error_text);
        }

        let list = response
            .json::<EmailList>()
            .await
            .context("Failed to parse draft search response")?;

        list.results
            .into_iter()
            .next()
            .map(|r| r.id)
            .ok_or_else(|| anyhow::anyhow!("Duplicate reported but existing draft not found"))
    }

    /// Trigger the send to the full subscriber list.
    ///
    /// A 400 duplicate response means the email already went out earlier;
    /// that is a successful no-op so the daily job stays idempotent.
    pub async fn send_draft(&self, email_id: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{BTN_API}/emails/{email_id}/send-draft"))
            .header("Authorization", self.auth())
            .json(&serde_json::json!({})) // empty -> full subscriber list
            .send()
            .await
            .context("Failed to send draft via Buttondown")?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("unknown error"));

        if status.as_u16() == 400 && is_duplicate(&error_text) {
            println!("ℹ️  Email already sent earlier - nothing to do");
            return Ok(());
        }

        anyhow::bail!("Send failed: {} - {}", status, error_text);
    }
}

/// Pull the target date out of a digest filename ending in `_YYYY-MM-DD`.
pub fn date_from_filename(path: &Path) -> Result<NaiveDate, DigestError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    // Last 10 bytes hold the YYYY-MM-DD suffix; a non-boundary slice just
    // falls through to the parse failure below
    let candidate = stem
        .get(stem.len().saturating_sub(10)..)
        .unwrap_or(stem);

    NaiveDate::parse_from_str(candidate, "%Y-%m-%d").map_err(|_| DigestError::MalformedDate {
        value: stem.to_string(),
    })
}

/// Subject line for one digest, e.g. "Machine-Translation Digest — May 19 2025".
pub fn subject_for_date(date: NaiveDate) -> String {
    format!(
        "Machine-Translation Digest — {}",
        date.format("%b %d %Y")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_date_from_filename() {
        let path = PathBuf::from("mt_digest_2025-05-19.md");
        let date = date_from_filename(&path).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 5, 19).unwrap());
    }

    #[test]
    fn test_date_from_filename_with_directory() {
        let path = PathBuf::from("/tmp/digests/mt_digest_2025-12-01.md");
        let date = date_from_filename(&path).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
    }

    #[test]
    fn test_date_from_filename_rejects_bad_suffix() {
        let err = date_from_filename(&PathBuf::from("mt_digest_today.md")).unwrap_err();
        assert!(matches!(err, DigestError::MalformedDate { .. }));
    }

    #[test]
    fn test_subject_for_date() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 19).unwrap();
        assert_eq!(
            subject_for_date(date),
            "Machine-Translation Digest — May 19 2025"
        );
    }

    #[test]
    fn test_is_duplicate_detection() {
        assert!(is_duplicate(r#"{"code": "email_duplicate"}"#));
        assert!(!is_duplicate(r#"{"code": "rate_limited"}"#));
        assert!(!is_duplicate("not even json"));
        assert!(!is_duplicate(r#"{"detail": "no code field"}"#));
    }
}
