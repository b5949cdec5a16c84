use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Client;

use crate::error::DigestError;

/// Hard cap on papers pulled for one day; cs.CL rarely exceeds this.
pub const MAX_RESULTS: usize = 220;

const ARXIV_API: &str = "http://export.arxiv.org/api/query";

/// One cs.CL submission, as much of it as the digest needs.
#[derive(Debug, Clone)]
pub struct Paper {
    /// arXiv short id, e.g. "2505.12345v1"
    pub id: String,
    /// Title collapsed to a single line
    pub title: String,
    /// Abstract collapsed to a single paragraph
    pub abstract_text: String,
    /// Link to the full text (PDF when the feed provides one)
    pub url: String,
}

pub struct ArxivClient {
    client: Client,
}

impl ArxivClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Fetch every cs.CL submission for one UTC day, ordered by submission
    /// time, capped at `max_results`. An empty day is an empty Vec, not an
    /// error; an unreachable API is `DigestError::SourceUnavailable`.
    pub async fn fetch_cs_cl(&self, date: NaiveDate, max_results: usize) -> Result<Vec<Paper>> {
        let day = date.format("%Y%m%d").to_string();
        let query = format!("cat:cs.CL AND submittedDate:[{day}0000 TO {day}2359]");

        let url = format!(
            "{}?search_query={}&sortBy=submittedDate&sortOrder=descending&start=0&max_results={}",
            ARXIV_API,
            urlencoding::encode(&query),
            max_results
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DigestError::SourceUnavailable(format!("arXiv query failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("arXiv API returned error: {} - {}", status, error_text);
        }

        let body = response
            .text()
            .await
            .map_err(|e| DigestError::SourceUnavailable(format!("arXiv read failed: {e}")))?;

        Ok(parse_atom_feed(&body))
    }
}

/// Pull the fields the digest needs out of an arXiv Atom feed.
///
/// The feed is machine-generated with one tag per line of interest, so a few
/// targeted regexes are enough; entries missing a required field are skipped.
pub fn parse_atom_feed(body: &str) -> Vec<Paper> {
    // Feed-level <title> comes before the first <entry>, so scoping the
    // field regexes to each entry block keeps it out of the results.
    let entry_re = Regex::new(r"(?s)<entry>(.*?)</entry>").expect("static regex");
    let id_re = Regex::new(r"(?s)<id>(.*?)</id>").expect("static regex");
    let title_re = Regex::new(r"(?s)<title>(.*?)</title>").expect("static regex");
    let summary_re = Regex::new(r"(?s)<summary>(.*?)</summary>").expect("static regex");
    let pdf_re = Regex::new(r#"<link[^>]*title="pdf"[^>]*href="([^"]+)""#).expect("static regex");

    let mut papers = Vec::new();

    for entry in entry_re.captures_iter(body) {
        let block = &entry[1];

        let raw_id = match id_re.captures(block) {
            Some(c) => c[1].trim().to_string(),
            None => continue,
        };
        let title = match title_re.captures(block) {
            Some(c) => normalize_whitespace(&unescape_xml(&c[1])),
            None => continue,
        };
        let abstract_text = match summary_re.captures(block) {
            Some(c) => normalize_whitespace(&unescape_xml(&c[1])),
            None => continue,
        };

        // The <id> is the abs URL; the short id is its last path segment
        let id = raw_id
            .rsplit('/')
            .next()
            .unwrap_or(raw_id.as_str())
            .to_string();

        let url = pdf_re
            .captures(block)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| raw_id.clone());

        papers.push(Paper {
            id,
            title,
            abstract_text,
            url,
        });
    }

    papers
}

/// Collapse runs of whitespace (including newlines) to single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query: search_query=cat:cs.CL</title>
  <entry>
    <id>http://arxiv.org/abs/2505.11111v1</id>
    <title>Document-Level
        Neural Machine Translation</title>
    <summary>  We study   document-level
 context for NMT &amp; report BLEU gains.
    </summary>
    <link href="http://arxiv.org/abs/2505.11111v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2505.11111v1" rel="related" type="application/pdf"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2505.22222v2</id>
    <title>Parsing Treebanks</title>
    <summary>A paper about parsing.</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed_extracts_papers() {
        let papers = parse_atom_feed(SAMPLE_FEED);
        assert_eq!(papers.len(), 2);

        assert_eq!(papers[0].id, "2505.11111v1");
        assert_eq!(papers[0].title, "Document-Level Neural Machine Translation");
        assert_eq!(
            papers[0].abstract_text,
            "We study document-level context for NMT & report BLEU gains."
        );
        assert_eq!(papers[0].url, "http://arxiv.org/pdf/2505.11111v1");
    }

    #[test]
    fn test_parse_feed_falls_back_to_abs_url_without_pdf_link() {
        let papers = parse_atom_feed(SAMPLE_FEED);
        assert_eq!(papers[1].url, "http://arxiv.org/abs/2505.22222v2");
    }

    #[test]
    fn test_parse_feed_skips_feed_level_title() {
        let papers = parse_atom_feed(SAMPLE_FEED);
        assert!(papers.iter().all(|p| !p.title.contains("ArXiv Query")));
    }

    #[test]
    fn test_parse_empty_feed() {
        let body = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#;
        assert!(parse_atom_feed(body).is_empty());
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("a\n  b\t c "), "a b c");
        assert_eq!(normalize_whitespace("   "), "");
    }
}
