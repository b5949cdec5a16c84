use thiserror::Error;

/// Failure kinds the digest pipeline distinguishes.
///
/// Everything else travels as `anyhow::Error` with context attached; these
/// variants exist because callers (and tests) need to tell them apart.
#[derive(Debug, Error)]
pub enum DigestError {
    /// A required credential environment variable is not set
    #[error("environment variable {0} is missing")]
    MissingCredential(String),

    /// arXiv or the embedding model could not be reached/loaded
    #[error("upstream source unavailable: {0}")]
    SourceUnavailable(String),

    /// The classification reply contained no decodable JSON index array
    #[error("could not parse an index array from the model reply: {reply:?}")]
    SelectionParse { reply: String },

    /// A date string from the CLI or environment is not YYYY-MM-DD
    #[error("bad date {value:?} (want YYYY-MM-DD)")]
    MalformedDate { value: String },

    /// A 1-based selection index points outside the fetched batch
    #[error("selection index {index} is out of range for {len} papers")]
    IndexOutOfRange { index: usize, len: usize },
}
