// Public modules
pub mod arxiv;
pub mod buttondown;
pub mod config;
pub mod dates;
pub mod digest;
pub mod encoder;
pub mod error;
pub mod openai;
pub mod preface;
pub mod ranker;
pub mod runlog;

// Re-export commonly used types
pub use arxiv::{ArxivClient, Paper, MAX_RESULTS};
pub use buttondown::{date_from_filename, subject_for_date, ButtondownClient};
pub use config::{DigestConfig, SendConfig};
pub use dates::resolve_target_date;
pub use encoder::{MiniLmEncoder, TextEncoder};
pub use error::DigestError;
pub use openai::{OpenAiClient, TokenUsage};
pub use preface::{Preface, PrefaceWriter};
pub use ranker::{EmbeddingRanker, LlmRanker, Ranker, Selection};
pub use runlog::{RunLog, TokenAccounting};
