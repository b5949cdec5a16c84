use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::error::DigestError;

/// Topic phrases whose joint embedding anchors the relevance scoring.
pub const CONCEPTS: &[&str] = &[
    "machine translation",
    "neural machine translation",
    "NMT",
    "document-level translation",
    "low-resource translation",
    "cross-lingual transfer",
    "translation evaluation BLEU COMET chrF",
    "post-editing",
    "mtpe",
    "mtqe",
    "linguistic quality assurance",
    "lqa",
    "mqm",
];

/// Produces a unit-normalized embedding for a piece of text.
///
/// Kept behind a trait so the ranker can be exercised with a deterministic
/// in-memory encoder instead of a real model.
pub trait TextEncoder: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<f32>, DigestError>;
}

/// Local MiniLM encoder, loaded once per process and read-only thereafter.
pub struct MiniLmEncoder {
    // fastembed needs &mut for inference, and the pipeline is sequential,
    // so a plain Mutex is enough
    model: Mutex<TextEmbedding>,
}

impl MiniLmEncoder {
    pub fn new() -> Result<Self, DigestError> {
        let model = TextEmbedding::try_new(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
            .map_err(|e| {
                DigestError::SourceUnavailable(format!("failed to load embedding model: {e}"))
            })?;

        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl TextEncoder for MiniLmEncoder {
    fn encode(&self, text: &str) -> Result<Vec<f32>, DigestError> {
        let mut model = self.model.lock().unwrap_or_else(|e| e.into_inner());

        let embeddings = model
            .embed(vec![text.to_string()], None)
            .map_err(|e| DigestError::SourceUnavailable(format!("embedding failed: {e}")))?;

        let vector = embeddings.into_iter().next().ok_or_else(|| {
            DigestError::SourceUnavailable("embedding model returned no vector".to_string())
        })?;

        Ok(unit_normalize(vector))
    }
}

/// Encode the fixed concept phrase list into one normalized anchor vector.
pub fn concept_vector(encoder: &dyn TextEncoder) -> Result<Vec<f32>, DigestError> {
    encoder.encode(&CONCEPTS.join(" ; "))
}

/// Scale a vector to unit length; a zero vector is returned unchanged.
pub fn unit_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut vector {
            *x /= norm;
        }
    }
    vector
}

/// Dot product; cosine similarity when both inputs are unit-normalized.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
