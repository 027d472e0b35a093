//! Offline feature-hashing embedder.
//!
//! Every lowercase alphanumeric token adds one to the bucket selected by
//! the first eight bytes of its SHA-256 digest; the vector is then
//! L2-normalized. Texts sharing words land close together, which is enough
//! for tests and air-gapped runs. No model download, no network.

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use article_analyzer_core::embedding::l2_normalize;
use article_analyzer_core::provider::Embedder;

pub const DEFAULT_HASH_DIMS: usize = 256;

pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(head) % self.dims as u64) as usize
    }

    /// Embed one text. Text without any word token hashes as a whole, and
    /// blank text maps to the first axis, so the vector is never zero.
    pub fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; self.dims];
        let mut tokens = 0usize;
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            v[self.bucket(&token.to_lowercase())] += 1.0;
            tokens += 1;
        }
        if tokens == 0 {
            let whole = text.trim();
            let bucket = if whole.is_empty() { 0 } else { self.bucket(whole) };
            v[bucket] = 1.0;
        }
        l2_normalize(&mut v)?;
        Ok(v)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash"
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_one(t)).collect()
    }
}
