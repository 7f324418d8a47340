//! Text embeddings.
//!
//! [`Embedder`] is the seam between the index and whichever model turns text
//! into vectors. Two implementations exist: the OpenAI embeddings endpoint
//! (see `llm::openai`) and [`HarmonicEmbedder`], an offline deterministic
//! projection that needs no network or model files.

use std::f64::consts::PI;

use crate::core::error::Result;

/// Dimension of [`HarmonicEmbedder`] vectors (two components per modulus).
pub const HARMONIC_DIM: usize = 384;

const NUM_MODULI: usize = HARMONIC_DIM / 2;

/// Tokens longer than this are truncated before projection.
const MAX_TOKEN_CHARS: usize = 64;

pub trait Embedder {
    /// Identifier stored with an index; queries must use the same model.
    fn model_id(&self) -> String;

    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Harmonic token projection.
///
/// Each token is read as a base-2^16 integer of its code points, reduced
/// modulo the first [`NUM_MODULI`] primes and every residue is placed on the
/// unit circle. Token vectors are mean pooled and L2 normalized. Shared words
/// produce similar vectors; there is no notion of meaning beyond that.
pub struct HarmonicEmbedder {
    moduli: Vec<u64>,
}

impl HarmonicEmbedder {
    pub fn new() -> Self {
        Self {
            moduli: first_primes(NUM_MODULI),
        }
    }

    fn project_token(&self, token: &str, acc: &mut [f64]) {
        let n = token
            .chars()
            .take(MAX_TOKEN_CHARS)
            .fold(0u64, |n, c| n.wrapping_mul(65536).wrapping_add(c as u64));

        for (i, &m) in self.moduli.iter().enumerate() {
            let theta = 2.0 * PI * ((n % m) as f64) / (m as f64);
            acc[2 * i] += theta.sin();
            acc[2 * i + 1] += theta.cos();
        }
    }
}

impl Default for HarmonicEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for HarmonicEmbedder {
    fn model_id(&self) -> String {
        format!("harmonic-{}", HARMONIC_DIM)
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let tokens = tokenize(text);
        let mut acc = vec![0.0f64; HARMONIC_DIM];

        if tokens.is_empty() {
            return Ok(vec![0.0; HARMONIC_DIM]);
        }

        for token in &tokens {
            self.project_token(token, &mut acc);
        }

        let count = tokens.len() as f64;
        acc.iter_mut().for_each(|v| *v /= count);

        let norm = acc.iter().map(|x| x * x).sum::<f64>().sqrt();
        let scale = if norm > 0.0 { norm } else { 1.0 };
        Ok(acc.iter().map(|x| (*x / scale) as f32).collect())
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

fn first_primes(count: usize) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::with_capacity(count);
    let mut candidate = 2u64;
    while primes.len() < count {
        if primes
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0)
        {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_primes() {
        let primes = first_primes(8);
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19]);
        assert_eq!(first_primes(NUM_MODULI).len(), NUM_MODULI);
    }

    #[test]
    fn test_deterministic_across_instances() {
        let a = HarmonicEmbedder::new();
        let b = HarmonicEmbedder::new();
        let text = "Quarterly revenue grew by twelve percent";

        assert_eq!(a.embed(text).unwrap(), b.embed(text).unwrap());
        assert_ne!(a.embed(text).unwrap(), a.embed("cooking recipes").unwrap());
    }

    #[test]
    fn test_normalized_and_sized() {
        let model = HarmonicEmbedder::new();
        let emb = model.embed("The summary of the report").unwrap();

        assert_eq!(emb.len(), HARMONIC_DIM);
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let emb = HarmonicEmbedder::new().embed("  ... ").unwrap();
        assert!(emb.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_shared_words_rank_higher() {
        let model = HarmonicEmbedder::new();
        let query = model.embed("revenue growth").unwrap();
        let related = model.embed("the revenue growth this quarter").unwrap();
        let unrelated = model.embed("a recipe for lemon cake").unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &[1.0, 0.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 0.001);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 0.001);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }
}
