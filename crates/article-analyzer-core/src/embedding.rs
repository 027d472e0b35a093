//! Vector utilities for embedding-based retrieval.
//!
//! Every vector stored in a [`CorpusIndex`](crate::index::CorpusIndex) is
//! L2-normalized, so cosine similarity between two stored vectors reduces
//! to a [`dot`] product.
//!
//! The [`Embedder`](crate::provider::Embedder) trait itself lives in
//! [`crate::provider`] next to the other model collaborators.

use anyhow::{bail, Result};

/// Tolerance used when checking that a vector has unit length.
pub const UNIT_NORM_TOLERANCE: f32 = 1e-5;

/// Euclidean length of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale a vector in place to unit length.
///
/// # Errors
///
/// Fails for empty vectors, vectors with non-finite components, and
/// (near-)zero vectors, none of which have a direction to compare.
pub fn l2_normalize(v: &mut [f32]) -> Result<()> {
    if v.is_empty() {
        bail!("cannot normalize an empty vector");
    }
    if v.iter().any(|x| !x.is_finite()) {
        bail!("vector contains non-finite components");
    }
    let norm = l2_norm(v);
    if norm < f32::EPSILON {
        bail!("cannot normalize a zero vector");
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    Ok(())
}

/// Whether `v` has unit length within [`UNIT_NORM_TOLERANCE`].
pub fn is_unit(v: &[f32]) -> bool {
    (l2_norm(v) - 1.0).abs() <= UNIT_NORM_TOLERANCE
}

/// Dot product of two equal-length vectors.
///
/// Returns `0.0` for vectors of different lengths.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
