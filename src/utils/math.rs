use std::hash::Hash;

use indexmap::IndexMap;
use num::Float;

/// Logistic sigmoid
#[inline]
pub fn sigmoid<F: Float>(z: F) -> F {
    F::one() / (F::one() + (-z).exp())
}

/// Dense dot product
///
/// # Arguments
/// * `a` - left vector
/// * `b` - right vector, must have the same length as `a`
///
/// # Returns
/// * `F` - the sum of element-wise products
#[inline]
pub fn dot<F: Float>(a: &[F], b: &[F]) -> F {
    debug_assert_eq!(a.len(), b.len(), "Vectors must be of the same length to compute dot product.");
    a.iter()
        .zip(b.iter())
        .fold(F::zero(), |acc, (&x, &y)| acc + x * y)
}

/// Squared L2 norm of a sparse vector
#[inline]
pub fn sparse_norm_sq<K, F: Float>(v: &IndexMap<K, F>) -> F {
    v.values().fold(F::zero(), |acc, &x| acc + x * x)
}

/// Sparse dot product
/// iterates the shorter map and looks terms up in the longer one
#[inline]
pub fn sparse_dot<K, F>(a: &IndexMap<K, F>, b: &IndexMap<K, F>) -> F
where
    K: Hash + Eq,
    F: Float,
{
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().fold(F::zero(), |acc, (k, &x)| {
        acc + large.get(k).map_or(F::zero(), |&y| x * y)
    })
}

/// Cosine similarity of two sparse vectors
/// cosθ = A・B / (|A||B|)
///
/// # Returns
/// * `F` - similarity in [-1, 1], or zero if either vector has no mass
#[inline]
pub fn sparse_cosine<K, F>(a: &IndexMap<K, F>, b: &IndexMap<K, F>) -> F
where
    K: Hash + Eq,
    F: Float,
{
    let norm = (sparse_norm_sq(a) * sparse_norm_sq(b)).sqrt();
    if norm <= F::zero() {
        return F::zero();
    }
    let cos = sparse_dot(a, b) / norm;
    // rounding can push a perfect match slightly past 1
    cos.max(-F::one()).min(F::one())
}

/// Binary entropy (in bits) of a two-class distribution
///
/// # Arguments
/// * `pos` - count of the first class
/// * `neg` - count of the second class
#[inline]
pub fn binary_entropy<F: Float>(pos: usize, neg: usize) -> F {
    let total = pos + neg;
    if total == 0 {
        return F::zero();
    }
    let total = F::from(total).unwrap_or_else(F::one);
    [pos, neg].iter().fold(F::zero(), |acc, &count| {
        if count == 0 {
            return acc;
        }
        let p = F::from(count).unwrap_or_else(F::zero) / total;
        acc - p * p.log2()
    })
}
