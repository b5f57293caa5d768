//! Pairwise sentence similarity between a target and one candidate.
//!
//! Lexical similarity is the cosine of TF-IDF vectors; structural
//! similarity is the Jaccard index of token-id sets. Both land in `[0, 1]`.

use crate::core::vectorize::{EncodedDocument, SparseVector};

/// Dense row-major matrix of scores: rows are target sentences,
/// columns are candidate sentences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityMatrix
{
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix
{
    /// Fill a `rows × cols` matrix from a scoring function.
    pub fn build<F>(
        rows: usize,
        cols: usize,
        mut score: F,
    ) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut values = Vec::with_capacity(rows * cols);
        for i in 0..rows
        {
            for j in 0..cols
            {
                values.push(score(i, j));
            }
        }

        Self { rows, cols, values }
    }

    pub fn rows(&self) -> usize
    {
        self.rows
    }

    pub fn cols(&self) -> usize
    {
        self.cols
    }

    pub fn is_empty(&self) -> bool
    {
        self.values
            .is_empty()
    }

    pub fn get(
        &self,
        i: usize,
        j: usize,
    ) -> Option<f64>
    {
        (i < self.rows && j < self.cols).then(|| self.values[i * self.cols + j])
    }

    /// Scores of target sentence `i` against every candidate sentence.
    pub fn row(
        &self,
        i: usize,
    ) -> &[f64]
    {
        if i >= self.rows
        {
            return &[];
        }
        &self.values[i * self.cols..(i + 1) * self.cols]
    }
}

/// Cosine similarity of two sparse vectors; zero-magnitude gives 0.
pub fn cosine(
    a: &SparseVector,
    b: &SparseVector,
) -> f64
{
    let denom = a.norm() * b.norm();
    if denom < f64::EPSILON
    {
        return 0.0;
    }

    (a.dot(b) / denom).clamp(0.0, 1.0)
}

/// Jaccard index of two sorted, de-duplicated id sets.
///
/// Two empty sets score 0, not 1: an empty sentence matches nothing.
pub fn jaccard(
    a: &[u32],
    b: &[u32],
) -> f64
{
    let (mut i, mut j) = (0, 0);
    let mut shared = 0usize;

    while i < a.len() && j < b.len()
    {
        match a[i].cmp(&b[j])
        {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal =>
            {
                shared += 1;
                i += 1;
                j += 1;
            }
        }
    }

    let union = a.len() + b.len() - shared;
    if union == 0
    {
        return 0.0;
    }

    shared as f64 / union as f64
}

/// Both matrices for one (target, candidate) pair.
#[derive(Debug, Clone, Default)]
pub struct PairMatrices
{
    pub lexical: SimilarityMatrix,
    pub structural: SimilarityMatrix,
}

pub fn lexical_matrix(
    target: &EncodedDocument,
    candidate: &EncodedDocument,
) -> SimilarityMatrix
{
    SimilarityMatrix::build(target.len(), candidate.len(), |i, j| {
        cosine(&target.vectors[i], &candidate.vectors[j])
    })
}

pub fn structural_matrix(
    target: &EncodedDocument,
    candidate: &EncodedDocument,
) -> SimilarityMatrix
{
    SimilarityMatrix::build(target.len(), candidate.len(), |i, j| {
        jaccard(&target.token_sets[i], &candidate.token_sets[j])
    })
}

/// Compare every target sentence with every candidate sentence.
pub fn compare(
    target: &EncodedDocument,
    candidate: &EncodedDocument,
) -> PairMatrices
{
    PairMatrices {
        lexical: lexical_matrix(target, candidate),
        structural: structural_matrix(target, candidate),
    }
}
