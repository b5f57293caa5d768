//! Corpus-wide encoders fit once per run.
//!
//! Two encoders share the same fitted input (every cleaned line of every
//! document in the run, target included):
//! - [`TfidfSpace`] produces L2-normalized TF-IDF vectors for lexical
//!   comparison.
//! - [`WordIndex`] maps words to integer ids for structural comparison.
//!
//! Vectors from different fitted spaces are never compared; a changed
//! corpus means a fresh [`CorpusVectorSpace`].

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::normalize::Document;

/// Terms are runs of two or more word characters.
static TERM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("term pattern is a valid regex"));

/// Characters the word index treats as separators.
const WORD_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// Sparse vector with entries sorted by term index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector
{
    entries: Vec<(u32, f64)>,
}

impl SparseVector
{
    /// Build from unsorted entries; duplicate indices are summed.
    pub fn from_entries(mut entries: Vec<(u32, f64)>) -> Self
    {
        entries.sort_by_key(|&(idx, _)| idx);

        let mut merged: Vec<(u32, f64)> = Vec::with_capacity(entries.len());
        for (idx, w) in entries
        {
            match merged.last_mut()
            {
                Some((last, acc)) if *last == idx => *acc += w,
                _ => merged.push((idx, w)),
            }
        }

        Self { entries: merged }
    }

    pub fn entries(&self) -> &[(u32, f64)]
    {
        &self.entries
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries
            .is_empty()
    }

    pub fn norm(&self) -> f64
    {
        self.entries
            .iter()
            .map(|&(_, w)| w * w)
            .sum::<f64>()
            .sqrt()
    }

    /// Merge-join dot product over the shared indices.
    pub fn dot(
        &self,
        other: &SparseVector,
    ) -> f64
    {
        let (a, b) = (&self.entries, &other.entries);
        let (mut i, mut j) = (0, 0);
        let mut acc = 0.0;

        while i < a.len() && j < b.len()
        {
            match a[i]
                .0
                .cmp(&b[j].0)
            {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal =>
                {
                    acc += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }

        acc
    }

    fn normalized(self) -> Self
    {
        let norm = self.norm();
        if norm <= f64::EPSILON
        {
            return self;
        }

        Self {
            entries: self
                .entries
                .into_iter()
                .map(|(idx, w)| (idx, w / norm))
                .collect(),
        }
    }
}

/// TF-IDF vocabulary with smoothed inverse document frequencies.
///
/// Each fitted line counts as one document for IDF purposes:
/// `idf(t) = ln((1 + n) / (1 + df(t))) + 1`.
#[derive(Debug, Clone, Default)]
pub struct TfidfSpace
{
    vocabulary: HashMap<String, u32>,
    idf: Vec<f64>,
}

impl TfidfSpace
{
    pub fn fit<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut n_lines = 0usize;
        let mut df: BTreeMap<String, usize> = BTreeMap::new();

        for line in lines
        {
            n_lines += 1;

            let mut seen: Vec<&str> = terms(line).collect();
            seen.sort_unstable();
            seen.dedup();

            for term in seen
            {
                *df.entry(term.to_string())
                    .or_insert(0) += 1;
            }
        }

        // Lexicographic term order gives stable indices
        let n = n_lines as f64;
        let mut vocabulary = HashMap::with_capacity(df.len());
        let mut idf = Vec::with_capacity(df.len());

        for (idx, (term, count)) in df
            .into_iter()
            .enumerate()
        {
            vocabulary.insert(term, idx as u32);
            idf.push(((1.0 + n) / (1.0 + count as f64)).ln() + 1.0);
        }

        Self { vocabulary, idf }
    }

    /// Vectorize a line; terms outside the vocabulary are ignored.
    pub fn transform(
        &self,
        line: &str,
    ) -> SparseVector
    {
        let entries: Vec<(u32, f64)> = terms(line)
            .filter_map(|t| {
                self.vocabulary
                    .get(t)
                    .map(|&idx| (idx, self.idf[idx as usize]))
            })
            .collect();

        // Repeated terms sum their idf, i.e. tf * idf
        SparseVector::from_entries(entries).normalized()
    }

    pub fn len(&self) -> usize
    {
        self.idf
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.idf
            .is_empty()
    }

    pub fn idf(
        &self,
        term: &str,
    ) -> Option<f64>
    {
        self.vocabulary
            .get(term)
            .map(|&idx| self.idf[idx as usize])
    }
}

fn terms(line: &str) -> impl Iterator<Item = &str>
{
    TERM_PATTERN
        .find_iter(line)
        .map(|m| m.as_str())
}

/// Word-to-id mapping for structural comparison.
///
/// Ids start at 1 and follow descending corpus frequency; ties keep the
/// order in which words were first seen.
#[derive(Debug, Clone, Default)]
pub struct WordIndex
{
    index: HashMap<String, u32>,
}

impl WordIndex
{
    pub fn fit<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        // word -> (count, first seen position)
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

        for line in lines
        {
            for word in words(line)
            {
                let next = counts.len();
                counts
                    .entry(word.to_string())
                    .or_insert((0, next))
                    .0 += 1;
            }
        }

        let mut ranked: Vec<(String, (usize, usize))> = counts
            .into_iter()
            .collect();
        ranked.sort_by(|a, b| {
            b.1.0
                .cmp(&a.1.0)
                .then(a.1.1.cmp(&b.1.1))
        });

        let index = ranked
            .into_iter()
            .enumerate()
            .map(|(rank, (word, _))| (word, rank as u32 + 1))
            .collect();

        Self { index }
    }

    /// Map a line to ids; unknown words are dropped rather than rejected.
    pub fn encode(
        &self,
        line: &str,
    ) -> Vec<u32>
    {
        words(line)
            .filter_map(|w| {
                self.index
                    .get(w)
                    .copied()
            })
            .collect()
    }

    pub fn id(
        &self,
        word: &str,
    ) -> Option<u32>
    {
        self.index
            .get(word)
            .copied()
    }

    pub fn len(&self) -> usize
    {
        self.index
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.index
            .is_empty()
    }
}

fn words(line: &str) -> impl Iterator<Item = &str>
{
    line.split(|c: char| c == ' ' || WORD_FILTERS.contains(c))
        .filter(|w| !w.is_empty())
}

/// A document projected into the fitted space.
#[derive(Debug, Clone, Default)]
pub struct EncodedDocument
{
    /// One TF-IDF vector per sentence
    pub vectors: Vec<SparseVector>,
    /// Token id sequence per sentence
    pub token_ids: Vec<Vec<u32>>,
    /// Sorted, de-duplicated token ids per sentence
    pub token_sets: Vec<Vec<u32>>,
}

impl EncodedDocument
{
    pub fn len(&self) -> usize
    {
        self.vectors
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.vectors
            .is_empty()
    }
}

/// Both encoders, fit together over one run's corpus.
#[derive(Debug, Clone, Default)]
pub struct CorpusVectorSpace
{
    pub tfidf: TfidfSpace,
    pub words: WordIndex,
}

impl CorpusVectorSpace
{
    /// Fit over the flattened lines of every document.
    pub fn fit(documents: &[Document]) -> Self
    {
        let flat = || {
            documents
                .iter()
                .flat_map(|d| d.lines())
        };

        Self { tfidf: TfidfSpace::fit(flat()), words: WordIndex::fit(flat()) }
    }

    pub fn encode(
        &self,
        document: &Document,
    ) -> EncodedDocument
    {
        let mut out = EncodedDocument::default();

        for line in document.lines()
        {
            let ids = self
                .words
                .encode(line);

            let mut set = ids.clone();
            set.sort_unstable();
            set.dedup();

            out.vectors
                .push(
                    self.tfidf
                        .transform(line),
                );
            out.token_ids
                .push(ids);
            out.token_sets
                .push(set);
        }

        out
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::corpus::DocumentRecord;

    #[test]
    fn single_letter_words_are_not_terms()
    {
        let space = TfidfSpace::fit(["a cat is here", "i am a dog"]);
        assert!(space.idf("a").is_none());
        assert!(space.idf("i").is_none());
        assert!(space.idf("cat").is_some());
        // cat, is, here, am, dog
        assert_eq!(space.len(), 5);
    }

    #[test]
    fn smoothed_idf_matches_formula()
    {
        let space = TfidfSpace::fit(["red fox", "red dog", "blue cat"]);

        // red appears in 2 of 3 lines
        let expected = (4.0f64 / 3.0).ln() + 1.0;
        assert!((space.idf("red").unwrap() - expected).abs() < 1e-12);

        // fox appears in 1 of 3 lines
        let expected = (4.0f64 / 2.0).ln() + 1.0;
        assert!((space.idf("fox").unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn transform_is_unit_length_and_ignores_unknown_terms()
    {
        let space = TfidfSpace::fit(["red fox runs", "blue dog sleeps"]);

        let v = space.transform("red red fox");
        assert!((v.norm() - 1.0).abs() < 1e-12);
        assert_eq!(v.entries().len(), 2);

        assert!(space
            .transform("unseen words only")
            .is_empty());
    }

    #[test]
    fn word_index_orders_by_frequency_then_first_seen()
    {
        let index = WordIndex::fit(["b a", "a c", "c a"]);
        assert_eq!(index.id("a"), Some(1));
        assert_eq!(index.id("b"), Some(3));
        assert_eq!(index.id("c"), Some(2));
    }

    #[test]
    fn word_index_drops_unknown_words()
    {
        let index = WordIndex::fit(["the fox"]);
        assert_eq!(index.encode("the wolf"), vec![index.id("the").unwrap()]);
        assert!(index
            .encode("nothing known")
            .is_empty());
    }

    #[test]
    fn word_filters_split_tokens()
    {
        let index = WordIndex::fit(["fox&dog a+b"]);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn encode_keeps_sentence_alignment()
    {
        let docs = vec![
            Document::from_record(&DocumentRecord::new("s1", "c1", "The fox ran. ... The dog sat.")),
            Document::from_record(&DocumentRecord::new("s2", "c1", "")),
        ];
        let space = CorpusVectorSpace::fit(&docs);

        let encoded = space.encode(&docs[0]);
        assert_eq!(encoded.len(), docs[0].len());
        assert_eq!(encoded.token_sets.len(), docs[0].len());

        let empty = space.encode(&docs[1]);
        assert_eq!(empty.len(), 1);
        assert!(empty.vectors[0].is_empty());
        assert!(empty.token_ids[0].is_empty());
    }

    #[test]
    fn dot_of_disjoint_vectors_is_zero()
    {
        let a = SparseVector::from_entries(vec![(0, 1.0), (2, 1.0)]);
        let b = SparseVector::from_entries(vec![(1, 1.0), (3, 1.0)]);
        assert_eq!(a.dot(&b), 0.0);
    }
}
