//! One detection run: normalize, fit once, compare pairs in parallel, merge.
//!
//! Pairs are independent. Each worker returns its own tally and ledger;
//! results are merged in corpus order after the parallel step so the output
//! never depends on completion order.

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::core::corpus::{Corpus, CorpusError, DocumentId};
use crate::core::evidence::{EvidenceLedger, EvidenceRow};
use crate::core::flagging::{PairTally, ThresholdError, Thresholds, flag_pair};
use crate::core::normalize::Document;
use crate::core::similarity::compare;
use crate::core::vectorize::CorpusVectorSpace;
use crate::core::verdict::{Aggregate, Verdict};

#[derive(Debug, thiserror::Error)]
pub enum EngineError
{
    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error("invalid thresholds: {0}")]
    Thresholds(#[from] ThresholdError),

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Result of comparing the target with one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct PairOutcome
{
    pub candidate: DocumentId,
    pub tally: PairTally,
    pub score: f64,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct RunReport
{
    pub verdict: Verdict,
    /// Exploded evidence rows (a single placeholder row when empty)
    pub evidence: Vec<EvidenceRow>,
    /// Per-candidate outcomes in corpus order
    pub pairs: Vec<PairOutcome>,
    pub ledger: EvidenceLedger,
}

#[derive(Debug, Clone, Default)]
pub struct Engine
{
    thresholds: Thresholds,
    threads: usize,
}

impl Engine
{
    pub fn new(thresholds: Thresholds) -> Self
    {
        Self { thresholds, threads: 0 }
    }

    /// Worker count for the run; 0 uses the global rayon pool.
    pub fn with_threads(
        mut self,
        threads: usize,
    ) -> Self
    {
        self.threads = threads;
        self
    }

    pub fn thresholds(&self) -> &Thresholds
    {
        &self.thresholds
    }

    /// Number of candidates `target` will be compared against.
    pub fn candidate_count(
        corpus: &Corpus,
        target: &DocumentId,
    ) -> usize
    {
        corpus
            .records()
            .iter()
            .filter(|r| !r.id.same_story(target))
            .count()
    }

    pub fn run(
        &self,
        corpus: &Corpus,
        target: &DocumentId,
    ) -> Result<RunReport, EngineError>
    {
        self.run_observed(corpus, target, |_| {})
    }

    /// Review the record at `index` (e.g. the final upload) rather than
    /// looking it up by id.
    pub fn run_at(
        &self,
        corpus: &Corpus,
        index: usize,
    ) -> Result<RunReport, EngineError>
    {
        self.run_observed_at(corpus, index, |_| {})
    }

    /// Like [`Engine::run`], calling `on_pair` as each candidate finishes
    /// (from worker threads, in no particular order).
    pub fn run_observed<F>(
        &self,
        corpus: &Corpus,
        target: &DocumentId,
        on_pair: F,
    ) -> Result<RunReport, EngineError>
    where
        F: Fn(&DocumentId) + Sync,
    {
        let index = corpus
            .position(target)
            .ok_or_else(|| CorpusError::TargetNotFound(target.clone()))?;

        self.run_observed_at(corpus, index, on_pair)
    }

    #[instrument(skip_all, fields(index = index, records = corpus.len()))]
    pub fn run_observed_at<F>(
        &self,
        corpus: &Corpus,
        index: usize,
        on_pair: F,
    ) -> Result<RunReport, EngineError>
    where
        F: Fn(&DocumentId) + Sync,
    {
        self.thresholds
            .validate()?;

        if index >= corpus.len()
        {
            return Err(CorpusError::IndexOutOfRange { index, len: corpus.len() }.into());
        }

        if self.threads > 0
        {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .build()?;
            Ok(pool.install(|| self.detect(corpus, index, &on_pair)))
        }
        else
        {
            Ok(self.detect(corpus, index, &on_pair))
        }
    }

    fn detect<F>(
        &self,
        corpus: &Corpus,
        target_idx: usize,
        on_pair: &F,
    ) -> RunReport
    where
        F: Fn(&DocumentId) + Sync,
    {
        // 1) Normalize every record
        let documents: Vec<Document> = corpus
            .records()
            .par_iter()
            .map(Document::from_record)
            .collect();

        // 2) Fit the shared space once, then project every document
        let space = CorpusVectorSpace::fit(&documents);
        let encoded: Vec<_> = documents
            .par_iter()
            .map(|d| space.encode(d))
            .collect();

        debug!(
            vocabulary = space
                .tfidf
                .len(),
            words = space
                .words
                .len(),
            "vector space fit"
        );

        let target = &documents[target_idx];
        let target_vecs = &encoded[target_idx];

        // 3) Candidates: every chapter of every other story
        let candidates: Vec<usize> = (0..documents.len())
            .filter(|&j| {
                !documents[j]
                    .id
                    .same_story(&target.id)
            })
            .collect();

        // 4) Compare pairs in parallel; collect keeps corpus order
        let results: Vec<(PairOutcome, EvidenceLedger)> = candidates
            .par_iter()
            .map(|&j| {
                let candidate = &documents[j];
                let matrices = compare(target_vecs, &encoded[j]);
                let (tally, ledger) = flag_pair(target, candidate, &matrices, &self.thresholds);

                debug!(candidate = %candidate.id, ?tally, score = tally.score(), "pair compared");
                on_pair(&candidate.id);

                let outcome =
                    PairOutcome { candidate: candidate.id.clone(), tally, score: tally.score() };
                (outcome, ledger)
            })
            .collect();

        // 5) Merge in corpus order
        let mut aggregate = Aggregate::default();
        let mut ledger = EvidenceLedger::default();
        let mut pairs = Vec::with_capacity(results.len());

        for (outcome, pair_ledger) in results
        {
            aggregate.observe(&outcome.candidate, outcome.score);
            ledger.merge(pair_ledger);
            pairs.push(outcome);
        }

        let verdict =
            Verdict::build(&target.id, &aggregate, &ledger, self.thresholds.reject);
        let evidence = ledger.rows(&target.id);

        info!(
            score = verdict.score,
            decision = %verdict.decision,
            candidates = pairs.len(),
            evidence_rows = evidence.len(),
            "verdict ready"
        );

        RunReport { verdict, evidence, pairs, ledger }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::corpus::DocumentRecord;
    use crate::core::verdict::Decision;

    fn corpus(records: &[(&str, &str, &str)]) -> Corpus
    {
        Corpus::from_records(
            records
                .iter()
                .map(|(s, c, b)| DocumentRecord::new(*s, *c, *b))
                .collect(),
        )
    }

    #[test]
    fn identical_sentence_rejects_with_full_score()
    {
        let corpus = corpus(&[("other", "1", "The quick brown fox."), ("mine", "1", "The quick brown fox.")]);
        let target = DocumentId::new("mine", "1");

        let report = Engine::default()
            .run(&corpus, &target)
            .unwrap();

        assert_eq!(report.pairs[0].tally, PairTally { plag: 0, total_lines: 1, hs: 1, cp: 1 });
        assert_eq!(report.verdict.score, 100.0);
        assert_eq!(report.verdict.decision, Decision::Reject);
        assert_eq!(report.evidence.len(), 1);
        assert_eq!(report.evidence[0].sim_line, "the quick brown fox");
    }

    #[test]
    fn same_story_chapters_are_skipped()
    {
        let corpus = corpus(&[("mine", "1", "Exactly the same words."), ("mine", "2", "Exactly the same words.")]);
        let report = Engine::default()
            .run(&corpus, &DocumentId::new("mine", "2"))
            .unwrap();

        assert!(report.pairs.is_empty());
        assert_eq!(report.verdict.score, 0.0);
        assert_eq!(report.verdict.decision, Decision::Accept);
        assert_eq!(report.evidence[0].opp_fic_id, "-");
    }

    #[test]
    fn unknown_target_fails_before_comparing()
    {
        let corpus = corpus(&[("a", "1", "Text.")]);
        let err = Engine::default()
            .run(&corpus, &DocumentId::new("zz", "9"))
            .unwrap_err();

        assert!(matches!(err, EngineError::Corpus(CorpusError::TargetNotFound(_))));
    }

    #[test]
    fn reupload_is_reviewed_not_the_stale_copy()
    {
        let corpus = corpus(&[
            ("mine", "1", "Rivers run toward distant seas."),
            ("other", "1", "The quick brown fox jumps."),
            ("mine", "1", "The quick brown fox jumps."),
        ]);

        let by_index = Engine::default()
            .run_at(&corpus, 2)
            .unwrap();
        assert_eq!(by_index.verdict.score, 100.0);
        assert_eq!(by_index.pairs.len(), 1);

        let by_id = Engine::default()
            .run(&corpus, &DocumentId::new("mine", "1"))
            .unwrap();
        assert_eq!(by_id.verdict, by_index.verdict);
    }

    #[test]
    fn index_past_the_end_is_rejected()
    {
        let corpus = corpus(&[("a", "1", "Text.")]);

        assert!(matches!(
            Engine::default().run_at(&corpus, 1),
            Err(EngineError::Corpus(CorpusError::IndexOutOfRange { index: 1, len: 1 }))
        ));
    }

    #[test]
    fn invalid_thresholds_fail_fast()
    {
        let corpus = corpus(&[("a", "1", "Text.")]);
        let engine = Engine::new(Thresholds { reject: -1.0, ..Default::default() });

        assert!(matches!(
            engine.run(&corpus, &DocumentId::new("a", "1")),
            Err(EngineError::Thresholds(_))
        ));
    }

    #[test]
    fn dedicated_pool_gives_same_result()
    {
        let corpus = corpus(&[
            ("a", "1", "The cat sat on the mat. It was warm."),
            ("b", "1", "A dog barked loudly. The cat sat on the mat."),
            ("t", "1", "The cat sat on the mat. Nothing else happened."),
        ]);
        let target = DocumentId::new("t", "1");

        let shared = Engine::default()
            .run(&corpus, &target)
            .unwrap();
        let pooled = Engine::default()
            .with_threads(2)
            .run(&corpus, &target)
            .unwrap();

        assert_eq!(shared.verdict, pooled.verdict);
        assert_eq!(shared.evidence, pooled.evidence);
        assert_eq!(shared.pairs, pooled.pairs);
    }
}
