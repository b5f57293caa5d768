//! Property tests for similarity bounds, determinism, self-exclusion and
//! max aggregation.

use plagscan::core::normalize::normalize;
use plagscan::core::similarity::jaccard;
use plagscan::core::verdict::Aggregate;
use plagscan::{DocumentId, DocumentRecord, Engine};
use plagscan::Corpus;
use proptest::prelude::*;

const TERMINATORS: &[&str] = &[".", "!", "?"];

const WORDS: &[&str] =
    &["the", "fox", "dog", "ran", "sat", "mat", "cat", "home", "river", "old", "a", "slowly"];

/// Sorted, de-duplicated id set
fn id_set() -> impl Strategy<Value = Vec<u32>>
{
    prop::collection::btree_set(0u32..40, 0..12).prop_map(|s| s.into_iter().collect())
}

/// 1-4 lower-case sentences, each with its own terminator
fn sentences() -> impl Strategy<Value = Vec<String>>
{
    let words = prop::collection::vec(prop::sample::select(WORDS), 1..7).prop_map(|w| w.join(" "));
    let sentence = (words, prop::sample::select(TERMINATORS)).prop_map(|(w, t)| format!("{w}{t}"));
    prop::collection::vec(sentence, 1..5)
}

/// A chapter body built from [`sentences`]
fn body() -> impl Strategy<Value = String>
{
    sentences().prop_map(|s| s.join(" "))
}

/// 2-5 records over 3 stories; the last one is the target
fn corpus() -> impl Strategy<Value = Corpus>
{
    prop::collection::vec((0u8..3, body()), 2..6).prop_map(|rows| {
        Corpus::from_records(
            rows.into_iter()
                .enumerate()
                .map(|(i, (story, text))| {
                    DocumentRecord::new(format!("s{story}"), format!("c{i}"), text)
                })
                .collect(),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn jaccard_is_bounded_and_symmetric(a in id_set(), b in id_set())
    {
        let ab = jaccard(&a, &b);
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert_eq!(ab, jaccard(&b, &a));

        if !a.is_empty()
        {
            prop_assert_eq!(jaccard(&a, &a), 1.0);
        }
    }

    #[test]
    fn every_terminator_ends_a_sentence(parts in sentences())
    {
        let body = parts.join(" ");
        let got = normalize(&body);

        prop_assert_eq!(got.len(), parts.len());
        for (sentence, part) in got.iter().zip(&parts)
        {
            prop_assert_eq!(&sentence.line, &part[..part.len() - 1]);
        }
    }

    #[test]
    fn runs_are_deterministic_and_never_self_referencing(corpus in corpus())
    {
        let index = corpus.last_index().unwrap();
        let target: DocumentId = corpus.last_id().unwrap();

        let first = Engine::default().run_at(&corpus, index).unwrap();
        let second = Engine::default().with_threads(2).run(&corpus, &target).unwrap();

        prop_assert_eq!(&first.verdict, &second.verdict);
        prop_assert_eq!(&first.evidence, &second.evidence);

        for row in &first.evidence
        {
            prop_assert_ne!(&row.opp_fic_id, &target.story);
        }

        // Aggregate equals the best pair score
        let best = first.pairs.iter().map(|p| p.score).fold(0.0, f64::max);
        prop_assert_eq!(first.verdict.score, plagscan::core::verdict::to_percent(best));
        prop_assert!((0.0..=100.0).contains(&first.verdict.score));
    }

    #[test]
    fn aggregate_ignores_observation_order(scores in prop::collection::vec(0.0f64..1.0, 0..10))
    {
        let ids: Vec<DocumentId> = (0..scores.len())
            .map(|i| DocumentId::new(format!("s{i}"), "1"))
            .collect();

        let mut forward = Aggregate::default();
        for (id, s) in ids.iter().zip(&scores)
        {
            forward.observe(id, *s);
        }

        let mut backward = Aggregate::default();
        for (id, s) in ids.iter().zip(&scores).rev()
        {
            backward.observe(id, *s);
        }

        let max = scores.iter().copied().fold(0.0, f64::max);
        prop_assert_eq!(forward.score(), max);
        prop_assert_eq!(backward.score(), max);
    }
}
