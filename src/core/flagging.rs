//! Threshold classification of similarity rows and per-pair tallies.
//!
//! Each target sentence is classified once per candidate into a
//! [`RowFinding`]: an exact or soft hit (or a miss) on each metric. Exact
//! and soft are exclusive within a metric. A soft lexical hit only counts
//! when a soft structural hit corroborates it.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::evidence::EvidenceLedger;
use crate::core::normalize::Document;
use crate::core::similarity::PairMatrices;

/// Policy thresholds for classification and the final verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds
{
    /// Lexical scores strictly above this are soft matches
    pub lexical_soft: f64,
    /// Lexical scores at or above this are exact matches
    pub lexical_exact: f64,
    /// Structural scores strictly above this are soft matches
    pub structural_soft: f64,
    /// Structural scores at or above this are exact matches
    pub structural_exact: f64,
    /// Aggregate scores at or above this reject the submission
    pub reject: f64,
}

impl Default for Thresholds
{
    fn default() -> Self
    {
        Self {
            lexical_soft: 0.35,
            lexical_exact: 0.9999,
            structural_soft: 0.7,
            structural_exact: 0.9999,
            reject: 0.30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThresholdError
{
    #[error("threshold `{name}` must lie in [0, 1], got {value}")]
    OutOfRange
    {
        name: &'static str, value: f64
    },

    #[error("soft threshold `{soft}` must be below exact threshold `{exact}`")]
    Inverted
    {
        soft: &'static str, exact: &'static str
    },
}

impl Thresholds
{
    pub fn validate(&self) -> Result<(), ThresholdError>
    {
        let all = [
            ("lexical_soft", self.lexical_soft),
            ("lexical_exact", self.lexical_exact),
            ("structural_soft", self.structural_soft),
            ("structural_exact", self.structural_exact),
            ("reject", self.reject),
        ];

        for (name, value) in all
        {
            // NaN fails the range check too
            if !(0.0..=1.0).contains(&value)
            {
                return Err(ThresholdError::OutOfRange { name, value });
            }
        }

        if self.lexical_soft >= self.lexical_exact
        {
            return Err(ThresholdError::Inverted { soft: "lexical_soft", exact: "lexical_exact" });
        }
        if self.structural_soft >= self.structural_exact
        {
            return Err(ThresholdError::Inverted {
                soft: "structural_soft",
                exact: "structural_exact",
            });
        }

        Ok(())
    }
}

/// Classification of one metric's row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MetricHit
{
    /// Candidate indices at or above the exact threshold
    Exact(Vec<usize>),
    /// Candidate indices strictly between the soft and exact thresholds
    Soft(Vec<usize>),
    #[default]
    Miss,
}

impl MetricHit
{
    /// Exact wins over soft; soft is only looked at when nothing is exact.
    pub fn scan(
        row: &[f64],
        soft: f64,
        exact: f64,
    ) -> Self
    {
        let exact_hits: Vec<usize> = indices(row, |v| v >= exact);
        if !exact_hits.is_empty()
        {
            return Self::Exact(exact_hits);
        }

        let soft_hits: Vec<usize> = indices(row, |v| v > soft && v < exact);
        if !soft_hits.is_empty()
        {
            return Self::Soft(soft_hits);
        }

        Self::Miss
    }

    pub fn is_exact(&self) -> bool
    {
        matches!(self, Self::Exact(_))
    }

    pub fn is_soft(&self) -> bool
    {
        matches!(self, Self::Soft(_))
    }
}

fn indices(
    row: &[f64],
    keep: impl Fn(f64) -> bool,
) -> Vec<usize>
{
    row.iter()
        .enumerate()
        .filter(|&(_, &v)| keep(v))
        .map(|(j, _)| j)
        .collect()
}

/// Both metrics' findings for one target sentence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowFinding
{
    pub lexical: MetricHit,
    pub structural: MetricHit,
}

impl RowFinding
{
    pub fn classify(
        lexical_row: &[f64],
        structural_row: &[f64],
        thresholds: &Thresholds,
    ) -> Self
    {
        Self {
            lexical: MetricHit::scan(lexical_row, thresholds.lexical_soft, thresholds.lexical_exact),
            structural: MetricHit::scan(
                structural_row,
                thresholds.structural_soft,
                thresholds.structural_exact,
            ),
        }
    }

    /// Lexical exact match (`hs`).
    pub fn high_similarity(&self) -> bool
    {
        self.lexical
            .is_exact()
    }

    /// Structural exact match (`cp`).
    pub fn structural_copy(&self) -> bool
    {
        self.structural
            .is_exact()
    }

    /// Soft lexical corroborated by soft structural (`plag`).
    pub fn combined_soft(&self) -> bool
    {
        self.lexical
            .is_soft()
            && self
                .structural
                .is_soft()
    }

    /// Candidate sentence indices to record as evidence, in recording order.
    pub fn evidence(&self) -> Vec<usize>
    {
        let mut out = Vec::new();

        if let MetricHit::Exact(hits) = &self.lexical
        {
            out.extend(hits);
        }
        if let MetricHit::Exact(hits) = &self.structural
        {
            out.extend(hits);
        }

        if let (MetricHit::Soft(lex), MetricHit::Soft(structural)) =
            (&self.lexical, &self.structural)
        {
            out.extend(structural);
            out.extend(lex);
        }

        out
    }
}

/// Match counters for one (target, candidate) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PairTally
{
    /// Soft lexical + soft structural agreements
    pub plag: usize,
    /// Target sentences evaluated
    pub total_lines: usize,
    /// Lexical exact matches
    pub hs: usize,
    /// Structural exact matches
    pub cp: usize,
}

impl PairTally
{
    pub fn absorb(
        &mut self,
        finding: &RowFinding,
    )
    {
        self.total_lines += 1;
        self.hs += finding.high_similarity() as usize;
        self.cp += finding.structural_copy() as usize;
        self.plag += finding.combined_soft() as usize;
    }

    /// `(plag + (hs + cp) / 2) / total_lines`, or 0 with no lines.
    pub fn score(&self) -> f64
    {
        if self.total_lines == 0
        {
            return 0.0;
        }

        (self.plag as f64 + (self.hs + self.cp) as f64 / 2.0) / self.total_lines as f64
    }
}

/// Classify every target row against one candidate, collecting evidence.
pub fn flag_pair(
    target: &Document,
    candidate: &Document,
    matrices: &PairMatrices,
    thresholds: &Thresholds,
) -> (PairTally, EvidenceLedger)
{
    let mut tally = PairTally::default();
    let mut ledger = EvidenceLedger::default();

    for (i, sentence) in target
        .sentences
        .iter()
        .enumerate()
    {
        let finding = RowFinding::classify(
            matrices
                .lexical
                .row(i),
            matrices
                .structural
                .row(i),
            thresholds,
        );

        trace!(row = i, ?finding, "classified");

        let hits = finding.evidence();
        if !hits.is_empty()
        {
            ledger.record(
                &target.id,
                &sentence.line,
                &candidate.id,
                hits.iter()
                    .filter_map(|&j| {
                        candidate
                            .sentences
                            .get(j)
                    })
                    .map(|s| {
                        s.line
                            .as_str()
                    }),
            );
        }

        tally.absorb(&finding);
    }

    (tally, ledger)
}
