//! Line-level evidence of overlap between documents.
//!
//! The ledger is a flat table keyed by (origin document, origin line,
//! opposing document). Each key holds the opposing lines judged to match,
//! de-duplicated on insertion and kept in insertion order. Ledgers built by
//! independent workers merge by key union.

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::core::corpus::DocumentId;

/// Sentinel used in the placeholder row when nothing matched
pub const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EvidenceKey
{
    pub origin: DocumentId,
    pub line: String,
    pub opposing: DocumentId,
}

/// One exploded evidence row, ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRow
{
    pub ori_fic_id: String,
    pub ori_chap_id: String,
    pub ori_line: String,
    pub opp_fic_id: String,
    pub opp_chap_id: String,
    pub sim_line: String,
}

impl EvidenceRow
{
    /// Row emitted for a target with no recorded evidence.
    pub fn placeholder(target: &DocumentId) -> Self
    {
        Self {
            ori_fic_id: target
                .story
                .clone(),
            ori_chap_id: target
                .chapter
                .clone(),
            ori_line: PLACEHOLDER.to_string(),
            opp_fic_id: PLACEHOLDER.to_string(),
            opp_chap_id: PLACEHOLDER.to_string(),
            sim_line: PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EvidenceLedger
{
    entries: IndexMap<EvidenceKey, IndexSet<String>>,
}

impl EvidenceLedger
{
    /// Record that `line` of `origin` matches each of `matched` in `opposing`.
    pub fn record<I, S>(
        &mut self,
        origin: &DocumentId,
        line: &str,
        opposing: &DocumentId,
        matched: I,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = EvidenceKey {
            origin: origin.clone(),
            line: line.to_string(),
            opposing: opposing.clone(),
        };

        let slot = self
            .entries
            .entry(key)
            .or_default();

        for m in matched
        {
            slot.insert(m.into());
        }
    }

    /// Union another ledger into this one, keeping this ledger's order first.
    pub fn merge(
        &mut self,
        other: EvidenceLedger,
    )
    {
        for (key, lines) in other.entries
        {
            self.entries
                .entry(key)
                .or_default()
                .extend(lines);
        }
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries
            .is_empty()
    }

    /// Number of distinct (origin, line, opposing) keys.
    pub fn len(&self) -> usize
    {
        self.entries
            .len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EvidenceKey, &IndexSet<String>)>
    {
        self.entries
            .iter()
    }

    pub fn matches(
        &self,
        key: &EvidenceKey,
    ) -> Option<&IndexSet<String>>
    {
        self.entries
            .get(key)
    }

    /// Opposing story ids in first-seen order, without repeats.
    pub fn opposing_stories(&self) -> Vec<String>
    {
        self.entries
            .keys()
            .map(|k| {
                k.opposing
                    .story
                    .clone()
            })
            .unique()
            .collect()
    }

    /// Explode into one row per opposing line; a placeholder row stands in
    /// for an empty ledger.
    pub fn rows(
        &self,
        target: &DocumentId,
    ) -> Vec<EvidenceRow>
    {
        if self.is_empty()
        {
            return vec![EvidenceRow::placeholder(target)];
        }

        self.entries
            .iter()
            .flat_map(|(key, lines)| {
                lines
                    .iter()
                    .map(move |sim| EvidenceRow {
                        ori_fic_id: key
                            .origin
                            .story
                            .clone(),
                        ori_chap_id: key
                            .origin
                            .chapter
                            .clone(),
                        ori_line: key
                            .line
                            .clone(),
                        opp_fic_id: key
                            .opposing
                            .story
                            .clone(),
                        opp_chap_id: key
                            .opposing
                            .chapter
                            .clone(),
                        sim_line: sim.clone(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn ids() -> (DocumentId, DocumentId, DocumentId)
    {
        (DocumentId::new("t", "1"), DocumentId::new("a", "1"), DocumentId::new("b", "2"))
    }

    #[test]
    fn record_deduplicates_and_keeps_order()
    {
        let (t, a, _) = ids();
        let mut ledger = EvidenceLedger::default();

        ledger.record(&t, "line one", &a, ["x", "y"]);
        ledger.record(&t, "line one", &a, ["y", "z", "x"]);

        let rows = ledger.rows(&t);
        let sims: Vec<&str> = rows
            .iter()
            .map(|r| r.sim_line.as_str())
            .collect();
        assert_eq!(sims, vec!["x", "y", "z"]);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn merge_unions_entries()
    {
        let (t, a, b) = ids();
        let mut left = EvidenceLedger::default();
        left.record(&t, "l", &a, ["x"]);

        let mut right = EvidenceLedger::default();
        right.record(&t, "l", &a, ["x", "w"]);
        right.record(&t, "l", &b, ["v"]);

        left.merge(right);

        assert_eq!(left.len(), 2);
        assert_eq!(left.rows(&t).len(), 3);
        assert_eq!(left.opposing_stories(), vec!["a", "b"]);
    }

    #[test]
    fn empty_ledger_explodes_to_placeholder()
    {
        let (t, _, _) = ids();
        let rows = EvidenceLedger::default().rows(&t);

        assert_eq!(rows, vec![EvidenceRow::placeholder(&t)]);
        assert_eq!(rows[0].ori_fic_id, "t");
        assert_eq!(rows[0].sim_line, PLACEHOLDER);
    }

    #[test]
    fn one_line_with_three_matches_gives_three_rows()
    {
        let (t, a, _) = ids();
        let mut ledger = EvidenceLedger::default();
        ledger.record(&t, "origin", &a, ["m1", "m2", "m3"]);

        let rows = ledger.rows(&t);
        assert_eq!(rows.len(), 3);
        assert!(rows
            .iter()
            .all(|r| r.ori_line == "origin" && r.opp_fic_id == "a"));
    }
}
