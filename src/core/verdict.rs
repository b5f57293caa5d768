//! Aggregation of pair scores into a publish decision, and the two output
//! payloads (verdict and evidence).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::corpus::DocumentId;
use crate::core::evidence::{EvidenceLedger, EvidenceRow};

pub const REJECT_MESSAGE: &str = "Unfortunately, your plagiarism score has exceeded the maximum \
                                  percentage. Please revise and try again.";
pub const ACCEPT_MESSAGE: &str = "Congratulations, your plagiarism score is within safe \
                                  percentage! You may upload your work!";

/// Publish decision for the target document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision
{
    Accept,
    Reject,
}

impl Decision
{
    /// Wire flag: 1 rejects, 0 accepts.
    pub fn flag(self) -> u8
    {
        match self
        {
            Decision::Accept => 0,
            Decision::Reject => 1,
        }
    }

    pub fn message(self) -> &'static str
    {
        match self
        {
            Decision::Accept => ACCEPT_MESSAGE,
            Decision::Reject => REJECT_MESSAGE,
        }
    }
}

impl std::fmt::Display for Decision
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        match self
        {
            Decision::Accept => write!(f, "accept"),
            Decision::Reject => write!(f, "reject"),
        }
    }
}

/// Running maximum over pair scores.
///
/// The result does not depend on the order pairs are observed in; ties keep
/// the first candidate that reached the maximum.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate
{
    best: f64,
    leader: Option<DocumentId>,
}

impl Aggregate
{
    pub fn observe(
        &mut self,
        candidate: &DocumentId,
        score: f64,
    )
    {
        if score > self.best
        {
            self.best = score;
            self.leader = Some(candidate.clone());
        }
    }

    /// Maximum pair score seen so far (0 with no pairs).
    pub fn score(&self) -> f64
    {
        self.best
    }

    /// Candidate holding the maximum, if any scored above zero.
    pub fn leader(&self) -> Option<&DocumentId>
    {
        self.leader
            .as_ref()
    }
}

/// `round(x * 100, 2)`
pub fn to_percent(score: f64) -> f64
{
    (score * 100.0 * 100.0).round() / 100.0
}

/// Final outcome for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict
{
    pub target: DocumentId,
    /// Aggregate score as a percentage, two decimals
    pub score: f64,
    pub decision: Decision,
    pub message: &'static str,
    /// Opposing story ids that appear in the evidence
    pub opposing: Vec<String>,
}

impl Verdict
{
    pub fn build(
        target: &DocumentId,
        aggregate: &Aggregate,
        ledger: &EvidenceLedger,
        reject_threshold: f64,
    ) -> Self
    {
        let decision = if aggregate.score() >= reject_threshold
        {
            Decision::Reject
        }
        else
        {
            Decision::Accept
        };

        Self {
            target: target.clone(),
            score: to_percent(aggregate.score()),
            decision,
            message: decision.message(),
            opposing: ledger.opposing_stories(),
        }
    }

    pub fn payload(&self) -> VerdictPayload
    {
        VerdictPayload {
            final_plag_score: self.score,
            yes_or_no: self
                .decision
                .flag(),
            verdict: self
                .message
                .to_string(),
            ori_fic_id: self
                .target
                .story
                .clone(),
            opp_fic_id: self
                .opposing
                .clone(),
        }
    }
}

/// Serialized verdict as consumed by the delivery side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictPayload
{
    pub final_plag_score: f64,
    pub yes_or_no: u8,
    pub verdict: String,
    pub ori_fic_id: String,
    pub opp_fic_id: Vec<String>,
}

/// Shape of the evidence table on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceLayout
{
    /// Array of row objects
    #[default]
    Records,
    /// Column name -> {row index -> value}
    Columns,
}

const COLUMNS: [&str; 6] =
    ["ori_fic_id", "ori_chap_id", "ori_line", "opp_fic_id", "opp_chap_id", "sim_line"];

/// Serialize evidence rows in the requested layout.
pub fn evidence_payload(
    rows: &[EvidenceRow],
    layout: EvidenceLayout,
) -> Value
{
    match layout
    {
        EvidenceLayout::Records => Value::Array(
            rows.iter()
                .map(row_object)
                .map(Value::Object)
                .collect(),
        ),
        EvidenceLayout::Columns =>
        {
            let mut table = Map::new();

            for column in COLUMNS
            {
                let cells: Map<String, Value> = rows
                    .iter()
                    .enumerate()
                    .map(|(i, row)| (i.to_string(), Value::String(cell(row, column).to_string())))
                    .collect();

                table.insert(column.to_string(), Value::Object(cells));
            }

            Value::Object(table)
        }
    }
}

fn row_object(row: &EvidenceRow) -> Map<String, Value>
{
    COLUMNS
        .iter()
        .map(|&c| (c.to_string(), Value::String(cell(row, c).to_string())))
        .collect()
}

fn cell<'a>(
    row: &'a EvidenceRow,
    column: &str,
) -> &'a str
{
    match column
    {
        "ori_fic_id" => &row.ori_fic_id,
        "ori_chap_id" => &row.ori_chap_id,
        "ori_line" => &row.ori_line,
        "opp_fic_id" => &row.opp_fic_id,
        "opp_chap_id" => &row.opp_chap_id,
        _ => &row.sim_line,
    }
}
