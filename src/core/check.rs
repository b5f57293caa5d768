//! `plagscan check`: load a corpus, run the engine for one chapter, and emit
//! the verdict and evidence payloads.
//!
//! Payloads without an explicit output file are printed to stdout as one
//! JSON document (`{"verdict": ..., "evidence": ...}`). The exit status does
//! not encode the decision; consumers read `yes_or_no`.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::cli::{AppContext, CheckArgs};
use crate::core::corpus::{Corpus, CorpusError, DocumentId};
use crate::core::engine::{Engine, RunReport};
use crate::core::verdict::{Decision, evidence_payload};
use crate::infra::config::{Config, load_config};
use crate::infra::io::{load_corpus, write_payload};

#[instrument(skip_all, fields(corpus = %args.corpus.display()))]
pub fn run(
    args: CheckArgs,
    ctx: &AppContext,
) -> Result<()>
{
    // Config file + env, then CLI overrides on top
    let cfg = apply_overrides(load_config()?, &args);

    let corpus = load_corpus(&args.corpus)?;
    let index = resolve_target(&corpus, &args)?;
    let target = corpus.records()[index]
        .id
        .clone();

    info!(records = corpus.len(), target = %target, "corpus loaded");

    let engine = Engine::new(cfg.thresholds).with_threads(cfg.engine.threads);

    // Progress over candidate pairs (hidden in --quiet mode)
    let pb = if ctx.quiet
    {
        ProgressBar::hidden()
    }
    else
    {
        let pb = ProgressBar::new(Engine::candidate_count(&corpus, &target) as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    };

    let report = engine
        .run_observed_at(&corpus, index, |id| {
            pb.inc(1);
            pb.set_message(format!("compared {id}"));
        })
        .with_context(|| format!("Detection failed for {target}"))?;

    pb.finish_and_clear();

    emit(&report, &args, &cfg)?;

    if args.summary
    {
        print_summary(&report, ctx);
    }

    Ok(())
}

fn apply_overrides(
    mut cfg: Config,
    args: &CheckArgs,
) -> Config
{
    if let Some(reject) = args.reject_threshold
    {
        cfg.thresholds
            .reject = reject;
    }
    if let Some(threads) = args.threads
    {
        cfg.engine
            .threads = threads;
    }
    if let Some(layout) = args.layout
    {
        cfg.output
            .evidence_layout = layout;
    }
    if args.pretty
    {
        cfg.output
            .pretty = true;
    }
    cfg
}

/// Record index under review: the latest upload of `--target`, or the
/// final record for `--last`.
fn resolve_target(
    corpus: &Corpus,
    args: &CheckArgs,
) -> Result<usize>
{
    match &args.target
    {
        Some(spec) =>
        {
            let id: DocumentId = spec.parse()?;
            let index = corpus
                .position(&id)
                .ok_or(CorpusError::TargetNotFound(id))?;
            Ok(index)
        }
        None => Ok(corpus.last_index()?),
    }
}

fn emit(
    report: &RunReport,
    args: &CheckArgs,
    cfg: &Config,
) -> Result<()>
{
    let verdict =
        serde_json::to_value(report.verdict.payload()).context("Failed to encode verdict")?;
    let evidence = evidence_payload(&report.evidence, cfg.output.evidence_layout);

    let mut stdout_doc = Map::new();

    match &args.verdict_out
    {
        Some(path) => write_payload(path, &render(&verdict, cfg.output.pretty)?)?,
        None =>
        {
            stdout_doc.insert("verdict".to_string(), verdict);
        }
    }

    match &args.evidence_out
    {
        Some(path) => write_payload(path, &render(&evidence, cfg.output.pretty)?)?,
        None =>
        {
            stdout_doc.insert("evidence".to_string(), evidence);
        }
    }

    if !stdout_doc.is_empty()
    {
        println!("{}", render(&Value::Object(stdout_doc), cfg.output.pretty)?);
    }

    Ok(())
}

fn render(
    value: &Value,
    pretty: bool,
) -> Result<String>
{
    let s = if pretty
    {
        serde_json::to_string_pretty(value)
    }
    else
    {
        serde_json::to_string(value)
    };
    s.context("Failed to serialize payload")
}

fn print_summary(
    report: &RunReport,
    ctx: &AppContext,
)
{
    let verdict = &report.verdict;
    let label = match verdict.decision
    {
        Decision::Accept => "ACCEPT",
        Decision::Reject => "REJECT",
    };

    if ctx.no_color
    {
        eprintln!("{label} {} score {:.2}%", verdict.target, verdict.score);
    }
    else
    {
        match verdict.decision
        {
            Decision::Accept => eprintln!(
                "{} {} score {:.2}%",
                label.green().bold(),
                verdict.target,
                verdict.score
            ),
            Decision::Reject => eprintln!(
                "{} {} score {:.2}%",
                label.red().bold(),
                verdict.target,
                verdict.score
            ),
        }
    }

    eprintln!("  {}", verdict.message);

    // Highest-scoring candidates first
    let mut pairs: Vec<_> = report
        .pairs
        .iter()
        .filter(|p| p.score > 0.0)
        .collect();
    pairs.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.candidate.cmp(&b.candidate))
    });

    for p in pairs
        .iter()
        .take(5)
    {
        eprintln!(
            "  {:>7.2}%  {}  (hs {}, cp {}, plag {} / {} lines)",
            p.score * 100.0,
            p.candidate,
            p.tally.hs,
            p.tally.cp,
            p.tally.plag,
            p.tally.total_lines
        );
    }
}
