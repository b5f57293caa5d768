//! **plagscan** - Sentence-level overlap detection for a shared story corpus
//!
//! A submitted chapter is compared against every chapter of every other story
//! using TF-IDF cosine (lexical) and token-set Jaccard (structural) scores.
//! Matches are collected as line-level evidence and the strongest single
//! candidate decides whether the chapter can be published.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Detection pipeline - normalize, vectorize, compare, flag, aggregate
pub mod core {
    /// Corpus records, identifiers, and up-front validation
    pub mod corpus;
    pub use corpus::{Corpus, CorpusError, DocumentId, DocumentRecord};

    /// Sentence segmentation and cleaning
    pub mod normalize;
    pub use normalize::{Document, Sentence};

    /// Corpus-wide TF-IDF space and word index, fit once per run
    pub mod vectorize;
    pub use vectorize::{CorpusVectorSpace, EncodedDocument};

    /// Lexical and structural similarity matrices
    pub mod similarity;
    pub use similarity::{PairMatrices, SimilarityMatrix};

    /// Threshold classification and per-pair tallies
    pub mod flagging;
    pub use flagging::{PairTally, RowFinding, Thresholds};

    /// Flat evidence ledger with composite keys
    pub mod evidence;
    pub use evidence::{EvidenceLedger, EvidenceRow};

    /// Max aggregation, publish decision, and payloads
    pub mod verdict;
    pub use verdict::{Decision, EvidenceLayout, Verdict, VerdictPayload};

    /// Run orchestration with rayon parallelism over candidate pairs
    pub mod engine;
    pub use engine::{Engine, EngineError, RunReport};

    /// `check` command handler
    pub mod check;
    pub use check::run as check_run;
}

/// Infrastructure - Configuration, I/O, and logging
pub mod infra {
    /// Configuration management with TOML support and env overrides
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Memory-mapped reading for large corpora
    pub mod io;
    pub use io::{FileContent, load_corpus, read_file_smart};

    /// Tracing subscriber setup
    pub mod logging;
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use core::check_run;
pub use infra::{Config, load_config};

// Core types for external consumers
pub use core::{Corpus, Decision, DocumentId, DocumentRecord, Engine, RunReport, Thresholds};
