//! Shared test utilities for integration tests
//!
//! Provides corpus fixture creation used across multiple test files.

#![allow(dead_code)]

use assert_fs::prelude::*;
use plagscan::{Corpus, DocumentRecord};

/// Build an in-memory corpus from (story, chapter, body) triples.
pub fn corpus(records: &[(&str, &str, &str)]) -> Corpus
{
    Corpus::from_records(
        records
            .iter()
            .map(|(s, c, b)| DocumentRecord::new(*s, *c, *b))
            .collect(),
    )
}

/// Write a corpus file (array layout) into a fresh temp directory.
pub fn corpus_fixture(records: &[(&str, &str, &str)]) -> assert_fs::TempDir
{
    // Initialize the temporary root
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    // Serialize records the way the upstream store exports them
    let rows: Vec<serde_json::Value> = records
        .iter()
        .map(|(s, c, b)| serde_json::json!({"story_id": s, "chapter_id": c, "body_text": b}))
        .collect();

    tmp.child("corpus.json")
        .write_str(&serde_json::to_string(&rows).expect("encode corpus"))
        .expect("write corpus");

    // Return the prepared directory to the caller
    tmp
}
