//! Corpus records as supplied by the upstream store.
//!
//! Records are validated up front: a record with a missing or malformed
//! identifier or body fails the whole run before any comparison starts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names accepted for each required column (canonical name first)
const STORY_FIELDS: &[&str] = &["story_id", "fiction_id"];
const CHAPTER_FIELDS: &[&str] = &["chapter_id", "chap_id"];
const BODY_FIELDS: &[&str] = &["body_text", "story", "body"];

/// Validation failures for a corpus or a target selector.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError
{
    #[error("corpus is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corpus must be a JSON array of records or an object with a `data` array")]
    Shape,

    #[error("record {index}: expected a JSON object")]
    NotAnObject
    {
        index: usize
    },

    #[error("record {index}: missing required field `{field}`")]
    MissingField
    {
        index: usize, field: &'static str
    },

    #[error("record {index}: field `{field}` has an unsupported type")]
    InvalidField
    {
        index: usize, field: &'static str
    },

    #[error("corpus contains no records")]
    Empty,

    #[error("target {0} is not present in the corpus")]
    TargetNotFound(DocumentId),

    #[error("record index {index} is out of range for a corpus of {len}")]
    IndexOutOfRange
    {
        index: usize, len: usize
    },

    #[error("invalid target `{0}`: expected STORY:CHAPTER")]
    InvalidTarget(String),
}

/// A chapter identity: story plus chapter within that story.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId
{
    pub story: String,
    pub chapter: String,
}

impl DocumentId
{
    pub fn new(
        story: impl Into<String>,
        chapter: impl Into<String>,
    ) -> Self
    {
        Self { story: story.into(), chapter: chapter.into() }
    }

    /// Chapters of one story are never compared against each other.
    pub fn same_story(
        &self,
        other: &DocumentId,
    ) -> bool
    {
        self.story == other.story
    }
}

impl fmt::Display for DocumentId
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        write!(f, "{}:{}", self.story, self.chapter)
    }
}

impl FromStr for DocumentId
{
    type Err = CorpusError;

    /// Parse "story:chapter"; the last colon separates the chapter.
    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.rsplit_once(':')
        {
            Some((story, chapter)) if !story.is_empty() && !chapter.is_empty() =>
            {
                Ok(Self::new(story, chapter))
            }
            _ => Err(CorpusError::InvalidTarget(s.to_string())),
        }
    }
}

/// One chapter as fetched from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord
{
    pub id: DocumentId,
    pub body: String,
}

impl DocumentRecord
{
    pub fn new(
        story: impl Into<String>,
        chapter: impl Into<String>,
        body: impl Into<String>,
    ) -> Self
    {
        Self { id: DocumentId::new(story, chapter), body: body.into() }
    }
}

/// Ordered, validated set of records for a single run.
#[derive(Debug, Clone, Default)]
pub struct Corpus
{
    records: Vec<DocumentRecord>,
}

impl Corpus
{
    pub fn from_records(records: Vec<DocumentRecord>) -> Self
    {
        Self { records }
    }

    /// Parse a corpus from JSON text.
    ///
    /// Accepts either a bare array of records or an envelope object whose
    /// `data` field holds the array.
    pub fn from_json_str(text: &str) -> Result<Self, CorpusError>
    {
        let root: Value = serde_json::from_str(text)?;

        let rows = match root
        {
            Value::Array(rows) => rows,
            Value::Object(mut obj) => match obj.remove("data")
            {
                Some(Value::Array(rows)) => rows,
                _ => return Err(CorpusError::Shape),
            },
            _ => return Err(CorpusError::Shape),
        };

        let records = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| parse_record(index, row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { records })
    }

    pub fn records(&self) -> &[DocumentRecord]
    {
        &self.records
    }

    pub fn len(&self) -> usize
    {
        self.records
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.records
            .is_empty()
    }

    /// Index of the latest record carrying `id`.
    ///
    /// A chapter re-uploaded after revision appears again further down; the
    /// newest body is the one under review.
    pub fn position(
        &self,
        id: &DocumentId,
    ) -> Option<usize>
    {
        self.records
            .iter()
            .rposition(|r| &r.id == id)
    }

    /// Index of the final record.
    pub fn last_index(&self) -> Result<usize, CorpusError>
    {
        self.records
            .len()
            .checked_sub(1)
            .ok_or(CorpusError::Empty)
    }

    /// Identity of the final record (the upstream producer appends the
    /// submission under review last).
    pub fn last_id(&self) -> Result<DocumentId, CorpusError>
    {
        self.records
            .last()
            .map(|r| r.id.clone())
            .ok_or(CorpusError::Empty)
    }
}

fn parse_record(
    index: usize,
    row: Value,
) -> Result<DocumentRecord, CorpusError>
{
    let Value::Object(obj) = row
    else
    {
        return Err(CorpusError::NotAnObject { index });
    };

    let story = id_field(&obj, index, STORY_FIELDS)?;
    let chapter = id_field(&obj, index, CHAPTER_FIELDS)?;

    let body = match lookup(&obj, BODY_FIELDS)
    {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None =>
        {
            return Err(CorpusError::MissingField { index, field: BODY_FIELDS[0] });
        }
        Some(_) => return Err(CorpusError::InvalidField { index, field: BODY_FIELDS[0] }),
    };

    Ok(DocumentRecord { id: DocumentId { story, chapter }, body })
}

/// Identifiers may arrive as strings or integers; both render as text.
fn id_field(
    obj: &Map<String, Value>,
    index: usize,
    names: &'static [&'static str],
) -> Result<String, CorpusError>
{
    let field = names[0];

    match lookup(obj, names)
    {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        Some(Value::String(_)) | Some(Value::Null) | None =>
        {
            Err(CorpusError::MissingField { index, field })
        }
        Some(_) => Err(CorpusError::InvalidField { index, field }),
    }
}

fn lookup<'a>(
    obj: &'a Map<String, Value>,
    names: &[&str],
) -> Option<&'a Value>
{
    names
        .iter()
        .find_map(|name| obj.get(*name))
}
