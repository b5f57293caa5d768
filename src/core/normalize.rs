//! Sentence segmentation and cleaning.
//!
//! A chapter body becomes an ordered list of [`Sentence`]s. Each sentence
//! keeps its cleaned line (tokens joined by single spaces) for evidence
//! reporting and its tokens for vectorizing. Positional alignment with the
//! segmenter output is preserved: punctuation-only sentences stay in the
//! list as zero-token sentences.

use unicode_segmentation::UnicodeSegmentation;

use crate::core::corpus::{DocumentId, DocumentRecord};

/// Quote characters deleted outright
const QUOTES: &[char] = &['\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}', '"', '\''];

/// Structural punctuation replaced by a space
const BREAKERS: &[char] = &[
    '-', '\u{2013}', '\u{2014}', '/', '?', '!', '_', ',', '.', '(', ')', '[', ']', ':', ';',
];

/// Sentence terminators
const TERMINALS: &[char] = &['.', '!', '?'];

/// Closing marks that stay attached to the sentence they end
const CLOSERS: &[char] = &['"', '\'', '\u{201D}', '\u{2019}', ')', ']'];

/// Opening marks stripped before an abbreviation lookup
const OPENERS: &[char] = &['"', '\'', '\u{201C}', '\u{2018}', '(', '['];

/// Words whose trailing `.` does not end a sentence (compared without it)
const ABBREVIATIONS: &[&str] =
    &["mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "e.g", "i.e"];

/// One cleaned sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence
{
    /// Tokens joined by single spaces
    pub line: String,
    /// Lower-cased word tokens
    pub tokens: Vec<String>,
}

impl Sentence
{
    pub fn is_empty(&self) -> bool
    {
        self.tokens
            .is_empty()
    }
}

/// A normalized chapter, immutable once built.
#[derive(Debug, Clone)]
pub struct Document
{
    pub id: DocumentId,
    pub sentences: Vec<Sentence>,
}

impl Document
{
    pub fn from_record(record: &DocumentRecord) -> Self
    {
        Self { id: record.id.clone(), sentences: normalize(&record.body) }
    }

    /// Cleaned lines in sentence order.
    pub fn lines(&self) -> impl Iterator<Item = &str>
    {
        self.sentences
            .iter()
            .map(|s| s.line.as_str())
    }

    pub fn len(&self) -> usize
    {
        self.sentences
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.sentences
            .is_empty()
    }
}

/// Split a body into lower-cased raw sentences.
///
/// UAX #29 boundaries are the first pass. Segments ending in a known
/// abbreviation (`Mr.`, `e.g.`) are joined back to what follows, then any
/// run of `.`, `!` or `?` (plus closing quotes) followed by whitespace ends
/// a sentence whatever the case of the next word. A body with no sentences
/// yields a single empty sentence.
pub fn split_sentences(text: &str) -> Vec<String>
{
    let mut out: Vec<String> = join_abbreviations(text)
        .into_iter()
        .flat_map(split_terminals)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect();

    if out.is_empty()
    {
        out.push(String::new());
    }

    out
}

/// UAX #29 segments, with abbreviation breaks undone.
fn join_abbreviations(text: &str) -> Vec<&str>
{
    let mut spans = Vec::new();
    let mut start = 0;

    for (offset, segment) in text.split_sentence_bound_indices()
    {
        if !ends_with_abbreviation(segment)
        {
            let end = offset + segment.len();
            spans.push(&text[start..end]);
            start = end;
        }
    }

    if start < text.len()
    {
        spans.push(&text[start..]);
    }

    spans
}

/// Cut `span` after every terminal run that is followed by whitespace.
fn split_terminals(span: &str) -> Vec<&str>
{
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut chars = span
        .char_indices()
        .peekable();

    while let Some((i, ch)) = chars.next()
    {
        if !TERMINALS.contains(&ch)
        {
            continue;
        }

        // Swallow `?!`, `...` and closing quotes into the same boundary
        let mut end = i + ch.len_utf8();
        while let Some(&(j, next)) = chars.peek()
        {
            if !TERMINALS.contains(&next) && !CLOSERS.contains(&next)
            {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }

        let followed_by_space = chars
            .peek()
            .is_some_and(|&(_, next)| next.is_whitespace());

        if followed_by_space && !ends_with_abbreviation(&span[start..end])
        {
            pieces.push(&span[start..end]);
            start = end;
        }
    }

    if start < span.len()
    {
        pieces.push(&span[start..]);
    }

    pieces
}

fn ends_with_abbreviation(segment: &str) -> bool
{
    let Some(head) = segment
        .trim_end()
        .strip_suffix('.')
    else
    {
        return false;
    };

    let word = head
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .trim_start_matches(OPENERS);

    ABBREVIATIONS
        .iter()
        .any(|a| word.eq_ignore_ascii_case(a))
}

/// Clean one raw sentence into its tokens and joined line.
pub fn clean_sentence(raw: &str) -> Sentence
{
    let mut buf = String::with_capacity(raw.len());

    for ch in raw.chars()
    {
        if QUOTES.contains(&ch)
        {
            continue;
        }

        if BREAKERS.contains(&ch)
        {
            buf.push(' ');
        }
        else
        {
            buf.push(ch);
        }
    }

    let tokens: Vec<String> = buf
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    Sentence { line: tokens.join(" "), tokens }
}

/// Full normalization pipeline for one chapter body.
pub fn normalize(text: &str) -> Vec<Sentence>
{
    split_sentences(text)
        .iter()
        .map(|s| clean_sentence(s))
        .collect()
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn splits_on_terminal_punctuation()
    {
        let got = split_sentences("The quick brown fox. The lazy dog! Why not?");
        assert_eq!(got, vec!["the quick brown fox.", "the lazy dog!", "why not?"]);
    }

    #[test]
    fn lowercase_prose_splits_on_periods()
    {
        let got = split_sentences("the fox ran home. the dog sat down. i saw it.");
        assert_eq!(got, vec!["the fox ran home.", "the dog sat down.", "i saw it."]);

        let got = split_sentences("wait... what? no way!! fine.");
        assert_eq!(got, vec!["wait...", "what?", "no way!!", "fine."]);
    }

    #[test]
    fn decimals_and_inner_dots_do_not_split()
    {
        let got = split_sentences("it cost 3.50 at the shop. see example.com for more.");
        assert_eq!(got, vec!["it cost 3.50 at the shop.", "see example.com for more."]);
    }

    #[test]
    fn common_abbreviations_stay_inside_the_sentence()
    {
        assert_eq!(split_sentences("He met Mr. Smith today."), vec!["he met mr. smith today."]);
        assert_eq!(
            split_sentences("bring fruit, e.g. apples. then leave (dr. who said so)."),
            vec!["bring fruit, e.g. apples.", "then leave (dr. who said so)."]
        );
    }

    #[test]
    fn closing_quote_stays_with_its_sentence()
    {
        let got = split_sentences("\"Run!\" She said it twice.");
        assert_eq!(got.len(), 2);
        assert_eq!(got[0], "\"run!\"");

        let cleaned = normalize("\"Run!\" She said it twice.");
        assert_eq!(cleaned[0].line, "run");
        assert_eq!(cleaned[1].line, "she said it twice");
    }

    #[test]
    fn quotes_are_deleted_not_spaced()
    {
        let s = clean_sentence("don\u{2019}t \u{201C}stop\u{201D} it's");
        assert_eq!(s.tokens, vec!["dont", "stop", "its"]);
    }

    #[test]
    fn structural_punctuation_becomes_space()
    {
        let s = clean_sentence("well-known (sort of): a/b, c\u{2014}d [e]; f_g.");
        assert_eq!(s.line, "well known sort of a b c d e f g");
    }

    #[test]
    fn empty_and_whitespace_bodies_give_one_empty_sentence()
    {
        for body in ["", "   \n\t  "]
        {
            let sentences = normalize(body);
            assert_eq!(sentences.len(), 1);
            assert!(sentences[0].is_empty());
            assert_eq!(sentences[0].line, "");
        }
    }

    #[test]
    fn punctuation_only_sentence_is_kept_as_zero_tokens()
    {
        let sentences = normalize("...");
        assert_eq!(sentences.len(), 1);
        assert!(sentences[0].is_empty());

        assert!(clean_sentence("?!--;").is_empty());
    }

    #[test]
    fn document_keeps_sentence_order()
    {
        let record = DocumentRecord::new("s", "c", "First line here. Second line there.");
        let doc = Document::from_record(&record);

        let lines: Vec<&str> = doc.lines().collect();
        assert_eq!(lines, vec!["first line here", "second line there"]);
        assert_eq!(doc.len(), 2);
    }
}
