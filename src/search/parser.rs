//! Plain-text abstract parser.
//!
//! efetch with `rettype=abstract&retmode=text` returns records separated by two
//! or more blank lines. Inside a record, fields are separated by one blank line
//! and appear in a fixed order:
//!
//! ```text
//! 1. Nature. 2021 Mar;591(7848):1-2. doi: 10.1038/x.     <- [0] citation
//!
//! Title of the paper.                                    <- [1] title
//!
//! Doe J(1), Roe R(2).                                    <- [2] authors
//!
//! Author information:                                    <- [3] institutions
//! (1)Somewhere.
//!
//! Abstract text ...                                      <- [4] abstract
//!
//! PMID: 33500000  [Indexed for MEDLINE]                  <- anywhere after
//! ```
//!
//! Records without an abstract simply have fewer segments. The year is the
//! first 4-digit run of the citation once its record ordinal is removed.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::models::{strip_ordinal, PaperRecord};

static RECORD_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n\s*\n").expect("record separator pattern is valid"));
static SEGMENT_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("segment separator pattern is valid"));
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{4}").expect("year pattern is valid"));
static PMID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PMID: ([0-9]+)").expect("PMID pattern is valid"));

/// Why a single record block was rejected
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("record block {index} has no PMID")]
    MissingPmid { index: usize },

    #[error("record block {index} mentions PMID but has no 'PMID: <digits>' marker")]
    MalformedPmid { index: usize },

    #[error("record block {index} has no 4-digit year in its citation")]
    MissingYear { index: usize },
}

impl ParseError {
    /// Position of the offending block in the dump.
    pub fn block_index(&self) -> usize {
        match self {
            ParseError::MissingPmid { index }
            | ParseError::MalformedPmid { index }
            | ParseError::MissingYear { index } => *index,
        }
    }
}

/// Parse a whole efetch dump. One entry per non-blank block, in source order;
/// a failing block never affects its siblings.
pub fn parse_abstracts(text: &str) -> Vec<Result<PaperRecord, ParseError>> {
    RECORD_SEPARATOR
        .split(text)
        .enumerate()
        .filter(|(_, block)| !block.trim().is_empty())
        .map(|(index, block)| parse_block(index, block))
        .collect()
}

/// Parse one record block. `index` is the block's position in the dump and is
/// only used for error reporting.
pub fn parse_block(index: usize, block: &str) -> Result<PaperRecord, ParseError> {
    let segments: Vec<&str> = SEGMENT_SEPARATOR.split(block).collect();
    let segment = |i: usize| segments.get(i).copied().unwrap_or("").to_string();

    let pmid_segment = segments
        .iter()
        .find(|s| s.contains("PMID"))
        .ok_or(ParseError::MissingPmid { index })?;
    let pmid = PMID
        .captures(pmid_segment)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(ParseError::MalformedPmid { index })?;

    let citation = segment(0);
    let year = YEAR
        .find(strip_ordinal(&citation))
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
        .ok_or(ParseError::MissingYear { index })?;

    Ok(PaperRecord {
        year,
        journal: citation,
        title: segment(1),
        authors: segment(2),
        institutions: segment(3),
        abstract_text: segment(4),
        pmid,
    })
}
