//! Search Module
//!
//! Everything that talks to, or interprets data from, the PubMed index:
//! - `pairs`: splitting user term lists and building the pair product
//! - `eutils`: the E-utilities HTTP client behind the `LiteratureIndex` trait
//! - `cache`: memoised count lookups keyed by the literal query
//! - `parser`: the plain-text abstract format returned by efetch

pub mod cache;
pub mod eutils;
pub mod pairs;
pub mod parser;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::QueryCache;
pub use eutils::{ESearchResponse, ESearchResult, EutilsClient, FetchError, LiteratureIndex};
pub use pairs::{generate_pairs, parse_terms, DelimiterPolicy};
pub use parser::{parse_abstracts, parse_block, ParseError};
