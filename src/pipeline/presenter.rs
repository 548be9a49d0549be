//! Presentation-layer callbacks.
//!
//! The pipeline never renders anything itself; it reports through a
//! `Presenter`. Adapters here forward to a channel (HTTP streaming) or to
//! stdout (CLI).

use std::io::{self, Write};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use super::aggregate::SearchToken;
use crate::models::{Pair, PairOutcome, PaperRecord};

/// Characters of abstract shown before the remainder is elided.
pub const ABSTRACT_PREVIEW_CHARS: usize = 300;

pub trait Presenter: Send + Sync {
    /// The planned pairs, before the first request is issued.
    fn on_pairs(&self, _pairs: &[Pair]) {}

    /// Cumulative results after each pair completes.
    fn on_progress(&self, results: &[PairOutcome]);

    /// Records for a drill-down, to be shown under `label`.
    fn on_papers(&self, records: &[PaperRecord], label: &str);
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchEvent {
    Pairs { queries: Vec<String> },
    Progress { results: Vec<PairOutcome> },
    Papers { label: String, records: Vec<PaperRecord> },
    Done { total: usize },
    Error { message: String },
}

impl SearchEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SearchEvent::Pairs { .. } => "pairs",
            SearchEvent::Progress { .. } => "progress",
            SearchEvent::Papers { .. } => "papers",
            SearchEvent::Done { .. } => "done",
            SearchEvent::Error { .. } => "error",
        }
    }
}

/// Forwards every callback as a `SearchEvent`. When the receiving side goes
/// away the attached search token is cancelled.
pub struct ChannelPresenter {
    tx: mpsc::UnboundedSender<SearchEvent>,
    token: Option<SearchToken>,
}

impl ChannelPresenter {
    pub fn new(tx: mpsc::UnboundedSender<SearchEvent>) -> Self {
        Self { tx, token: None }
    }

    pub fn with_token(mut self, token: SearchToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn send(&self, event: SearchEvent) {
        if self.tx.send(event).is_err() {
            debug!("Presenter channel closed");
            if let Some(token) = &self.token {
                token.cancel();
            }
        }
    }
}

impl Presenter for ChannelPresenter {
    fn on_pairs(&self, pairs: &[Pair]) {
        self.send(SearchEvent::Pairs {
            queries: pairs.iter().map(Pair::query).collect(),
        });
    }

    fn on_progress(&self, results: &[PairOutcome]) {
        self.send(SearchEvent::Progress {
            results: results.to_vec(),
        });
    }

    fn on_papers(&self, records: &[PaperRecord], label: &str) {
        self.send(SearchEvent::Papers {
            label: label.to_string(),
            records: records.to_vec(),
        });
    }
}

/// Plain-text output for the command line.
pub struct ConsolePresenter;

impl ConsolePresenter {
    pub fn render_row(outcome: &PairOutcome) -> String {
        match outcome {
            PairOutcome::Counted(r) => format!("{}\t{}", r.pair, r.count),
            PairOutcome::Failed(f) => format!("{}\t?\t({})", f.pair, f.error),
        }
    }

    pub fn render_paper(record: &PaperRecord) -> String {
        let (head, rest) = record.abstract_preview(ABSTRACT_PREVIEW_CHARS);
        let ellipsis = if rest.is_empty() { "" } else { " (...)" };
        format!(
            "{}\n  {}\n  {}\n  PMID: {} <{}>\n  {}{}\n",
            record.title,
            record.authors,
            record.citation(),
            record.pmid,
            record.pubmed_url(),
            head,
            ellipsis
        )
    }

    /// Write one line; a failed write (e.g. a closed pipe) is logged, not fatal.
    fn emit<W: Write>(out: &mut W, text: &str) -> bool {
        match writeln!(out, "{}", text) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "Console write failed");
                false
            }
        }
    }

    fn write(&self, text: &str) {
        Self::emit(&mut io::stdout().lock(), text);
    }
}

impl Presenter for ConsolePresenter {
    fn on_pairs(&self, pairs: &[Pair]) {
        let queries: Vec<String> = pairs.iter().map(Pair::query).collect();
        self.write(&format!("{} pairs: {}", pairs.len(), queries.join(", ")));
    }

    fn on_progress(&self, results: &[PairOutcome]) {
        if let Some(latest) = results.last() {
            self.write(&Self::render_row(latest));
        }
    }

    fn on_papers(&self, records: &[PaperRecord], label: &str) {
        self.write(&format!("\n== {} ({} papers)\n", label, records.len()));
        for record in records {
            self.write(&Self::render_paper(record));
        }
    }
}
