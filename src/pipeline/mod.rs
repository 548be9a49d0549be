//! Pair Pipeline
//!
//! The functional core: turn two term lists into progressive co-occurrence
//! counts, and on demand turn one pair into its parsed paper records.
//!
//! ```text
//! first terms × second terms
//!      │
//!      ▼
//! ┌─────────────┐
//! │ Aggregator  │  → one pair at a time, fixed delay between pairs
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐     ┌─────────────┐
//! │CountFetcher │ ──▶ │ QueryCache  │ ──▶ esearch
//! └─────────────┘     └─────────────┘
//!      │
//!      ▼
//!  Presenter::on_progress (cumulative results)
//!
//! drill-down:  RecordFetcher → esearch → efetch → parser → Presenter::on_papers
//! ```

pub mod aggregate;
pub mod count;
pub mod presenter;
pub mod records;

pub use aggregate::{Aggregator, Pacer, SearchSupervisor, SearchToken, TokioPacer};
pub use count::CountFetcher;
pub use presenter::{ChannelPresenter, ConsolePresenter, Presenter, SearchEvent};
pub use records::RecordFetcher;
