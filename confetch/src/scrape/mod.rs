//! Scrape engine for interactive configuration retrieval.
//!
//! Turns the unbounded, chunked, pager-interrupted byte stream of a device
//! shell into a finalized configuration document: pagination markers are
//! stripped (and answered), per-vendor whitespace policy applied, and the
//! stream is cut when the completion marker reappears.

mod buffer;
mod document;
mod engine;

pub use buffer::ScanBuffer;
pub use document::ConfigDocument;
pub use engine::{FeedOutcome, NormalizePolicy, ScrapeEngine};
