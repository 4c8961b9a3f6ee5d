//! Fault-tolerant extraction of structured particle characterizations from a
//! free-text model reply, and index-based reconciliation of those
//! characterizations onto the original detection list.
//!
//! The two halves enforce one contract between them: parsing is
//! all-or-nothing (a clean array or a typed failure), while reconciliation
//! never changes the detection count or order no matter what the parsed list
//! contains.

mod parser;
mod reconcile;

pub use parser::{parse_response, ParseError, ParsedEntry};
pub use reconcile::{merge, merge_fallback};
