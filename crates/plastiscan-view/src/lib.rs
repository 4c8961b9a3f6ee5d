//! Display-side projections over reconciled particles: confidence
//! thresholding, category statistics, declarative overlay geometry and the
//! tabular export rows.
//!
//! Everything here is synchronous and side-effect-free, so the embedding UI
//! can call it on every event without locking.

mod export;
mod filter;
mod overlay;

pub use export::{export_csv, export_rows, EXPORT_HEADER};
pub use filter::{available_display_modes, compute_stats, filter_by_confidence, DisplayMode};
pub use overlay::{overlay_instructions, Color, DrawInstruction, Viewport};
