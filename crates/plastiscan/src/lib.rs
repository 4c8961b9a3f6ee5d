//! High-level facade crate for the `plastiscan-*` workspace.
//!
//! Plastiscan turns raw object-detector output into indexed,
//! resolution-independent particle records, renders the index-labeled
//! annotation a characterization model consumes, reconciles the model's
//! free-text reply back onto the detections without ever losing or
//! duplicating one, and derives the display projections (threshold filter,
//! category statistics, overlay geometry, export rows).
//!
//! ## Quickstart
//!
//! ```no_run
//! use plastiscan::{PipelineSession, RawDetectorOutput};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let raw = RawDetectorOutput::from_json(
//!     r#"{"image":{"width":640,"height":480},"predictions":[]}"#,
//! )?;
//!
//! let mut session = PipelineSession::new();
//! let run = session.submit(&raw)?;
//!
//! // ... send the annotated image to the characterization model ...
//! let reply = "[]";
//! let particles = match session.resolve(&run, Ok(reply)) {
//!     plastiscan::Completion::Merged(particles) => particles,
//!     plastiscan::Completion::Stale { .. } => return Ok(()),
//! };
//! println!("{} particles", particles.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `plastiscan::core`: particle data model, geometry normalization, logger.
//! - `plastiscan::annotate`: index-labeled raster annotation rendering.
//! - `plastiscan::analysis`: response parsing and index reconciliation.
//! - `plastiscan::view`: threshold filter, stats, overlay instructions, export.
//! - `plastiscan::PipelineSession`: the two-phase run driver with the
//!   generation token that drops superseded results.

pub use plastiscan_analysis as analysis;
pub use plastiscan_annotate as annotate;
pub use plastiscan_core as core;
pub use plastiscan_view as view;

pub use plastiscan_core::{
    AnalysisStats, AnalyzedParticle, BoundingBox, ParticleAnalysis, RawDetectorOutput,
};
pub use plastiscan_view::DisplayMode;

mod session;
pub use session::{characterization_payload, Completion, PendingRun, PipelineError, PipelineSession};
