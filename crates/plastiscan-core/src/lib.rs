//! Core types and geometry for the `plastiscan-*` workspace.
//!
//! This crate is intentionally small and purely data-oriented. It owns the
//! particle data model and the resolution-independent box math; it does *not*
//! depend on any raster backend or model client.

mod geometry;
mod logger;
mod types;

pub use geometry::{
    denormalize, normalize, normalize_output, DetectionError, PixelRect, RawDetectorOutput,
    RawImageSize, RawPrediction,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;
pub use logger::init_with_level;

pub use types::{
    AnalysisStats, AnalyzedParticle, BoundingBox, ParticleAnalysis, NOT_ANALYZED, PARSE_ERROR,
};
