//! Two-phase pipeline driver.
//!
//! Phase 1 (normalization) must fully succeed before Phase 2 (annotation
//! render plus the external characterization call) begins; a Phase 1 failure
//! aborts the run before any external call is issued. Phase 2 failures never
//! abort: they degrade to the global fallback reconciliation so geometry
//! stays visible.
//!
//! Runs are distinguished by a monotonically incrementing generation token.
//! Submitting a new image supersedes the outstanding run; when the old run's
//! characterization result eventually arrives it resolves to
//! [`Completion::Stale`] and is never merged.

use image::RgbaImage;

use plastiscan_analysis::{merge, merge_fallback, parse_response};
use plastiscan_annotate::{render_annotated, render_annotated_bytes, AnnotateError};
use plastiscan_core::{normalize_output, AnalyzedParticle, DetectionError, RawDetectorOutput};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Pipeline errors, tagged with their originating phase so callers can
/// distinguish "no geometry" from "geometry present, characterization
/// missing". Characterization failures are deliberately absent: they resolve
/// through the fallback path instead of erroring.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("detection phase: {0}")]
    Detection(#[from] DetectionError),

    #[error("annotation phase: {0}")]
    Render(#[from] AnnotateError),
}

/// Serialize the ordered `{..box fields, index}` list sent alongside the
/// annotated image in the characterization request.
pub fn characterization_payload(particles: &[AnalyzedParticle]) -> serde_json::Result<String> {
    serde_json::to_string(particles)
}

/// A successfully normalized run awaiting its characterization result.
#[derive(Clone, Debug)]
pub struct PendingRun {
    generation: u64,
    pub particles: Vec<AnalyzedParticle>,
    /// Present when the submission included a source image.
    pub annotated: Option<RgbaImage>,
}

impl PendingRun {
    /// Token identifying this run within its session.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Outcome of resolving a characterization result against the session.
#[derive(Clone, Debug)]
pub enum Completion {
    /// The run is current; here is the reconciled particle list.
    Merged(Vec<AnalyzedParticle>),
    /// The run was superseded before its result arrived; nothing was merged.
    Stale { generation: u64 },
}

/// Driver for one image-analysis surface. Single-threaded and cooperative:
/// the only state shared across pipeline generations is the generation
/// counter itself.
#[derive(Debug, Default)]
pub struct PipelineSession {
    generation: u64,
}

impl PipelineSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the most recent submission.
    #[inline]
    pub fn current_generation(&self) -> u64 {
        self.generation
    }

    /// Phase 1: normalize detector output into an indexed particle list.
    ///
    /// Starts a new generation, superseding any outstanding run even if this
    /// submission fails. A [`PipelineError::Detection`] here means the run
    /// is aborted and no external call may be issued for it.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, raw), fields(generation = self.generation + 1))
    )]
    pub fn submit(&mut self, raw: &RawDetectorOutput) -> Result<PendingRun, PipelineError> {
        self.generation += 1;
        let particles = normalize_output(raw)?;
        log::info!(
            "generation {}: normalized {} particles",
            self.generation,
            particles.len()
        );
        Ok(PendingRun {
            generation: self.generation,
            particles,
            annotated: None,
        })
    }

    /// Phase 1 plus the annotation render, from an already-decoded image.
    pub fn submit_with_image(
        &mut self,
        raw: &RawDetectorOutput,
        image: &RgbaImage,
    ) -> Result<PendingRun, PipelineError> {
        let mut run = self.submit(raw)?;
        run.annotated = Some(render_annotated(image, &run.particles));
        Ok(run)
    }

    /// Phase 1 plus decode-and-annotate from encoded image bytes. Decoding
    /// happens after normalization, so a bad image never masks a detection
    /// error.
    pub fn submit_with_image_bytes(
        &mut self,
        raw: &RawDetectorOutput,
        image_bytes: &[u8],
    ) -> Result<PendingRun, PipelineError> {
        let mut run = self.submit(raw)?;
        run.annotated = Some(render_annotated_bytes(image_bytes, &run.particles)?);
        Ok(run)
    }

    /// Phase 2: reconcile the characterization outcome onto the run.
    ///
    /// `response` is `Ok(text)` for a received model reply and `Err(message)`
    /// for a transport failure. Stale runs resolve to [`Completion::Stale`]
    /// without merging anything; parse and transport failures resolve to the
    /// global fallback, so the merged list always has exactly the run's
    /// particle count.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, run, response), fields(generation = run.generation()))
    )]
    pub fn resolve(&self, run: &PendingRun, response: Result<&str, &str>) -> Completion {
        if run.generation != self.generation {
            log::info!(
                "dropping stale characterization result: generation {} superseded by {}",
                run.generation,
                self.generation
            );
            return Completion::Stale {
                generation: run.generation,
            };
        }

        let merged = match response {
            Ok(text) => match parse_response(text) {
                Ok(parsed) => merge(&run.particles, &parsed),
                Err(err) => {
                    log::warn!("characterization response unusable: {err}");
                    merge_fallback(&run.particles, &err.to_string())
                }
            },
            Err(transport) => {
                log::warn!("characterization call failed: {transport}");
                merge_fallback(&run.particles, transport)
            }
        };
        Completion::Merged(merged)
    }
}
