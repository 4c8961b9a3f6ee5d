//! Declarative draw instructions for the live, resizable particle overlay.
//!
//! This is a pure function of its inputs: no canvas handles, no cached
//! state. The embedding view is expected to re-invoke it on every
//! geometry-affecting event (new image, new particle list, highlight change,
//! viewport resize) and replay the returned instructions. Device pixel ratio
//! is the display layer's concern; all coordinates here are in rendered
//! viewport units.

use serde::{Deserialize, Serialize};

use plastiscan_core::{denormalize, AnalyzedParticle, PixelRect};

use crate::filter::DisplayMode;

/// RGBA color carried by a draw instruction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

const DETECTION_STROKE: Color = Color::rgba(52, 211, 153, 255);
const SHAPE_STROKE: Color = Color::rgba(249, 115, 22, 255);
const COLOR_STROKE: Color = Color::rgba(59, 130, 246, 255);
const TRANSPARENCY_STROKE: Color = Color::rgba(168, 85, 247, 255);
const HIGHLIGHT_STROKE: Color = Color::rgba(250, 204, 21, 255);
const HIGHLIGHT_FILL: Color = Color::rgba(250, 204, 21, 60);
const LABEL_TEXT_COLOR: Color = Color::rgba(255, 255, 255, 255);

const THIN_STROKE: f32 = 1.5;
const HIGHLIGHT_STROKE_WIDTH: f32 = 3.0;

// Label plate metrics in viewport units. The display layer draws the actual
// glyphs; these only reserve space and drive placement.
const LABEL_HEIGHT: f32 = 18.0;
const LABEL_CHAR_WIDTH: f32 = 7.2;
const LABEL_PADDING: f32 = 8.0;
const LABEL_GAP: f32 = 2.0;

/// Current geometry of the displayed image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub rendered_width: f32,
    pub rendered_height: f32,
    pub intrinsic_width: f32,
    pub intrinsic_height: f32,
}

/// One rectangle-plus-label to replay onto the display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawInstruction {
    pub index: usize,
    pub rect: PixelRect,
    pub stroke_color: Color,
    pub stroke_width: f32,
    pub fill_color: Option<Color>,
    pub label_text: String,
    pub label_rect: PixelRect,
    pub label_text_color: Color,
    pub highlighted: bool,
}

fn mode_stroke(mode: DisplayMode) -> Color {
    match mode {
        DisplayMode::Detection => DETECTION_STROKE,
        DisplayMode::Shape => SHAPE_STROKE,
        DisplayMode::Color => COLOR_STROKE,
        DisplayMode::Transparency => TRANSPARENCY_STROKE,
    }
}

fn label_text(particle: &AnalyzedParticle, mode: DisplayMode) -> String {
    let detection_label = || {
        format!(
            "{} {:.1}%",
            particle.bbox.class,
            particle.bbox.confidence_percent()
        )
    };

    let Some(analysis) = particle.analysis.as_ref().filter(|a| a.is_usable()) else {
        return detection_label();
    };
    let field = match mode {
        DisplayMode::Detection => return detection_label(),
        DisplayMode::Shape => &analysis.shape,
        DisplayMode::Color => &analysis.color,
        DisplayMode::Transparency => &analysis.transparency,
    };
    field.clone().unwrap_or_else(|| "Unknown".to_owned())
}

/// Place the label plate above the box, flipping below when it would clip
/// the viewport top and clamping it horizontally into the viewport.
fn place_label(rect: &PixelRect, text: &str, viewport: &Viewport) -> PixelRect {
    let width = text.chars().count() as f32 * LABEL_CHAR_WIDTH + LABEL_PADDING;
    let above = rect.top_left_y - LABEL_HEIGHT - LABEL_GAP;
    let top_left_y = if above < 0.0 {
        rect.top_left_y + rect.height + LABEL_GAP
    } else {
        above
    };
    let max_x = (viewport.rendered_width - width).max(0.0);
    let top_left_x = rect.top_left_x.clamp(0.0, max_x);
    PixelRect {
        top_left_x,
        top_left_y,
        width,
        height: LABEL_HEIGHT,
    }
}

/// Build the full instruction list for one repaint.
///
/// Box geometry is `denormalize` at intrinsic size scaled by the
/// rendered/intrinsic ratio, which is the same formula the annotation
/// renderer uses at intrinsic size. The particle matching `highlight_index`
/// gets a thicker stroke and a translucent fill; everything else gets a thin
/// stroke in the active mode's color.
pub fn overlay_instructions(
    viewport: &Viewport,
    particles: &[AnalyzedParticle],
    mode: DisplayMode,
    highlight_index: Option<usize>,
) -> Vec<DrawInstruction> {
    let scale_x = viewport.rendered_width / viewport.intrinsic_width;
    let scale_y = viewport.rendered_height / viewport.intrinsic_height;

    particles
        .iter()
        .map(|particle| {
            let intrinsic =
                denormalize(&particle.bbox, viewport.intrinsic_width, viewport.intrinsic_height);
            let rect = PixelRect {
                top_left_x: intrinsic.top_left_x * scale_x,
                top_left_y: intrinsic.top_left_y * scale_y,
                width: intrinsic.width * scale_x,
                height: intrinsic.height * scale_y,
            };

            let highlighted = highlight_index == Some(particle.index);
            let text = label_text(particle, mode);
            let label_rect = place_label(&rect, &text, viewport);

            DrawInstruction {
                index: particle.index,
                rect,
                stroke_color: if highlighted {
                    HIGHLIGHT_STROKE
                } else {
                    mode_stroke(mode)
                },
                stroke_width: if highlighted {
                    HIGHLIGHT_STROKE_WIDTH
                } else {
                    THIN_STROKE
                },
                fill_color: highlighted.then_some(HIGHLIGHT_FILL),
                label_text: text,
                label_rect,
                label_text_color: LABEL_TEXT_COLOR,
                highlighted,
            }
        })
        .collect()
}
