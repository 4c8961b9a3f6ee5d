//! Burns index-labeled detection boxes into a raster copy of the source
//! image, producing the annotation the characterization model is asked to
//! reason about.
//!
//! Rendering is deterministic: the same image and particle list always
//! produce the same raster. Box geometry comes from
//! [`plastiscan_core::denormalize`] at the image's own intrinsic size; the
//! interactive overlay uses the same formula at display size instead.

use ab_glyph::{FontArc, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size, Blend,
};
use imageproc::rect::Rect;
use std::sync::OnceLock;

use plastiscan_core::{denormalize, AnalyzedParticle};

/// Single fixed attention color for every box. Deliberately not data-driven:
/// the model is told to read the numeric labels, not the colors.
const ATTENTION: Rgba<u8> = Rgba([255, 64, 64, 255]);
const LABEL_TEXT: Rgba<u8> = Rgba([255, 255, 255, 255]);
const LABEL_PLATE: Rgba<u8> = Rgba([0, 0, 0, 150]);

const PLATE_PADDING: i32 = 4;
const STROKE_REL: f32 = 0.004;
const STROKE_FLOOR: i32 = 2;
const FONT_FLOOR: f32 = 16.0;

/// Errors raised while preparing the annotated raster.
#[derive(thiserror::Error, Debug)]
pub enum AnnotateError {
    #[error("failed to decode source image: {0}")]
    ImageLoad(#[from] image::ImageError),
}

static LABEL_FONT: OnceLock<FontArc> = OnceLock::new();

fn label_font() -> &'static FontArc {
    LABEL_FONT.get_or_init(|| {
        FontArc::try_from_slice(include_bytes!("../assets/DejaVuSans-Bold.ttf"))
            .expect("bundled label font is valid")
    })
}

/// Decode an encoded source image into RGBA pixels.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, AnnotateError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Decode and annotate in one step.
pub fn render_annotated_bytes(
    bytes: &[u8],
    particles: &[AnalyzedParticle],
) -> Result<RgbaImage, AnnotateError> {
    Ok(render_annotated(&decode_image(bytes)?, particles))
}

/// Draw every particle's box and index label onto a copy of `image`.
///
/// The output has the same intrinsic dimensions as the input. Stroke width
/// scales with the smaller image dimension and the label font scales with
/// both box and image size, each with a floor, so annotations stay legible
/// at any resolution.
pub fn render_annotated(image: &RgbaImage, particles: &[AnalyzedParticle]) -> RgbaImage {
    let (width, height) = image.dimensions();
    let mut canvas = Blend(image.clone());

    let img_min = width.min(height) as f32;
    let stroke = ((img_min * STROKE_REL).round() as i32).max(STROKE_FLOOR);
    let font = label_font();

    for particle in particles {
        let rect = denormalize(&particle.bbox, width as f32, height as f32);
        let x0 = rect.top_left_x.round() as i32;
        let y0 = rect.top_left_y.round() as i32;
        let w = rect.width.round().max(1.0) as u32;
        let h = rect.height.round().max(1.0) as u32;

        // Nested hollow rects give a stroke that survives downscaling.
        for t in 0..stroke {
            let inner_w = w.saturating_sub(2 * t as u32).max(1);
            let inner_h = h.saturating_sub(2 * t as u32).max(1);
            draw_hollow_rect_mut(
                &mut canvas,
                Rect::at(x0 + t, y0 + t).of_size(inner_w, inner_h),
                ATTENTION,
            );
        }

        let box_min = rect.width.min(rect.height);
        let font_px = (box_min * 0.5).min(img_min * 0.08).max(FONT_FLOOR);
        let scale = PxScale::from(font_px);

        let label = particle.index.to_string();
        let (text_w, text_h) = text_size(scale, font, &label);

        let center_x = x0 + (w / 2) as i32;
        let center_y = y0 + (h / 2) as i32;
        let text_x = center_x - (text_w / 2) as i32;
        let text_y = center_y - (text_h / 2) as i32;

        let plate = Rect::at(text_x - PLATE_PADDING, text_y - PLATE_PADDING).of_size(
            text_w + 2 * PLATE_PADDING as u32,
            text_h + 2 * PLATE_PADDING as u32,
        );
        draw_filled_rect_mut(&mut canvas, plate, LABEL_PLATE);
        draw_text_mut(&mut canvas, LABEL_TEXT, text_x, text_y, scale, font, &label);
    }

    canvas.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use plastiscan_core::BoundingBox;
    use std::io::Cursor;

    fn particle(index: usize, x: f32, y: f32, w: f32, h: f32) -> AnalyzedParticle {
        AnalyzedParticle {
            bbox: BoundingBox {
                x,
                y,
                width: w,
                height: h,
                confidence: 0.9,
                class: "particle".into(),
            },
            index,
            analysis: None,
        }
    }

    fn blank(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]))
    }

    #[test]
    fn keeps_intrinsic_dimensions() {
        let img = blank(120, 80);
        let out = render_annotated(&img, &[particle(0, 0.5, 0.5, 0.4, 0.4)]);
        assert_eq!(out.dimensions(), (120, 80));
    }

    #[test]
    fn empty_particle_list_leaves_image_untouched() {
        let img = blank(64, 64);
        let out = render_annotated(&img, &[]);
        assert_eq!(out, img);
    }

    #[test]
    fn draws_attention_stroke_at_box_corner() {
        let img = blank(100, 100);
        // Box centered at (0.5, 0.5), 40x40 px: top-left corner at (30, 30).
        let out = render_annotated(&img, &[particle(0, 0.5, 0.5, 0.4, 0.4)]);
        assert_eq!(*out.get_pixel(30, 30), ATTENTION);
        assert_ne!(out, img);
    }

    #[test]
    fn rendering_is_deterministic() {
        let img = blank(100, 100);
        let parts = vec![particle(0, 0.3, 0.3, 0.2, 0.2), particle(1, 0.7, 0.7, 0.2, 0.2)];
        assert_eq!(render_annotated(&img, &parts), render_annotated(&img, &parts));
    }

    #[test]
    fn decode_rejects_garbage_bytes() {
        assert!(matches!(
            decode_image(b"definitely not an image"),
            Err(AnnotateError::ImageLoad(_))
        ));
    }

    #[test]
    fn decodes_and_annotates_png_bytes() {
        let img = blank(50, 50);
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let out = render_annotated_bytes(&bytes, &[particle(0, 0.5, 0.5, 0.5, 0.5)]).unwrap();
        assert_eq!(out.dimensions(), (50, 50));
    }
}
