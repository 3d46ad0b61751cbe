use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;

use crate::models::{ClampedRegion, Classification};

/// Box outline width in pixels
const LINE_WIDTH: u32 = 2;
/// Gap between a box and the label above it
const TEXT_MARGIN: i32 = 4;

/// How detections are drawn
pub struct AnnotationStyle {
    pub color: Rgb<u8>,
    pub font_scale: f32,
    /// Without a font only rectangles are drawn
    pub font: Option<FontVec>,
}

impl AnnotationStyle {
    pub fn new(color: [u8; 3], font_scale: f32) -> Self {
        Self {
            color: Rgb(color),
            font_scale,
            font: None,
        }
    }

    /// Load a TrueType/OpenType font for box labels
    pub fn with_font_file(mut self, path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("Failed to read font {}: {}", path.display(), e))?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| anyhow::anyhow!("Invalid font {}: {}", path.display(), e))?;
        self.font = Some(font);
        Ok(self)
    }
}

/// Label drawn next to a box, e.g. `"Biodegradable: 87.5%"`
pub fn label_text(result: &Classification) -> String {
    format!("{}: {}", result.label, result.percent(1))
}

/// Top-left corner of a box label: above the box, or just inside it when
/// there is no room above.
pub fn label_origin(region: &ClampedRegion, font_scale: f32) -> (i32, i32) {
    let above = region.y as i32 - font_scale.ceil() as i32 - TEXT_MARGIN;
    let y = if above >= 0 { above } else { region.y as i32 + TEXT_MARGIN };
    (region.x as i32, y)
}

/// Draw one rectangle and label per region-bearing result, in order.
pub fn draw_annotations(img: &mut RgbImage, results: &[Classification], style: &AnnotationStyle) {
    for result in results {
        let Some(region) = result.region else {
            continue;
        };

        for inset in 0..LINE_WIDTH {
            let (w, h) = (region.width, region.height);
            if w <= 2 * inset || h <= 2 * inset {
                break;
            }
            let rect = Rect::at((region.x + inset) as i32, (region.y + inset) as i32)
                .of_size(w - 2 * inset, h - 2 * inset);
            draw_hollow_rect_mut(img, rect, style.color);
        }

        if let Some(font) = &style.font {
            let (x, y) = label_origin(&region, style.font_scale);
            draw_text_mut(
                img,
                style.color,
                x,
                y,
                PxScale::from(style.font_scale),
                font,
                &label_text(result),
            );
        }
    }
}
