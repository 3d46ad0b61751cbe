use image::RgbImage;
use serde::Serialize;
use std::fmt;

/// Outcome classes of the waste classifier, plus the "nothing here" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WasteLabel {
    Biodegradable,
    NonBiodegradable,
    NoObjectFound,
}

impl WasteLabel {
    /// Class order of the two-way classifier output.
    pub const CLASSES: [WasteLabel; 2] = [WasteLabel::Biodegradable, WasteLabel::NonBiodegradable];

    pub fn as_str(&self) -> &'static str {
        match self {
            WasteLabel::Biodegradable => "Biodegradable",
            WasteLabel::NonBiodegradable => "Non-Biodegradable",
            WasteLabel::NoObjectFound => "No Object Found",
        }
    }
}

impl fmt::Display for WasteLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned box in pixel coordinates of one image.
///
/// Coordinates are signed because a scaled detector box may lie partly or
/// entirely outside the image. Use [`Region::clamp`] before cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub start_x: i32,
    pub start_y: i32,
    pub end_x: i32,
    pub end_y: i32,
}

impl Region {
    /// Scale a normalized `[x0, y0, x1, y1]` box to pixel coordinates.
    /// Fractions are truncated toward zero.
    pub fn from_normalized(bbox: [f32; 4], width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self {
            start_x: (bbox[0] * w) as i32,
            start_y: (bbox[1] * h) as i32,
            end_x: (bbox[2] * w) as i32,
            end_y: (bbox[3] * h) as i32,
        }
    }

    /// Clip to `[0, width] x [0, height]`. Returns `None` when nothing is left.
    pub fn clamp(&self, width: u32, height: u32) -> Option<ClampedRegion> {
        let clip = |v: i32, max: u32| v.clamp(0, max.min(i32::MAX as u32) as i32) as u32;

        let x0 = clip(self.start_x, width);
        let y0 = clip(self.start_y, height);
        let x1 = clip(self.end_x, width);
        let y1 = clip(self.end_y, height);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(ClampedRegion {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

/// Region after clipping to image bounds; always has positive area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClampedRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ClampedRegion {
    /// Copy the region out of `img`.
    pub fn crop(&self, img: &RgbImage) -> RgbImage {
        image::imageops::crop_imm(img, self.x, self.y, self.width, self.height).to_image()
    }
}

/// One raw detector candidate: confidence plus a normalized box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub confidence: f32,
    pub bbox: [f32; 4],
}

/// Terminal output unit of both pipeline modes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub label: WasteLabel,
    pub confidence: f32,
    /// Pixel box the label applies to; `None` for whole-image results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<ClampedRegion>,
}

impl Classification {
    /// Sentinel returned when detection mode finds nothing.
    pub fn no_object() -> Self {
        Self {
            label: WasteLabel::NoObjectFound,
            confidence: 0.0,
            region: None,
        }
    }

    /// Confidence as a percentage string with `decimals` places, e.g. `"90.00%"`.
    pub fn percent(&self, decimals: usize) -> String {
        format!("{:.*}%", decimals, self.confidence * 100.0)
    }
}

/// Result of detect-then-classify: the annotated copy plus one entry per
/// surviving detection (or the single sentinel).
#[derive(Debug, Clone)]
pub struct RegionReport {
    pub image: RgbImage,
    pub results: Vec<Classification>,
}
