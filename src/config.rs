use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::PipelineError;
use crate::inference::TensorLayout;

const DEFAULT_CLASSIFIER_INPUT_SIZE: u32 = 224;
const DEFAULT_WHOLE_IMAGE_THRESHOLD: f32 = 0.7;
const DEFAULT_DETECTOR_INPUT_SIZE: u32 = 300;
const DEFAULT_DETECTOR_SCALE: f32 = 0.007843;
const DEFAULT_DETECTOR_MEAN: f32 = 127.5;
const DEFAULT_DETECTION_THRESHOLD: f32 = 0.5;
const DEFAULT_BOX_COLOR: [u8; 3] = [0, 255, 0];
const DEFAULT_FONT_SCALE: f32 = 16.0;

/// Tunables for both pipeline modes.
///
/// The detector preprocessing values must match what the detector was
/// trained with; the defaults are those of the bundled MobileNet-SSD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub classifier_input_size: u32,
    /// Whole-image results below this confidence become `NoObjectFound`.
    pub whole_image_threshold: f32,
    pub detector_input_size: u32,
    pub detector_scale: f32,
    pub detector_mean: f32,
    /// Detections must score strictly above this to be classified.
    pub detection_threshold: f32,
    pub classifier_layout: TensorLayout,
    pub detector_layout: TensorLayout,
    pub box_color: [u8; 3],
    pub font_scale: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            classifier_input_size: DEFAULT_CLASSIFIER_INPUT_SIZE,
            whole_image_threshold: DEFAULT_WHOLE_IMAGE_THRESHOLD,
            detector_input_size: DEFAULT_DETECTOR_INPUT_SIZE,
            detector_scale: DEFAULT_DETECTOR_SCALE,
            detector_mean: DEFAULT_DETECTOR_MEAN,
            detection_threshold: DEFAULT_DETECTION_THRESHOLD,
            classifier_layout: TensorLayout::Nhwc,
            detector_layout: TensorLayout::Nchw,
            box_color: DEFAULT_BOX_COLOR,
            font_scale: DEFAULT_FONT_SCALE,
        }
    }
}

impl PipelineConfig {
    /// Read overrides from a TOML file. Keys that are absent keep their defaults.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let raw = std::fs::read_to_string(path).map_err(|e| PipelineError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&raw).map_err(|reason| PipelineError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn from_toml(raw: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(raw).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.classifier_input_size == 0 || self.detector_input_size == 0 {
            return Err("model input sizes must be non-zero".to_string());
        }
        for (name, value) in [
            ("whole_image_threshold", self.whole_image_threshold),
            ("detection_threshold", self.detection_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be within [0, 1], got {value}"));
            }
        }
        Ok(())
    }
}
