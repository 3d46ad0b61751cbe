pub mod rten_backend;
pub mod tensor;

use log::info;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::models::Detection;

pub use rten_backend::{RtenClassifier, RtenDetector};
pub use tensor::{classifier_input, detector_input};

/// Memory order of a 4-D image tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// `[batch, height, width, channel]`, as exported by Keras.
    Nhwc,
    /// `[batch, channel, height, width]`, as used by Caffe/ONNX detectors.
    Nchw,
}

/// Engine-neutral single-image input tensor (batch size 1).
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    shape: [usize; 4],
    layout: TensorLayout,
    data: Vec<f32>,
}

impl InputTensor {
    pub fn new(layout: TensorLayout, height: usize, width: usize, data: Vec<f32>) -> Self {
        let shape = match layout {
            TensorLayout::Nhwc => [1, height, width, 3],
            TensorLayout::Nchw => [1, 3, height, width],
        };
        debug_assert_eq!(data.len(), shape.iter().product::<usize>());
        Self { shape, layout, data }
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn layout(&self) -> TensorLayout {
        self.layout
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Sample at pixel `(x, y)`, channel `c`, independent of layout.
    pub fn at(&self, c: usize, y: usize, x: usize) -> f32 {
        let idx = match self.layout {
            TensorLayout::Nhwc => (y * self.shape[2] + x) * 3 + c,
            TensorLayout::Nchw => (c * self.shape[2] + y) * self.shape[3] + x,
        };
        self.data[idx]
    }
}

/// Pretrained two-way waste classifier.
pub trait Classifier {
    /// Class probabilities in [`WasteLabel::CLASSES`](crate::WasteLabel::CLASSES) order.
    fn predict(&self, input: &InputTensor) -> anyhow::Result<[f32; 2]>;
}

/// Pretrained object detector producing normalized candidate boxes.
pub trait ObjectDetector {
    /// All candidates in model order, unfiltered.
    fn detect(&self, input: &InputTensor) -> anyhow::Result<Vec<Detection>>;
}

/// Locations of the model artifacts on disk.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub classifier: PathBuf,
    pub detector: Option<PathBuf>,
}

/// Model handles loaded once at startup and shared read-only by every
/// pipeline call.
pub struct ModelContext {
    classifier: Box<dyn Classifier>,
    detector: Option<Box<dyn ObjectDetector>>,
}

impl ModelContext {
    pub fn new(classifier: Box<dyn Classifier>) -> Self {
        Self {
            classifier,
            detector: None,
        }
    }

    pub fn with_detector(mut self, detector: Box<dyn ObjectDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Load rten models from disk.
    ///
    /// Every path is checked before anything is loaded so a missing detector
    /// file fails fast instead of after the (slow) classifier load.
    pub fn load(paths: &ModelPaths, config: &PipelineConfig) -> Result<Self, PipelineError> {
        let all = std::iter::once(&paths.classifier).chain(paths.detector.iter());
        for path in all {
            if !path.is_file() {
                return Err(PipelineError::MissingModel { path: path.clone() });
            }
        }

        let classifier = RtenClassifier::load(&paths.classifier)?;
        let mut context = Self::new(Box::new(classifier));

        if let Some(detector_path) = &paths.detector {
            let detector = RtenDetector::load(detector_path)?;
            context = context.with_detector(Box::new(detector));
        }

        info!(
            "Models ready (classifier input {}x{}, detector {})",
            config.classifier_input_size,
            config.classifier_input_size,
            if context.has_detector() { "loaded" } else { "disabled" }
        );

        Ok(context)
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn detector(&self) -> Result<&dyn ObjectDetector, PipelineError> {
        self.detector
            .as_deref()
            .ok_or(PipelineError::DetectorNotConfigured)
    }

    pub fn has_detector(&self) -> bool {
        self.detector.is_some()
    }
}
