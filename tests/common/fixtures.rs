use image::{Rgb, RgbImage};
use std::cell::Cell;
use wastesort::{Classifier, Detection, InputTensor, ModelContext, ObjectDetector};

/// Classifier that always answers with the same distribution.
pub struct FixedClassifier {
    probabilities: [f32; 2],
    pub calls: Cell<usize>,
    pub last_shape: Cell<Option<[usize; 4]>>,
}

impl FixedClassifier {
    pub fn new(probabilities: [f32; 2]) -> Self {
        Self {
            probabilities,
            calls: Cell::new(0),
            last_shape: Cell::new(None),
        }
    }
}

impl Classifier for FixedClassifier {
    fn predict(&self, input: &InputTensor) -> anyhow::Result<[f32; 2]> {
        self.calls.set(self.calls.get() + 1);
        self.last_shape.set(Some(input.shape()));
        Ok(self.probabilities)
    }
}

/// Bright crops are biodegradable, dark crops are not.
pub struct BrightnessClassifier;

impl Classifier for BrightnessClassifier {
    fn predict(&self, input: &InputTensor) -> anyhow::Result<[f32; 2]> {
        let data = input.data();
        let mean = data.iter().sum::<f32>() / data.len() as f32;
        if mean > 0.5 {
            Ok([0.9, 0.1])
        } else {
            Ok([0.25, 0.75])
        }
    }
}

/// Detector that returns a fixed candidate list and records what it was fed.
pub struct FixedDetector {
    detections: Vec<Detection>,
    pub calls: Cell<usize>,
    pub last_shape: Cell<Option<[usize; 4]>>,
    pub first_sample: Cell<Option<f32>>,
}

impl FixedDetector {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            calls: Cell::new(0),
            last_shape: Cell::new(None),
            first_sample: Cell::new(None),
        }
    }
}

impl ObjectDetector for FixedDetector {
    fn detect(&self, input: &InputTensor) -> anyhow::Result<Vec<Detection>> {
        self.calls.set(self.calls.get() + 1);
        self.last_shape.set(Some(input.shape()));
        self.first_sample.set(input.data().first().copied());
        Ok(self.detections.clone())
    }
}

pub fn detection(confidence: f32, bbox: [f32; 4]) -> Detection {
    Detection { confidence, bbox }
}

pub fn solid_image(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(color))
}

/// Context with a fixed classifier and no detector
pub fn whole_image_models(probabilities: [f32; 2]) -> ModelContext {
    ModelContext::new(Box::new(FixedClassifier::new(probabilities)))
}

/// Context with a fixed classifier and a fixed detector
pub fn region_models(probabilities: [f32; 2], detections: Vec<Detection>) -> ModelContext {
    ModelContext::new(Box::new(FixedClassifier::new(probabilities)))
        .with_detector(Box::new(FixedDetector::new(detections)))
}

/// Encode an image to PNG bytes in memory
pub fn png_bytes(img: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("Failed to encode test PNG");
    bytes
}

/// Encode an image to JPEG bytes in memory
pub fn jpeg_bytes(img: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
        .expect("Failed to encode test JPEG");
    bytes
}

/// Shares a fake with the test body after handing it to a `ModelContext`.
pub struct Shared<T>(pub std::rc::Rc<T>);

impl<T: Classifier> Classifier for Shared<T> {
    fn predict(&self, input: &InputTensor) -> anyhow::Result<[f32; 2]> {
        self.0.predict(input)
    }
}

impl<T: ObjectDetector> ObjectDetector for Shared<T> {
    fn detect(&self, input: &InputTensor) -> anyhow::Result<Vec<Detection>> {
        self.0.detect(input)
    }
}
