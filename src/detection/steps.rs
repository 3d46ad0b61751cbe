use anyhow::Result;
use log::debug;

use crate::error::PipelineError;
use crate::inference::{Classifier, ObjectDetector, TensorLayout, classifier_input, detector_input};
use crate::models::{Classification, Region, WasteLabel};
use crate::pipeline::{PipelineContext, PipelineData, PipelineStep};

/// Run the object detector and split one image into its detected regions.
///
/// Only candidates scoring strictly above `threshold` are kept. Overlapping
/// boxes are not merged. Boxes that end up empty after clamping to the image
/// are dropped without affecting the others.
pub struct DetectionStep<'a> {
    pub detector: &'a dyn ObjectDetector,
    pub input_size: u32,
    pub scale: f32,
    pub mean: f32,
    pub layout: TensorLayout,
    pub threshold: f32,
}

impl PipelineStep for DetectionStep<'_> {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let input = detector_input(&item.image, self.input_size, self.scale, self.mean, self.layout);
            let candidates = self.detector.detect(&input)?;
            let (width, height) = item.original.dimensions();

            for candidate in candidates {
                // NaN scores never pass
                if !(candidate.confidence > self.threshold) {
                    continue;
                }

                let scaled = Region::from_normalized(candidate.bbox, width, height);
                let Some(region) = scaled.clamp(width, height) else {
                    debug!("  Skipping empty crop {:?} (confidence {:.3})", scaled, candidate.confidence);
                    continue;
                };

                let crop = region.crop(&item.original);
                result.push(PipelineData::from_region(
                    crop,
                    item.original.clone(),
                    region,
                    candidate.confidence,
                ));
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Object Detection"
    }
}

/// Classify each item's working image as biodegradable or not.
pub struct ClassificationStep<'a> {
    pub classifier: &'a dyn Classifier,
    pub input_size: u32,
    pub layout: TensorLayout,
    /// When set, results below this confidence are relabelled `NoObjectFound`
    pub min_confidence: Option<f32>,
}

impl PipelineStep for ClassificationStep<'_> {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::with_capacity(data.len());

        for mut item in data {
            let input = classifier_input(&item.image, self.input_size, self.layout);
            let probabilities = self.classifier.predict(&input)?;
            check_distribution(probabilities)?;

            let (label, confidence) = decide_label(probabilities, self.min_confidence);
            debug!("  Classified as {} ({:.4})", label, confidence);

            item.classification = Some(Classification {
                label,
                confidence,
                region: item.region,
            });
            result.push(item);
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Classification"
    }
}

/// Tolerance on the sum of the two class probabilities
const DISTRIBUTION_EPSILON: f32 = 1e-3;

/// The classifier must return a probability distribution: both values in
/// [0, 1] and summing to 1.
pub fn check_distribution(probabilities: [f32; 2]) -> Result<(), PipelineError> {
    let in_range = probabilities.iter().all(|p| (0.0..=1.0).contains(p));
    let sum = probabilities[0] + probabilities[1];

    if in_range && (sum - 1.0).abs() <= DISTRIBUTION_EPSILON {
        return Ok(());
    }

    Err(PipelineError::UnexpectedOutput {
        expected: "two class probabilities summing to 1".to_string(),
        got: format!("{:?}", probabilities),
    })
}

/// Argmax over the two classes, ties going to the first class.
/// Below `min_confidence` the label becomes `NoObjectFound`; the confidence is kept.
pub fn decide_label(probabilities: [f32; 2], min_confidence: Option<f32>) -> (WasteLabel, f32) {
    let idx = if probabilities[1] > probabilities[0] { 1 } else { 0 };
    let confidence = probabilities[idx];

    match min_confidence {
        Some(threshold) if confidence < threshold => (WasteLabel::NoObjectFound, confidence),
        _ => (WasteLabel::CLASSES[idx], confidence),
    }
}
