use log::{debug, info, warn};
use rten::Model;
use rten_tensor::prelude::*;
use rten_tensor::{NdTensor, Tensor};
use std::path::Path;

use super::{Classifier, InputTensor, ObjectDetector};
use crate::error::PipelineError;
use crate::models::Detection;

/// Values per SSD detection row: batch, class, confidence, x0, y0, x1, y1.
const SSD_ROW_LEN: usize = 7;

fn load_model(path: &Path) -> Result<Model, PipelineError> {
    if !path.is_file() {
        return Err(PipelineError::MissingModel {
            path: path.to_path_buf(),
        });
    }

    info!("Loading model {}...", path.display());
    let model = Model::load_file(path).map_err(|e| PipelineError::ModelLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    info!("Loaded model {}", path.display());

    Ok(model)
}

/// Run a single-input, single-output model and return its output flattened.
fn run_flat(model: &Model, input: &InputTensor) -> anyhow::Result<(Vec<usize>, Vec<f32>)> {
    let tensor = NdTensor::from_data(input.shape(), input.data().to_vec());
    let output: Tensor<f32> = model.run_one(tensor.view().into(), None)?.try_into()?;
    Ok((output.shape().to_vec(), output.iter().copied().collect()))
}

/// Waste classifier backed by an rten model.
pub struct RtenClassifier {
    model: Model,
}

impl RtenClassifier {
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        Ok(Self {
            model: load_model(path)?,
        })
    }
}

impl Classifier for RtenClassifier {
    fn predict(&self, input: &InputTensor) -> anyhow::Result<[f32; 2]> {
        let (shape, values) = run_flat(&self.model, input)?;
        match values.as_slice() {
            [a, b] => Ok([*a, *b]),
            _ => Err(PipelineError::UnexpectedOutput {
                expected: "2 class probabilities".to_string(),
                got: format!("shape {:?}", shape),
            }
            .into()),
        }
    }
}

/// SSD-style object detector backed by an rten model.
pub struct RtenDetector {
    model: Model,
}

impl RtenDetector {
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        Ok(Self {
            model: load_model(path)?,
        })
    }
}

impl ObjectDetector for RtenDetector {
    fn detect(&self, input: &InputTensor) -> anyhow::Result<Vec<Detection>> {
        let (shape, values) = run_flat(&self.model, input)?;
        if shape.last() != Some(&SSD_ROW_LEN) {
            return Err(PipelineError::UnexpectedOutput {
                expected: format!("rows of {} values", SSD_ROW_LEN),
                got: format!("shape {:?}", shape),
            }
            .into());
        }

        let detections = parse_ssd_rows(&values);
        debug!("Detector returned {} candidates", detections.len());
        Ok(detections)
    }
}

/// Decode `(batch, class, confidence, x0, y0, x1, y1)` rows, skipping rows
/// with a non-finite confidence.
pub fn parse_ssd_rows(values: &[f32]) -> Vec<Detection> {
    values
        .chunks_exact(SSD_ROW_LEN)
        .filter_map(|row| {
            let confidence = row[2];
            if !confidence.is_finite() {
                warn!("Skipping detector row with confidence {}", confidence);
                return None;
            }
            Some(Detection {
                confidence,
                bbox: [row[3], row[4], row[5], row[6]],
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_in_order() {
        let values = [
            0.0, 15.0, 0.9, 0.1, 0.2, 0.3, 0.4, //
            0.0, 5.0, 0.3, 0.5, 0.5, 0.9, 0.9, //
            0.0, 7.0, f32::NAN, 0.0, 0.0, 1.0, 1.0,
        ];
        let detections = parse_ssd_rows(&values);
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].confidence, 0.9);
        assert_eq!(detections[0].bbox, [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(detections[1].confidence, 0.3);
    }

    #[test]
    fn missing_model_is_configuration_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = RtenClassifier::load(&dir.path().join("model.rten")).err().unwrap();
        assert!(err.is_configuration());
        assert!(matches!(err, PipelineError::MissingModel { .. }));
    }
}
