pub mod annotate;
pub mod steps;

use anyhow::Result;
use image::RgbImage;
use log::debug;
use std::cell::Cell;
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::inference::ModelContext;
use crate::models::{Classification, RegionReport};
use crate::pipeline::{DebugConfig, Pipeline};
use annotate::AnnotationStyle;
use steps::{ClassificationStep, DetectionStep};

/// Detect-then-classify orchestrator over a loaded [`ModelContext`].
///
/// Calling either mode twice with the same image gives the same result.
/// The only state carried between calls is the debug run counter.
pub struct InferencePipeline<'a> {
    models: &'a ModelContext,
    config: PipelineConfig,
    style: AnnotationStyle,
    debug: Option<DebugConfig>,
    debug_runs: Cell<usize>,
}

impl<'a> InferencePipeline<'a> {
    pub fn new(models: &'a ModelContext, config: PipelineConfig) -> Self {
        let style = AnnotationStyle::new(config.box_color, config.font_scale);
        Self {
            models,
            config,
            style,
            debug: None,
            debug_runs: Cell::new(0),
        }
    }

    pub fn with_style(mut self, style: AnnotationStyle) -> Self {
        self.style = style;
        self
    }

    /// Dump intermediate images of every run below `debug`
    pub fn with_debug(mut self, debug: DebugConfig) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Debug directory for the next run, e.g. `03_regions`
    fn debug_scope(&self, mode: &str) -> Option<DebugConfig> {
        let debug = self.debug.as_ref()?;
        let run = self.debug_runs.get() + 1;
        self.debug_runs.set(run);
        Some(debug.scoped(&format!("{:02}_{}", run, mode)))
    }

    fn classification_step(&self, min_confidence: Option<f32>) -> ClassificationStep<'a> {
        ClassificationStep {
            classifier: self.models.classifier(),
            input_size: self.config.classifier_input_size,
            layout: self.config.classifier_layout,
            min_confidence,
        }
    }

    /// Classify the image as a whole.
    ///
    /// Results below `whole_image_threshold` are reported as `NoObjectFound`
    /// with their original confidence.
    pub fn classify_whole(&self, image: &RgbImage) -> Result<Classification> {
        let pipeline = Pipeline::new()
            .with_debug(self.debug_scope("whole_image"))
            .add_step(self.classification_step(Some(self.config.whole_image_threshold)));

        pipeline
            .run(Arc::new(image.clone()))?
            .into_iter()
            .next()
            .and_then(|item| item.classification)
            .ok_or_else(|| anyhow::anyhow!("Classifier produced no result"))
    }

    /// Detect objects, classify each crop and draw the results on a copy of `image`.
    ///
    /// Every retained detection yields a real label. When nothing survives the
    /// detection threshold the image is returned unchanged together with a
    /// single `NoObjectFound` result of zero confidence.
    pub fn classify_regions(&self, image: &RgbImage) -> Result<RegionReport> {
        let detector = self.models.detector()?;

        let pipeline = Pipeline::new()
            .with_debug(self.debug_scope("regions"))
            .add_step(DetectionStep {
                detector,
                input_size: self.config.detector_input_size,
                scale: self.config.detector_scale,
                mean: self.config.detector_mean,
                layout: self.config.detector_layout,
                threshold: self.config.detection_threshold,
            })
            .add_step(self.classification_step(None));

        let original = Arc::new(image.clone());
        let results: Vec<Classification> = pipeline
            .run(Arc::clone(&original))?
            .into_iter()
            .filter_map(|item| item.classification)
            .collect();

        // Every crop has been dropped, so this is normally the last reference
        let mut annotated = Arc::try_unwrap(original).unwrap_or_else(|shared| (*shared).clone());

        if results.is_empty() {
            debug!(
                "No detections above {}, reporting no object",
                self.config.detection_threshold
            );
            return Ok(RegionReport {
                image: annotated,
                results: vec![Classification::no_object()],
            });
        }

        annotate::draw_annotations(&mut annotated, &results, &self.style);

        Ok(RegionReport {
            image: annotated,
            results,
        })
    }
}
