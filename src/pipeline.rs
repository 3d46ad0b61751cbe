use anyhow::Result;
use image::RgbImage;
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::{Classification, ClampedRegion};

/// Data that flows through the pipeline.
/// Each PipelineData is one image region with whatever has been learned about it so far.
#[derive(Clone)]
pub struct PipelineData {
    /// Working image: the full input, or a crop of it
    pub image: Arc<RgbImage>,

    /// The image the pipeline was started with (shared via Arc)
    pub original: Arc<RgbImage>,

    /// Crop box in the original image (None means full image)
    pub region: Option<ClampedRegion>,

    /// Detector score that produced this region
    pub detection_confidence: Option<f32>,

    pub classification: Option<Classification>,
}

impl PipelineData {
    /// Create PipelineData for a full image
    pub fn from_image(original: Arc<RgbImage>) -> Self {
        Self {
            image: Arc::clone(&original),
            original,
            region: None,
            detection_confidence: None,
            classification: None,
        }
    }

    /// Create PipelineData for a detected region of an image
    pub fn from_region(
        image: RgbImage,
        original: Arc<RgbImage>,
        region: ClampedRegion,
        detection_confidence: f32,
    ) -> Self {
        Self {
            image: Arc::new(image),
            original,
            region: Some(region),
            detection_confidence: Some(detection_confidence),
            classification: None,
        }
    }
}

/// Where intermediate step images are written
#[derive(Clone, Debug)]
pub struct DebugConfig {
    pub output_dir: PathBuf,
}

impl DebugConfig {
    /// The directory must be empty or non-existent
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self { output_dir })
    }

    /// Debug config rooted in a subdirectory, one per pipeline run
    pub fn scoped(&self, name: &str) -> Self {
        Self {
            output_dir: self.output_dir.join(name),
        }
    }

    fn save_step<'i>(
        &self,
        step_index: usize,
        step_name: &str,
        images: impl Iterator<Item = &'i RgbImage>,
    ) -> Result<()> {
        let step_dir_name = format!(
            "{:02}_{}",
            step_index,
            step_name.to_lowercase().replace(' ', "_")
        );
        let step_dir = self.output_dir.join(&step_dir_name);
        std::fs::create_dir_all(&step_dir)?;

        let mut count = 0;
        for (idx, image) in images.enumerate() {
            save_png(image, &step_dir.join(format!("{:02}.png", idx + 1)))?;
            count += 1;
        }

        debug!("  Debug: saved {} images to {}/", count, step_dir_name);
        Ok(())
    }
}

fn save_png(image: &RgbImage, path: &Path) -> Result<()> {
    image
        .save(path)
        .map_err(|e| anyhow::anyhow!("Failed to save debug image {}: {}", path.display(), e))
}

/// Context available to all pipeline steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep {
    /// Process data and return transformed data
    /// Steps can split data (1 → many), filter (many → fewer), or transform (many → many)
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>>;

    /// Human-readable name for this step (used in logs and debug output)
    fn name(&self) -> &str;
}

/// Composable pipeline builder
pub struct Pipeline<'a> {
    steps: Vec<Box<dyn PipelineStep + 'a>>,
    context: PipelineContext,
}

impl<'a> Pipeline<'a> {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    /// Save every step's output images under `debug`
    pub fn with_debug(mut self, debug: Option<DebugConfig>) -> Self {
        self.context.debug = debug;
        self
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: impl PipelineStep + 'a) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Run the pipeline sequentially on an input image
    pub fn run(&self, input: Arc<RgbImage>) -> Result<Vec<PipelineData>> {
        if let Some(debug_config) = &self.context.debug {
            debug_config.save_step(0, "input", std::iter::once(input.as_ref()))?;
        }

        // Start with a single PipelineData containing the full image
        let mut data = vec![PipelineData::from_image(input)];

        for (step_idx, step) in self.steps.iter().enumerate() {
            debug!("Running step: {} (processing {} items)", step.name(), data.len());

            data = step.process(data, &self.context)?;

            if let Some(debug_config) = &self.context.debug {
                debug_config.save_step(step_idx + 1, step.name(), data.iter().map(|d| d.image.as_ref()))?;
            }

            debug!("  → {} items", data.len());
        }

        Ok(data)
    }
}

impl Default for Pipeline<'_> {
    fn default() -> Self {
        Self::new()
    }
}
