pub mod config;
pub mod decode;
pub mod detection;
pub mod error;
pub mod inference;
pub mod models;
pub mod pipeline;

pub use config::PipelineConfig;
pub use decode::{decode_image, load_image};
pub use detection::InferencePipeline;
pub use detection::annotate::AnnotationStyle;
pub use error::PipelineError;
pub use inference::{
    Classifier, InputTensor, ModelContext, ModelPaths, ObjectDetector, TensorLayout,
};
pub use models::{Classification, ClampedRegion, Detection, Region, RegionReport, WasteLabel};
pub use pipeline::{DebugConfig, Pipeline, PipelineContext, PipelineData, PipelineStep};
