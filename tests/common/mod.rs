#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from wastesort for tests
pub use wastesort::{
    Classification, ClampedRegion, Detection, InferencePipeline, ModelContext, PipelineConfig,
    RegionReport, WasteLabel,
};
