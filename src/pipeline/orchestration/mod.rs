pub mod waste_analysis_pipeline;

pub use waste_analysis_pipeline::{WasteAnalysisPipeline, WasteAnalysisPipelineBuilder};
