pub mod orchestration;
pub mod services;
pub mod types;

pub use orchestration::{WasteAnalysisPipeline, WasteAnalysisPipelineBuilder};
pub use services::{MaterialDetector, ResponseExtractor, ResponseNormalizer, VisionAnalyzer};
pub use types::{AnalysisResult, MaterialDetection, PartialAnalysis};
