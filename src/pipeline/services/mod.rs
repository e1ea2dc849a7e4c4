pub mod extraction;
pub mod formatting;
pub mod image;
pub mod remote;
pub mod scoring;

pub use extraction::ResponseExtractor;
pub use formatting::ResponseNormalizer;
pub use image::ColorFeatureExtractor;
pub use remote::{GeminiClient, VisionAnalyzer};
pub use scoring::{MaterialDetector, MaterialScoringEngine};
