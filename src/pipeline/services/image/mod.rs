pub mod color_feature_extractor;
mod kmeans;

pub use color_feature_extractor::ColorFeatureExtractor;
