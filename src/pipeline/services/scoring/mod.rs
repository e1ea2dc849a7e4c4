pub mod material_detector;
pub mod material_scoring_engine;

pub use material_detector::MaterialDetector;
pub use material_scoring_engine::MaterialScoringEngine;
