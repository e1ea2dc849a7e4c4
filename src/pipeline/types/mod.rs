mod analysis_result;
mod color_sample;
mod material_detection;
mod material_profile;
mod partial_analysis;

pub use analysis_result::{AnalysisResult, UNKNOWN_CATEGORY};
pub use color_sample::{ColorFeatures, ColorSample};
pub use material_detection::{
    MaterialComposition, MaterialDetection, MaterialShare, UNKNOWN_MATERIAL,
};
pub use material_profile::{ColorRange, MaterialProfile, MaterialProfiles};
pub use partial_analysis::{PartialAnalysis, SectionField};
