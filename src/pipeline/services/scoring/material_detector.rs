use std::path::Path;
use std::sync::Arc;

use crate::config::Configuration;
use crate::pipeline::services::image::ColorFeatureExtractor;
use crate::pipeline::types::MaterialDetection;

use super::MaterialScoringEngine;

/// Local, model-free material detection: image path in, `MaterialDetection` out.
#[derive(Debug, Clone)]
pub struct MaterialDetector {
    extractor: ColorFeatureExtractor,
    engine: MaterialScoringEngine,
}

impl MaterialDetector {
    pub fn new(extractor: ColorFeatureExtractor, engine: MaterialScoringEngine) -> Self {
        Self { extractor, engine }
    }

    pub fn from_configuration(configuration: &Configuration) -> Self {
        Self::new(
            ColorFeatureExtractor::new(&configuration.features),
            MaterialScoringEngine::new(
                Arc::new(configuration.profiles.clone()),
                configuration.scoring.clone(),
            ),
        )
    }

    /// Never fails: a load error becomes an "unknown" detection carrying the error text.
    pub fn detect_material(&self, image_path: &Path) -> MaterialDetection {
        match self.extractor.extract(image_path) {
            Ok(features) => self.engine.score(&features),
            Err(e) => {
                tracing::error!("Error in material detection: {}", e);
                MaterialDetection::failed(e)
            }
        }
    }
}
