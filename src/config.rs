use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pipeline::types::MaterialProfiles;

const ENV_PREFIX: &str = "ECOSCAN";
const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Top-level configuration, loaded once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub features: FeatureConfig,
    pub scoring: ScoringConfig,
    pub remote: RemoteConfig,
    pub normalizer: NormalizerConfig,
    pub batch: BatchConfig,
    pub profiles: MaterialProfiles,
}

/// Color feature extraction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub resize_width: u32,
    pub resize_height: u32,
    pub dominant_colors: usize,
    pub kmeans_max_iterations: usize,
}

/// Fixed weights of the material scoring rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub brightness_weight: f32,
    pub std_dev_weight: f32,
    pub color_amplification: f32,
    pub top_k: usize,
    pub recyclable_materials: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Longest image side sent upstream; larger images are shrunk first.
    pub max_upload_dimension: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub max_field_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Analyses in flight at once, each one image decode plus one remote call.
    pub max_concurrent: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            features: FeatureConfig::default(),
            scoring: ScoringConfig::default(),
            remote: RemoteConfig::default(),
            normalizer: NormalizerConfig::default(),
            batch: BatchConfig::default(),
            profiles: MaterialProfiles::default(),
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            resize_width: 100,
            resize_height: 100,
            dominant_colors: 5,
            kmeans_max_iterations: 20,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            brightness_weight: 0.3,
            std_dev_weight: 0.2,
            color_amplification: 2.0,
            top_k: 3,
            recyclable_materials: ["paper", "plastic", "glass", "metal"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            timeout_secs: 30,
            max_upload_dimension: 4000,
        }
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            max_field_bytes: 64 * 1024,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The key to use, if the remote path is usable at all.
    pub fn active_api_key(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }
}

impl ScoringConfig {
    pub fn is_recyclable(&self, material: &str) -> bool {
        self.recyclable_materials
            .iter()
            .any(|m| m.eq_ignore_ascii_case(material))
    }
}

impl Configuration {
    /// Layered load: built-in defaults, then the optional file, then `ECOSCAN__*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let mut configuration: Configuration = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        if configuration.remote.api_key.is_none() {
            configuration.remote.api_key = std::env::var(API_KEY_VAR).ok();
        }

        configuration.validate()?;
        Ok(configuration)
    }

    /// Configuration that never calls the remote service.
    pub fn local_only() -> Self {
        let mut configuration = Self::default();
        configuration.remote.enabled = false;
        configuration
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.features.resize_width == 0 || self.features.resize_height == 0 {
            return Err(ConfigError::Invalid(
                "Resize dimensions must be greater than 0".to_string(),
            ));
        }

        if self.features.dominant_colors == 0 {
            return Err(ConfigError::Invalid(
                "Dominant color count must be greater than 0".to_string(),
            ));
        }

        if self.features.kmeans_max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "K-means iterations must be greater than 0".to_string(),
            ));
        }

        if self.scoring.top_k == 0 {
            return Err(ConfigError::Invalid(
                "Composition size must be greater than 0".to_string(),
            ));
        }

        for (name, weight) in [
            ("brightness", self.scoring.brightness_weight),
            ("std_dev", self.scoring.std_dev_weight),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ConfigError::Invalid(format!(
                    "{name} weight must be between 0.0 and 1.0"
                )));
            }
        }

        if self.scoring.color_amplification <= 0.0 {
            return Err(ConfigError::Invalid(
                "Color amplification must be positive".to_string(),
            ));
        }

        if self.remote.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "Remote timeout must be greater than 0".to_string(),
            ));
        }

        if self.normalizer.max_field_bytes == 0 {
            return Err(ConfigError::Invalid(
                "Normalizer field limit must be greater than 0".to_string(),
            ));
        }

        if self.batch.max_concurrent == 0 {
            return Err(ConfigError::Invalid(
                "Batch concurrency must be greater than 0".to_string(),
            ));
        }

        self.profiles.validate().map_err(ConfigError::Invalid)
    }
}
