use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::pipeline::types::SectionField;

// Main Application Error Type. Only construction-time failures surface here; a running
// analysis always degrades into an `AnalysisResult` instead.

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Remote Service Error: {0}")]
    Remote(#[from] RemoteServiceError),
    #[error("Failed to serialize analysis: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// Image Load Error Type
#[derive(Error, Debug)]
pub enum ImageLoadError {
    #[error("Could not load image from {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Image at {0} has no pixels")]
    Empty(PathBuf),
    #[error("Image loading task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("No indicator found for {0}")]
    IndicatorNotFound(SectionField),
    #[error("Neither yes nor no found for {0}")]
    NoAnswer(SectionField),
    #[error("No known material term found")]
    UnknownMaterial,
    #[error("Section {0} is empty")]
    EmptySection(SectionField),
}

#[derive(Error, Debug)]
pub enum RemoteServiceError {
    #[error("Remote vision service is not configured (missing API key)")]
    NotConfigured,
    #[error("Remote vision service timed out after {0:?}")]
    Timeout(Duration),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote service returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Remote service returned no text")]
    EmptyResponse,
    #[error("Failed to prepare image for upload: {0}")]
    ImagePreparation(String),
    #[error("Remote service failed: {0}")]
    Internal(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormattingError {
    #[error("Field {field} is {len} bytes, limit is {limit}")]
    FieldTooLarge {
        field: &'static str,
        len: usize,
        limit: usize,
    },
}
