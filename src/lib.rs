pub mod config;
pub mod error;
pub mod pipeline;

pub use crate::config::Configuration;
pub use error::{
    AppError, ConfigError, ExtractionError, FormattingError, ImageLoadError, RemoteServiceError,
};
pub use pipeline::{AnalysisResult, MaterialDetection, WasteAnalysisPipeline};
