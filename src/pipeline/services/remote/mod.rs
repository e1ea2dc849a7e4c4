pub mod gemini_client;
pub mod remote_analysis_service;
pub mod vision_analyzer;

pub use gemini_client::GeminiClient;
pub use remote_analysis_service::{
    RemoteAnalysis, RemoteAnalysisService, RemoteRequest, RemoteServiceBuilder,
};
pub use vision_analyzer::VisionAnalyzer;
