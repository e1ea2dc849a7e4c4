use std::path::Path;

use async_trait::async_trait;

use crate::error::RemoteServiceError;

/// An external text/vision generation service that answers a prompt about an image.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    async fn analyze(&self, image_path: &Path, prompt: &str) -> Result<String, RemoteServiceError>;
    fn name(&self) -> &'static str;
}
