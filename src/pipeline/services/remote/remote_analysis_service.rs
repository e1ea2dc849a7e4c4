use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::task::Context;
use futures::task::Poll;
use futures::Future;
use tower::timeout::error::Elapsed;
use tower::timeout::TimeoutLayer;
use tower::util::BoxCloneSyncService;
use tower::{BoxError, Service, ServiceBuilder};

use super::VisionAnalyzer;
use crate::error::RemoteServiceError;

#[derive(Debug, Clone)]
pub struct RemoteRequest {
    pub image_path: PathBuf,
    pub prompt: String,
}

impl RemoteRequest {
    pub fn new(image_path: impl Into<PathBuf>, prompt: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            prompt: prompt.into(),
        }
    }
}

/// Remote analysis as a tower service, optionally bounded by a timeout.
pub type RemoteAnalysis = BoxCloneSyncService<RemoteRequest, String, RemoteServiceError>;

#[derive(Clone)]
pub struct RemoteAnalysisService {
    inner: Arc<dyn VisionAnalyzer>,
}

impl RemoteAnalysisService {
    pub fn new(inner: Arc<dyn VisionAnalyzer>) -> Self {
        Self { inner }
    }
}

impl Service<RemoteRequest> for RemoteAnalysisService {
    type Response = String;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: RemoteRequest) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            let text = inner.analyze(&req.image_path, &req.prompt).await?;
            Ok(text)
        })
    }
}

pub struct RemoteServiceBuilder {
    analyzer: Arc<dyn VisionAnalyzer>,
    timeout: Option<Duration>,
}

impl RemoteServiceBuilder {
    pub fn new(analyzer: Arc<dyn VisionAnalyzer>) -> Self {
        Self {
            analyzer,
            timeout: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> RemoteAnalysis {
        let timeout = self.timeout;
        tracing::debug!(
            "Building remote service for {} with timeout {:?}",
            self.analyzer.name(),
            timeout
        );

        let service = ServiceBuilder::new()
            .map_err(move |error: BoxError| into_remote_error(error, timeout))
            .option_layer(timeout.map(TimeoutLayer::new))
            .service(RemoteAnalysisService::new(self.analyzer));

        BoxCloneSyncService::new(service)
    }
}

fn into_remote_error(error: BoxError, timeout: Option<Duration>) -> RemoteServiceError {
    if error.is::<Elapsed>() {
        return RemoteServiceError::Timeout(timeout.unwrap_or_default());
    }
    match error.downcast::<RemoteServiceError>() {
        Ok(error) => *error,
        Err(error) => RemoteServiceError::Internal(error.to_string()),
    }
}
