use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tower::ServiceExt;
use tracing::{info, warn};

use crate::config::Configuration;
use crate::error::{AppError, ImageLoadError, RemoteServiceError};
use crate::pipeline::services::extraction::{ResponseExtractor, ANALYSIS_PROMPT};
use crate::pipeline::services::formatting::ResponseNormalizer;
use crate::pipeline::services::remote::{
    GeminiClient, RemoteAnalysis, RemoteRequest, RemoteServiceBuilder, VisionAnalyzer,
};
use crate::pipeline::services::scoring::MaterialDetector;
use crate::pipeline::types::{AnalysisResult, MaterialDetection, PartialAnalysis};

pub struct WasteAnalysisPipelineBuilder {
    configuration: Configuration,
    analyzer: Option<Arc<dyn VisionAnalyzer>>,
    remote_timeout: Option<Duration>,
}

impl WasteAnalysisPipelineBuilder {
    /// Replaces the Gemini client, e.g. with a local model or a test double.
    pub fn vision_analyzer(mut self, analyzer: Arc<dyn VisionAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<WasteAnalysisPipeline, AppError> {
        let configuration = self.configuration;
        configuration.validate()?;

        let analyzer = match self.analyzer {
            Some(analyzer) if configuration.remote.enabled => Some(analyzer),
            Some(_) => None,
            None if configuration.remote.active_api_key().is_some() => {
                Some(Arc::new(GeminiClient::new(&configuration.remote)?) as Arc<dyn VisionAnalyzer>)
            }
            None => None,
        };

        let timeout = self
            .remote_timeout
            .unwrap_or_else(|| configuration.remote.timeout());
        let remote = analyzer.map(|analyzer| {
            info!("Remote analysis via {} ({:?} timeout)", analyzer.name(), timeout);
            RemoteServiceBuilder::new(analyzer).timeout(timeout).build()
        });
        if remote.is_none() {
            info!("Remote analysis disabled, using local material detection only");
        }

        Ok(WasteAnalysisPipeline {
            detector: Arc::new(MaterialDetector::from_configuration(&configuration)),
            extractor: Arc::new(ResponseExtractor::new()?),
            normalizer: Arc::new(ResponseNormalizer::new(
                &configuration.normalizer,
                configuration.scoring.clone(),
            )?),
            remote,
            max_concurrent: configuration.batch.max_concurrent,
        })
    }
}

/// Runs local detection and the remote vision call side by side and merges them into one
/// `AnalysisResult`. Every call yields a well-formed record.
pub struct WasteAnalysisPipeline {
    detector: Arc<MaterialDetector>,
    extractor: Arc<ResponseExtractor>,
    normalizer: Arc<ResponseNormalizer>,
    remote: Option<RemoteAnalysis>,
    max_concurrent: usize,
}

impl WasteAnalysisPipeline {
    pub fn builder(configuration: Configuration) -> WasteAnalysisPipelineBuilder {
        WasteAnalysisPipelineBuilder {
            configuration,
            analyzer: None,
            remote_timeout: None,
        }
    }

    pub fn new(configuration: Configuration) -> Result<Self, AppError> {
        Self::builder(configuration).build()
    }

    pub fn is_remote_enabled(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn analyze(&self, image_path: impl AsRef<Path>) -> AnalysisResult {
        let image_path = image_path.as_ref().to_path_buf();
        let started = Instant::now();

        let (detection, remote) = tokio::join!(
            self.detect_local(image_path.clone()),
            self.call_remote(image_path.clone())
        );

        let result = match remote {
            Ok(raw_text) => self.merge(Some(&raw_text), detection),
            Err(e) => {
                warn!(
                    "Remote analysis of {} failed, keeping local result: {}",
                    image_path.display(),
                    e
                );
                self.merge(None, detection).with_error(e.to_string())
            }
        };

        info!(
            "Analyzed {} in {:?}: material={}, recyclable={}",
            image_path.display(),
            started.elapsed(),
            result.material,
            result.is_recyclable
        );
        result
    }

    /// Analyzes images with at most `batch.max_concurrent` in flight, results in input order.
    pub async fn analyze_batch(&self, image_paths: &[PathBuf]) -> Vec<AnalysisResult> {
        stream::iter(image_paths)
            .map(|path| self.analyze(path))
            .buffered(self.max_concurrent)
            .collect()
            .await
    }

    /// Combines text already obtained from a vision service with a local detection.
    pub fn merge(&self, raw_text: Option<&str>, detection: MaterialDetection) -> AnalysisResult {
        let partial = match raw_text {
            Some(text) => self.extractor.extract(text),
            None => PartialAnalysis::default(),
        };
        self.normalizer.finalize(partial, raw_text, detection)
    }

    async fn detect_local(&self, image_path: PathBuf) -> MaterialDetection {
        let detector = self.detector.clone();
        tokio::task::spawn_blocking(move || detector.detect_material(&image_path))
            .await
            .unwrap_or_else(|e| MaterialDetection::failed(ImageLoadError::Task(e.to_string())))
    }

    async fn call_remote(&self, image_path: PathBuf) -> Result<String, RemoteServiceError> {
        let Some(service) = self.remote.clone() else {
            return Err(RemoteServiceError::NotConfigured);
        };
        service
            .oneshot(RemoteRequest::new(image_path, ANALYSIS_PROMPT))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use image::{ImageBuffer, Rgb};

    use super::*;

    struct FixedAnalyzer(&'static str);

    #[async_trait]
    impl VisionAnalyzer for FixedAnalyzer {
        async fn analyze(&self, _image_path: &Path, _prompt: &str) -> Result<String, RemoteServiceError> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &'static str {
            "FixedAnalyzer"
        }
    }

    fn write_image(rgb: [u8; 3]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("ecoscan-{}.png", uuid::Uuid::new_v4()));
        ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(32, 32, Rgb(rgb))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_disabled_remote_ignores_analyzer() {
        let pipeline = WasteAnalysisPipeline::builder(Configuration::local_only())
            .vision_analyzer(Arc::new(FixedAnalyzer("unused")))
            .build()
            .unwrap();
        assert!(!pipeline.is_remote_enabled());
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let mut configuration = Configuration::local_only();
        configuration.scoring.top_k = 0;
        assert!(matches!(
            WasteAnalysisPipeline::new(configuration),
            Err(AppError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_local_only_reports_not_configured() {
        let path = write_image([255, 255, 255]);
        let pipeline = WasteAnalysisPipeline::new(Configuration::local_only()).unwrap();
        let result = pipeline.analyze(&path).await;
        std::fs::remove_file(&path).ok();

        assert_eq!(result.material_detection.primary_material, "plastic");
        assert_eq!(result.material, "Plastic");
        assert!(result.is_recyclable);
        assert!(!result.is_ewaste);
        assert!(result.full_analysis.is_empty());
        assert_eq!(
            result.error.as_deref(),
            Some(RemoteServiceError::NotConfigured.to_string().as_str())
        );
    }

    #[tokio::test]
    async fn test_remote_answer_overrides_local_guess() {
        let path = write_image([255, 255, 255]);
        let pipeline = WasteAnalysisPipeline::builder(Configuration::default())
            .vision_analyzer(Arc::new(FixedAnalyzer(
                "1. Is it recyclable? No\n2. Is it e-waste? Yes, it has a circuit board\n3. Material: electronic components",
            )))
            .build()
            .unwrap();
        let result = pipeline.analyze(&path).await;
        std::fs::remove_file(&path).ok();

        assert!(result.error.is_none());
        assert!(!result.is_recyclable);
        assert!(result.is_ewaste);
        assert_eq!(result.material, "Electronic");
        assert_eq!(result.material_detection.primary_material, "plastic");
    }

    #[tokio::test]
    async fn test_batch_keeps_input_order() {
        let white = write_image([255, 255, 255]);
        let missing = PathBuf::from("/definitely/missing.png");
        let pipeline = WasteAnalysisPipeline::new(Configuration::local_only()).unwrap();

        let results = pipeline.analyze_batch(&[white.clone(), missing]).await;
        std::fs::remove_file(&white).ok();

        assert_eq!(results.len(), 2);
        assert!(results[0].material_detection.error.is_none());
        assert!(results[1].material_detection.error.is_some());
        assert_eq!(results[1].material, "Unknown");
        assert_ne!(results[0].id, results[1].id);
    }

    struct CountingAnalyzer {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl VisionAnalyzer for CountingAnalyzer {
        async fn analyze(&self, _image_path: &Path, _prompt: &str) -> Result<String, RemoteServiceError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok("1. Is it recyclable? Yes".to_string())
        }

        fn name(&self) -> &'static str {
            "CountingAnalyzer"
        }
    }

    #[tokio::test]
    async fn test_batch_bounds_analyses_in_flight() {
        let path = write_image([255, 255, 255]);
        let analyzer = Arc::new(CountingAnalyzer {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let mut configuration = Configuration::default();
        configuration.batch.max_concurrent = 2;
        let pipeline = WasteAnalysisPipeline::builder(configuration)
            .vision_analyzer(analyzer.clone())
            .build()
            .unwrap();

        let paths = vec![path.clone(); 6];
        let results = pipeline.analyze_batch(&paths).await;
        std::fs::remove_file(&path).ok();

        assert_eq!(results.len(), 6);
        assert!(results.iter().all(|r| r.error.is_none()));
        assert_eq!(analyzer.peak.load(Ordering::SeqCst), 2);
    }
}
