use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use super::VisionAnalyzer;
use crate::config::RemoteConfig;
use crate::error::RemoteServiceError;

const USER_AGENT: &str = concat!("ecoscan/", env!("CARGO_PKG_VERSION"));
const IMAGE_MIME: &str = "image/jpeg";

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, joined.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: Vec<&str> = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        let text = text.join("\n");
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_dimension: u32,
}

impl GeminiClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteServiceError> {
        let api_key = config
            .active_api_key()
            .ok_or(RemoteServiceError::NotConfigured)?
            .to_string();
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            max_dimension: config.max_upload_dimension,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl VisionAnalyzer for GeminiClient {
    async fn analyze(&self, image_path: &Path, prompt: &str) -> Result<String, RemoteServiceError> {
        let path: PathBuf = image_path.to_path_buf();
        let max_dimension = self.max_dimension;
        let data = tokio::task::spawn_blocking(move || encode_image(&path, max_dimension))
            .await
            .map_err(|e| RemoteServiceError::Internal(e.to_string()))??;

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: Some(prompt.to_string()),
                        ..Default::default()
                    },
                    Part {
                        inline_data: Some(InlineData {
                            mime_type: IMAGE_MIME.to_string(),
                            data,
                        }),
                        ..Default::default()
                    },
                ],
            }],
        };

        tracing::debug!("Sending {} to {}", image_path.display(), self.model);
        let response = self
            .http
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteServiceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        body.text().ok_or(RemoteServiceError::EmptyResponse)
    }

    fn name(&self) -> &'static str {
        "GeminiClient"
    }
}

/// Reads the image, shrinks it to `max_dimension` on the long side and returns base64 JPEG.
fn encode_image(path: &Path, max_dimension: u32) -> Result<String, RemoteServiceError> {
    let image = image::open(path).map_err(|e| RemoteServiceError::ImagePreparation(e.to_string()))?;
    let image = if image.width() > max_dimension || image.height() > max_dimension {
        image.thumbnail(max_dimension, max_dimension)
    } else {
        image
    };

    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image.to_rgb8())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .map_err(|e| RemoteServiceError::ImagePreparation(e.to_string()))?;

    Ok(STANDARD.encode(bytes))
}
