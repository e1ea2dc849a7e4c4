use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MaterialDetection;

pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Canonical record handed to the persistence and presentation layers.
///
/// Every text field is always present, possibly empty. Text is not HTML-escaped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub is_recyclable: bool,
    pub is_ewaste: bool,
    pub material: String,
    pub full_analysis: String,
    pub recycling_instructions: String,
    pub environmental_impact: String,
    pub disposal_recommendations: String,
    pub summary: Vec<String>,
    pub material_detection: MaterialDetection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// A record with safe defaults around the given local detection.
    pub fn new(material_detection: MaterialDetection) -> Self {
        Self {
            id: Uuid::new_v4(),
            analyzed_at: Utc::now(),
            is_recyclable: false,
            is_ewaste: false,
            material: UNKNOWN_CATEGORY.to_string(),
            full_analysis: String::new(),
            recycling_instructions: String::new(),
            environmental_impact: String::new(),
            disposal_recommendations: String::new(),
            summary: Vec::new(),
            material_detection,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// True when only the local detector contributed.
    pub fn is_degraded(&self) -> bool {
        self.full_analysis.is_empty() && self.error.is_some()
    }
}
