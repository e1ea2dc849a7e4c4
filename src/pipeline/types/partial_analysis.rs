use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// The six answers the vision prompt asks for, in prompt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionField {
    Recyclable,
    Ewaste,
    Material,
    RecyclingInstructions,
    EnvironmentalImpact,
    DisposalRecommendations,
}

impl SectionField {
    pub const ALL: [SectionField; 6] = [
        SectionField::Recyclable,
        SectionField::Ewaste,
        SectionField::Material,
        SectionField::RecyclingInstructions,
        SectionField::EnvironmentalImpact,
        SectionField::DisposalRecommendations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionField::Recyclable => "recyclable",
            SectionField::Ewaste => "ewaste",
            SectionField::Material => "material",
            SectionField::RecyclingInstructions => "recycling_instructions",
            SectionField::EnvironmentalImpact => "environmental_impact",
            SectionField::DisposalRecommendations => "disposal_recommendations",
        }
    }
}

impl fmt::Display for SectionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whatever the extractor could locate in the remote text. Unset means "not found".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialAnalysis {
    pub is_recyclable: Option<bool>,
    pub is_ewaste: Option<bool>,
    pub material: Option<String>,
    pub recycling_instructions: Option<String>,
    pub environmental_impact: Option<String>,
    pub disposal_recommendations: Option<String>,
    pub unresolved: Vec<ExtractionError>,
}

impl PartialAnalysis {
    pub fn is_empty(&self) -> bool {
        self.is_recyclable.is_none()
            && self.is_ewaste.is_none()
            && self.material.is_none()
            && self.recycling_instructions.is_none()
            && self.environmental_impact.is_none()
            && self.disposal_recommendations.is_none()
    }

    pub fn resolved_count(&self) -> usize {
        [
            self.is_recyclable.is_some(),
            self.is_ewaste.is_some(),
            self.material.is_some(),
            self.recycling_instructions.is_some(),
            self.environmental_impact.is_some(),
            self.disposal_recommendations.is_some(),
        ]
        .iter()
        .filter(|found| **found)
        .count()
    }
}
