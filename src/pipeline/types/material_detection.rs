use std::fmt::Display;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::ColorSample;

pub const UNKNOWN_MATERIAL: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialShare {
    pub confidence: f32,
    /// Always a whole number of tenths.
    pub percentage: f32,
}

impl MaterialShare {
    pub fn tenths(&self) -> u32 {
        (self.percentage * 10.0).round().max(0.0) as u32
    }
}

/// Top-ranked materials, best first. Percentages are relative to the retained entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialComposition(IndexMap<String, MaterialShare>);

impl MaterialComposition {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn insert(&mut self, material: impl Into<String>, share: MaterialShare) {
        self.0.insert(material.into(), share);
    }

    pub fn get(&self, material: &str) -> Option<&MaterialShare> {
        self.0.get(material)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MaterialShare)> {
        self.0.iter().map(|(name, share)| (name.as_str(), share))
    }

    pub fn first(&self) -> Option<(&str, &MaterialShare)> {
        self.0.first().map(|(name, share)| (name.as_str(), share))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Summed in whole tenths, so a fully normalized composition totals exactly 100.
    pub fn total_percentage(&self) -> f32 {
        self.0.values().map(MaterialShare::tenths).sum::<u32>() as f32 / 10.0
    }
}

/// Output of the local, model-free material detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDetection {
    pub primary_material: String,
    pub composition: MaterialComposition,
    pub recyclability_score: u8,
    pub dominant_colors: Vec<ColorSample>,
    pub brightness: f32,
    pub std_dev: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MaterialDetection {
    pub fn failed(error: impl Display) -> Self {
        Self {
            primary_material: UNKNOWN_MATERIAL.to_string(),
            composition: MaterialComposition::new(),
            recyclability_score: 0,
            dominant_colors: Vec::new(),
            brightness: 0.0,
            std_dev: 0.0,
            error: Some(error.to_string()),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.primary_material == UNKNOWN_MATERIAL
    }

    /// Display form of the primary material, e.g. "plastic" -> "Plastic".
    pub fn primary_category(&self) -> String {
        capitalize(&self.primary_material)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
