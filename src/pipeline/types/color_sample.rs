use serde::{Deserialize, Serialize};

/// A cluster centroid in canonical R,G,B order, weighted by the share of pixels it covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorSample {
    pub rgb: [u8; 3],
    pub weight: f32,
}

impl ColorSample {
    pub fn new(rgb: [u8; 3], weight: f32) -> Self {
        Self { rgb, weight }
    }
}

/// Aggregate color statistics of a size-normalized image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorFeatures {
    /// Mean of all channel values, 0-255.
    pub brightness: f32,
    /// Standard deviation across all channel values.
    pub std_dev: f32,
    /// Exactly `k` entries, heaviest first. Padding entries carry weight 0.
    pub dominant_colors: Vec<ColorSample>,
}

impl ColorFeatures {
    pub fn total_weight(&self) -> f32 {
        self.dominant_colors.iter().map(|c| c.weight).sum()
    }
}
