use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Inclusive bounding box in RGB space with the weight it contributes to a material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    pub min: [u8; 3],
    pub max: [u8; 3],
    pub weight: f32,
}

impl ColorRange {
    pub fn new(min: [u8; 3], max: [u8; 3], weight: f32) -> Self {
        Self { min, max, weight }
    }

    pub fn contains(&self, rgb: [u8; 3]) -> bool {
        (0..3).all(|i| rgb[i] >= self.min[i] && rgb[i] <= self.max[i])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProfile {
    pub brightness_range: [f32; 2],
    pub std_dev_range: [f32; 2],
    pub color_ranges: Vec<ColorRange>,
}

impl MaterialProfile {
    pub fn brightness_matches(&self, brightness: f32) -> bool {
        brightness >= self.brightness_range[0] && brightness <= self.brightness_range[1]
    }

    pub fn std_dev_matches(&self, std_dev: f32) -> bool {
        std_dev >= self.std_dev_range[0] && std_dev <= self.std_dev_range[1]
    }
}

/// Material table in declaration order. Order matters: it breaks score ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialProfiles(IndexMap<String, MaterialProfile>);

impl MaterialProfiles {
    pub fn new(profiles: IndexMap<String, MaterialProfile>) -> Self {
        Self(profiles)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MaterialProfile)> {
        self.0.iter().map(|(name, profile)| (name.as_str(), profile))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.0.is_empty() {
            return Err("At least one material profile is required".to_string());
        }

        for (name, profile) in &self.0 {
            if profile.brightness_range[0] > profile.brightness_range[1] {
                return Err(format!("{name}: brightness range is inverted"));
            }
            if profile.std_dev_range[0] > profile.std_dev_range[1] {
                return Err(format!("{name}: std_dev range is inverted"));
            }
            for range in &profile.color_ranges {
                if (0..3).any(|i| range.min[i] > range.max[i]) {
                    return Err(format!("{name}: color range {range:?} is inverted"));
                }
                if range.weight < 0.0 {
                    return Err(format!("{name}: color range weight must not be negative"));
                }
            }
        }

        Ok(())
    }
}

impl Default for MaterialProfiles {
    fn default() -> Self {
        let mut profiles = IndexMap::new();

        profiles.insert(
            "plastic".to_string(),
            MaterialProfile {
                brightness_range: [150.0, 255.0],
                std_dev_range: [0.0, 60.0],
                color_ranges: vec![
                    ColorRange::new([200, 200, 200], [255, 255, 255], 0.5), // clear / white
                    ColorRange::new([0, 0, 150], [100, 150, 255], 0.3),     // blue bottles
                    ColorRange::new([0, 0, 0], [50, 50, 50], 0.2),          // black trays
                ],
            },
        );
        profiles.insert(
            "paper".to_string(),
            MaterialProfile {
                brightness_range: [140.0, 255.0],
                std_dev_range: [0.0, 50.0],
                color_ranges: vec![
                    ColorRange::new([210, 210, 210], [255, 255, 255], 0.4), // office paper
                    ColorRange::new([120, 85, 40], [210, 170, 130], 0.6),   // cardboard
                ],
            },
        );
        profiles.insert(
            "metal".to_string(),
            MaterialProfile {
                brightness_range: [80.0, 200.0],
                std_dev_range: [30.0, 90.0],
                color_ranges: vec![
                    ColorRange::new([110, 110, 110], [200, 200, 200], 0.5), // aluminium
                    ColorRange::new([50, 50, 50], [110, 110, 110], 0.3),    // steel
                ],
            },
        );
        profiles.insert(
            "glass".to_string(),
            MaterialProfile {
                brightness_range: [100.0, 230.0],
                std_dev_range: [20.0, 80.0],
                color_ranges: vec![
                    ColorRange::new([0, 100, 50], [120, 200, 150], 0.4),    // green
                    ColorRange::new([120, 60, 0], [200, 120, 60], 0.3),     // amber
                    ColorRange::new([170, 170, 170], [240, 240, 240], 0.3), // clear
                ],
            },
        );
        profiles.insert(
            "fabric".to_string(),
            MaterialProfile {
                brightness_range: [40.0, 180.0],
                std_dev_range: [40.0, 120.0],
                color_ranges: vec![
                    ColorRange::new([150, 0, 0], [255, 90, 90], 0.3),   // dyed red
                    ColorRange::new([20, 40, 90], [90, 110, 180], 0.4), // denim
                ],
            },
        );
        profiles.insert(
            "organic".to_string(),
            MaterialProfile {
                brightness_range: [30.0, 160.0],
                std_dev_range: [30.0, 110.0],
                color_ranges: vec![
                    ColorRange::new([0, 100, 0], [120, 255, 100], 0.5), // leaves
                    ColorRange::new([60, 30, 0], [150, 100, 60], 0.5),  // peel / soil
                ],
            },
        );

        Self(profiles)
    }
}
