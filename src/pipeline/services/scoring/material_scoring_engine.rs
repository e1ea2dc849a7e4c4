use std::sync::Arc;

use crate::config::ScoringConfig;
use crate::pipeline::types::{
    ColorFeatures, MaterialComposition, MaterialDetection, MaterialProfile, MaterialProfiles,
    MaterialShare, UNKNOWN_MATERIAL,
};

/// Maps color features onto per-material confidences using the profile table.
#[derive(Debug, Clone)]
pub struct MaterialScoringEngine {
    profiles: Arc<MaterialProfiles>,
    config: ScoringConfig,
}

impl MaterialScoringEngine {
    pub fn new(profiles: Arc<MaterialProfiles>, config: ScoringConfig) -> Self {
        Self { profiles, config }
    }

    /// Confidence of every profile, in table order, each capped at 1.0.
    pub fn score_all(&self, features: &ColorFeatures) -> Vec<(&str, f32)> {
        self.profiles
            .iter()
            .map(|(name, profile)| (name, self.score_material(profile, features)))
            .collect()
    }

    pub fn score(&self, features: &ColorFeatures) -> MaterialDetection {
        let mut ranked: Vec<(&str, f32)> = self
            .score_all(features)
            .into_iter()
            .filter(|(_, score)| *score > 0.0)
            .collect();

        // Stable: exact ties keep declaration order.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(self.config.top_k);

        let composition = normalize_composition(&ranked);
        let recyclability_score = self.recyclability_score(&composition);
        let primary_material = composition
            .first()
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| UNKNOWN_MATERIAL.to_string());

        tracing::debug!(
            "Material scores: primary={}, composition={:?}, recyclability={}",
            primary_material,
            composition,
            recyclability_score
        );

        MaterialDetection {
            primary_material,
            composition,
            recyclability_score,
            dominant_colors: features.dominant_colors.clone(),
            brightness: features.brightness,
            std_dev: features.std_dev,
            error: None,
        }
    }

    fn score_material(&self, profile: &MaterialProfile, features: &ColorFeatures) -> f32 {
        let mut score = 0.0;

        if profile.brightness_matches(features.brightness) {
            score += self.config.brightness_weight;
        }

        if profile.std_dev_matches(features.std_dev) {
            score += self.config.std_dev_weight;
        }

        let total_weight = features.total_weight();
        if total_weight > 0.0 {
            for range in &profile.color_ranges {
                let inside: f32 = features
                    .dominant_colors
                    .iter()
                    .filter(|c| range.contains(c.rgb))
                    .map(|c| c.weight)
                    .sum();
                score += (inside / total_weight) * range.weight * self.config.color_amplification;
            }
        }

        score.min(1.0)
    }

    /// Share of the retained composition that belongs to recyclable materials, 0-100.
    pub fn recyclability_score(&self, composition: &MaterialComposition) -> u8 {
        let tenths: u32 = composition
            .iter()
            .filter(|(name, _)| self.config.is_recyclable(name))
            .map(|(_, share)| share.tenths())
            .sum();
        ((tenths + 5) / 10).min(100) as u8
    }
}

/// Percentages relative to the retained candidates, floored to whole tenths so the
/// total never exceeds 100.
fn normalize_composition(ranked: &[(&str, f32)]) -> MaterialComposition {
    let mut composition = MaterialComposition::new();
    let total: f64 = ranked.iter().map(|(_, score)| *score as f64).sum();
    if total <= 0.0 {
        return composition;
    }

    for (name, score) in ranked {
        let share = *score as f64 / total * 100.0;
        // The epsilon absorbs float noise below an exact tenth; it cannot lift the sum
        // of three or fewer floors past 1000.
        let tenths = (share * 10.0 + 1e-3).floor() as u32;
        composition.insert(
            *name,
            MaterialShare {
                confidence: *score,
                percentage: tenths as f32 / 10.0,
            },
        );
    }

    composition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{ColorRange, ColorSample};
    use indexmap::IndexMap;

    fn engine() -> MaterialScoringEngine {
        MaterialScoringEngine::new(
            Arc::new(MaterialProfiles::default()),
            ScoringConfig::default(),
        )
    }

    fn uniform(rgb: [u8; 3], std_dev: f32) -> ColorFeatures {
        let brightness = rgb.iter().map(|&c| c as f32).sum::<f32>() / 3.0;
        let mut dominant_colors = vec![ColorSample::new(rgb, 1.0)];
        dominant_colors.extend((0..4).map(|_| ColorSample::new(rgb, 0.0)));
        ColorFeatures {
            brightness,
            std_dev,
            dominant_colors,
        }
    }

    #[test]
    fn test_white_favors_plastic_and_paper() {
        let detection = engine().score(&uniform([255, 255, 255], 0.0));

        assert_eq!(detection.primary_material, "plastic");
        let names: Vec<_> = detection.composition.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["plastic", "paper"]);
        assert!(detection.composition.get("organic").is_none());
        assert!(detection.composition.get("fabric").is_none());
        assert_eq!(detection.composition.get("plastic").unwrap().percentage, 50.0);
        assert_eq!(detection.recyclability_score, 100);
    }

    #[test]
    fn test_scores_are_capped() {
        let engine = engine();
        for (_, score) in engine.score_all(&uniform([255, 255, 255], 0.0)) {
            assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn test_leafy_green_is_organic() {
        let detection = engine().score(&uniform([40, 160, 30], 70.0));
        assert_eq!(detection.primary_material, "organic");
        let names: Vec<_> = detection.composition.iter().map(|(n, _)| n).collect();
        // metal and glass tie on the std_dev band alone, metal is declared first
        assert_eq!(names, vec!["organic", "fabric", "metal"]);
        assert_eq!(detection.composition.get("metal").unwrap().percentage, 11.7);
        assert_eq!(detection.recyclability_score, 12);
    }

    #[test]
    fn test_composition_is_bounded_and_normalized() {
        let features = ColorFeatures {
            brightness: 150.0,
            std_dev: 45.0,
            dominant_colors: vec![
                ColorSample::new([150, 150, 150], 0.4),
                ColorSample::new([160, 120, 80], 0.3),
                ColorSample::new([60, 140, 90], 0.2),
                ColorSample::new([220, 220, 220], 0.1),
                ColorSample::new([150, 150, 150], 0.0),
            ],
        };
        let detection = engine().score(&features);

        assert!(detection.composition.len() <= 3);
        assert!(detection.composition.total_percentage() <= 100.0);
        for (_, share) in detection.composition.iter() {
            assert!((0.0..=1.0).contains(&share.confidence));
            assert!((0.0..=100.0).contains(&share.percentage));
        }
        assert!(detection.recyclability_score <= 100);
    }

    #[test]
    fn test_nothing_matches_is_unknown() {
        let mut table = IndexMap::new();
        table.insert(
            "metal".to_string(),
            MaterialProfile {
                brightness_range: [100.0, 120.0],
                std_dev_range: [50.0, 60.0],
                color_ranges: vec![ColorRange::new([100, 100, 100], [120, 120, 120], 0.5)],
            },
        );
        let engine = MaterialScoringEngine::new(
            Arc::new(MaterialProfiles::new(table)),
            ScoringConfig::default(),
        );

        let detection = engine.score(&uniform([0, 0, 0], 0.0));
        assert_eq!(detection.primary_material, UNKNOWN_MATERIAL);
        assert!(detection.composition.is_empty());
        assert_eq!(detection.recyclability_score, 0);
    }

    #[test]
    fn test_exact_tie_keeps_declaration_order() {
        let profile = MaterialProfile {
            brightness_range: [0.0, 255.0],
            std_dev_range: [0.0, 255.0],
            color_ranges: vec![],
        };
        let mut table = IndexMap::new();
        table.insert("glass".to_string(), profile.clone());
        table.insert("fabric".to_string(), profile.clone());
        table.insert("metal".to_string(), profile.clone());
        table.insert("paper".to_string(), profile);
        let engine = MaterialScoringEngine::new(
            Arc::new(MaterialProfiles::new(table)),
            ScoringConfig::default(),
        );

        let detection = engine.score(&uniform([10, 10, 10], 5.0));
        let names: Vec<_> = detection.composition.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["glass", "fabric", "metal"]);
        for (_, share) in detection.composition.iter() {
            assert_eq!(share.percentage, 33.3);
        }
        // glass + metal are recyclable: 66.6 rounds to 67
        assert_eq!(detection.recyclability_score, 67);
    }

    #[test]
    fn test_percentages_never_sum_past_one_hundred() {
        let steps = [0.05_f32, 0.1, 0.15, 0.2, 0.3, 0.35, 0.5, 0.7, 0.95, 1.0];
        for a in steps {
            for b in steps {
                for c in steps {
                    let composition = normalize_composition(&[("a", a), ("b", b), ("c", c)]);
                    let total = composition.total_percentage();
                    assert!(total <= 100.0, "{a} {b} {c} -> {total}");
                    assert!(total >= 99.7, "{a} {b} {c} -> {total}");
                    for (_, share) in composition.iter() {
                        assert_eq!(share.percentage, share.tenths() as f32 / 10.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_even_split_totals_exactly_one_hundred() {
        let composition = normalize_composition(&[("plastic", 0.5), ("paper", 0.5)]);
        assert_eq!(composition.total_percentage(), 100.0);
    }

    #[test]
    fn test_empty_composition_scores_zero() {
        assert_eq!(engine().recyclability_score(&MaterialComposition::new()), 0);
    }
}
