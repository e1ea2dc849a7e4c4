use regex::Regex;

use super::summary::SummaryWriter;
use crate::config::{NormalizerConfig, ScoringConfig};
use crate::error::FormattingError;
use crate::pipeline::types::{AnalysisResult, MaterialDetection, PartialAnalysis, UNKNOWN_CATEGORY};

/// Heading echoes the model tends to repeat at the start of a field.
const RECYCLING_HEADINGS: &[&str] = &["how to recycle:", "recycling instructions:"];
const IMPACT_HEADINGS: &[&str] = &["environmental impact:", "impact:"];
const DISPOSAL_HEADINGS: &[&str] = &["disposal recommendations:", "best disposal method:"];

#[derive(Debug, Clone)]
struct TextCleaner {
    tags: Regex,
    emphasis: Regex,
    line_prefix: Regex,
    whitespace: Regex,
}

impl TextCleaner {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            tags: Regex::new(r"<[^>]*>")?,
            emphasis: Regex::new(r"[*_]{2,}")?,
            line_prefix: Regex::new(r"(?m)^[ \t]*(?:(?:#+|\d{1,2}\.)(?:[ \t]+|$))+")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Markup removal, per-line list numbering removal, whitespace collapse.
    fn clean(&self, text: &str) -> String {
        let text = self.tags.replace_all(text, "");
        let text = self.emphasis.replace_all(&text, "");
        let text = self.line_prefix.replace_all(&text, "");
        self.whitespace.replace_all(&text, " ").trim().to_string()
    }
}

/// Leading echoes of one field: its headings plus stray numbering or heading hashes.
#[derive(Debug, Clone)]
struct EchoStripper {
    leading: Regex,
}

impl EchoStripper {
    fn new(headings: &[&str]) -> Result<Self, regex::Error> {
        let mut alternatives: Vec<String> = headings.iter().map(|h| regex::escape(h)).collect();
        alternatives.push(r"#+(?:\s+|$)".to_string());
        alternatives.push(r"\d{1,2}\.(?:\s+|$)".to_string());
        Ok(Self {
            leading: Regex::new(&format!(r"(?i)^(?:{})\s*", alternatives.join("|")))?,
        })
    }

    fn strip(&self, text: &str) -> String {
        let mut current = text.to_string();
        while let Some(m) = self.leading.find(&current) {
            if m.end() == 0 {
                break;
            }
            current = current[m.end()..].to_string();
        }
        current
    }
}

/// Turns extractor output plus the local detection into the canonical `AnalysisResult`.
#[derive(Debug, Clone)]
pub struct ResponseNormalizer {
    cleaner: TextCleaner,
    plain: EchoStripper,
    recycling: EchoStripper,
    impact: EchoStripper,
    disposal: EchoStripper,
    summary: SummaryWriter,
    scoring: ScoringConfig,
    max_field_bytes: usize,
}

impl ResponseNormalizer {
    pub fn new(config: &NormalizerConfig, scoring: ScoringConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            cleaner: TextCleaner::new()?,
            plain: EchoStripper::new(&[])?,
            recycling: EchoStripper::new(RECYCLING_HEADINGS)?,
            impact: EchoStripper::new(IMPACT_HEADINGS)?,
            disposal: EchoStripper::new(DISPOSAL_HEADINGS)?,
            summary: SummaryWriter::new()?,
            scoring,
            max_field_bytes: config.max_field_bytes,
        })
    }

    /// Builds the final record. Narrative fields are never backfilled: only material and
    /// recyclability fall back to the local detector.
    pub fn finalize(
        &self,
        partial: PartialAnalysis,
        raw_text: Option<&str>,
        detection: MaterialDetection,
    ) -> AnalysisResult {
        let local_recyclable =
            !detection.is_unknown() && self.scoring.is_recyclable(&detection.primary_material);
        let local_material = detection.primary_category();

        let mut result = AnalysisResult::new(detection);
        result.full_analysis = raw_text.unwrap_or_default().to_string();
        result.material = partial.material.unwrap_or_default();
        result.recycling_instructions = partial.recycling_instructions.unwrap_or_default();
        result.environmental_impact = partial.environmental_impact.unwrap_or_default();
        result.disposal_recommendations = partial.disposal_recommendations.unwrap_or_default();

        let mut result = self.normalize(result);

        if result.material.is_empty() {
            result.material = local_material;
        }
        if result.material.is_empty() {
            result.material = UNKNOWN_CATEGORY.to_string();
        }
        result.is_recyclable = partial.is_recyclable.unwrap_or(local_recyclable);
        result.is_ewaste = partial.is_ewaste.unwrap_or(false);

        // Summaries describe the model's answer; a local guess alone gets none.
        if result.summary.is_empty() && !result.full_analysis.is_empty() {
            result.summary = self
                .summary
                .summarize(&result.full_analysis, &result.material, result.is_recyclable)
                .iter()
                .map(|line| self.plain.strip(&self.cleaner.clean(line)))
                .collect();
        }

        result
    }

    /// Re-applies markup stripping, whitespace collapsing and heading removal to every
    /// text field. Returns the record untouched if it cannot be formatted.
    pub fn normalize(&self, result: AnalysisResult) -> AnalysisResult {
        match self.try_normalize(&result) {
            Ok(normalized) => normalized,
            Err(e) => {
                tracing::warn!("Formatting failed, keeping original record: {}", e);
                result
            }
        }
    }

    pub fn try_normalize(&self, result: &AnalysisResult) -> Result<AnalysisResult, FormattingError> {
        let fields: [(&'static str, &str); 5] = [
            ("full_analysis", &result.full_analysis),
            ("material", &result.material),
            ("recycling_instructions", &result.recycling_instructions),
            ("environmental_impact", &result.environmental_impact),
            ("disposal_recommendations", &result.disposal_recommendations),
        ];
        for (field, value) in fields {
            self.check_size(field, value)?;
        }
        for line in &result.summary {
            self.check_size("summary", line)?;
        }

        let mut normalized = result.clone();
        normalized.full_analysis = self.format(&self.plain, &result.full_analysis);
        normalized.material = self.format(&self.plain, &result.material);
        normalized.recycling_instructions =
            self.format(&self.recycling, &result.recycling_instructions);
        normalized.environmental_impact = self.format(&self.impact, &result.environmental_impact);
        normalized.disposal_recommendations =
            self.format(&self.disposal, &result.disposal_recommendations);
        normalized.summary = result
            .summary
            .iter()
            .map(|line| self.format(&self.plain, line))
            .filter(|line| !line.is_empty())
            .collect();

        Ok(normalized)
    }

    fn format(&self, echoes: &EchoStripper, text: &str) -> String {
        echoes.strip(&self.cleaner.clean(text))
    }

    fn check_size(&self, field: &'static str, value: &str) -> Result<(), FormattingError> {
        if value.len() > self.max_field_bytes {
            return Err(FormattingError::FieldTooLarge {
                field,
                len: value.len(),
                limit: self.max_field_bytes,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{MaterialComposition, MaterialShare};

    fn normalizer() -> ResponseNormalizer {
        ResponseNormalizer::new(&NormalizerConfig::default(), ScoringConfig::default()).unwrap()
    }

    fn detection(primary: &str) -> MaterialDetection {
        let mut composition = MaterialComposition::new();
        composition.insert(
            primary,
            MaterialShare {
                confidence: 0.9,
                percentage: 100.0,
            },
        );
        MaterialDetection {
            primary_material: primary.to_string(),
            composition,
            recyclability_score: 100,
            dominant_colors: Vec::new(),
            brightness: 200.0,
            std_dev: 10.0,
            error: None,
        }
    }

    #[test]
    fn test_markup_whitespace_and_headings() {
        let partial = PartialAnalysis {
            environmental_impact: Some(
                "<p>Environmental Impact:   <b>Plastic</b>\n\n lasts   centuries.</p>".to_string(),
            ),
            recycling_instructions: Some("**How to recycle:** Rinse it.".to_string()),
            disposal_recommendations: Some(
                "Best Disposal Method: disposal recommendations: Curbside bin.".to_string(),
            ),
            ..Default::default()
        };
        let result = normalizer().finalize(partial, None, detection("plastic"));

        assert_eq!(result.environmental_impact, "Plastic lasts centuries.");
        assert_eq!(result.recycling_instructions, "Rinse it.");
        assert_eq!(result.disposal_recommendations, "Curbside bin.");
    }

    #[test]
    fn test_numbered_lines_removed_from_full_analysis() {
        let raw = "1. Is it recyclable? Yes\n2. Is it e-waste? No\n## 3. Material: glass";
        let result = normalizer().finalize(PartialAnalysis::default(), Some(raw), detection("glass"));
        assert_eq!(
            result.full_analysis,
            "Is it recyclable? Yes Is it e-waste? No Material: glass"
        );
    }

    #[test]
    fn test_empty_partial_backfills_from_local() {
        let result = normalizer().finalize(PartialAnalysis::default(), Some(""), detection("metal"));

        assert_eq!(result.material, "Metal");
        assert!(result.is_recyclable);
        assert!(!result.is_ewaste);
        assert_eq!(result.recycling_instructions, "");
        assert_eq!(result.environmental_impact, "");
        assert_eq!(result.disposal_recommendations, "");
        assert!(result.summary.is_empty());
    }

    #[test]
    fn test_summary_follows_analysis_text() {
        let raw = "Material: a glass jar";
        let result = normalizer().finalize(PartialAnalysis::default(), Some(raw), detection("glass"));

        assert_eq!(
            result.summary,
            vec![
                "The image shows a Waste item.".to_string(),
                "It is primarily made of Glass.".to_string(),
                "This item is Recyclable.".to_string(),
            ]
        );
    }

    #[test]
    fn test_remote_values_win_over_local() {
        let partial = PartialAnalysis {
            is_recyclable: Some(false),
            material: Some("Glass".to_string()),
            ..Default::default()
        };
        let result = normalizer().finalize(partial, None, detection("plastic"));
        assert_eq!(result.material, "Glass");
        assert!(!result.is_recyclable);
    }

    #[test]
    fn test_unknown_local_is_not_recyclable() {
        let result = normalizer().finalize(
            PartialAnalysis::default(),
            None,
            MaterialDetection::failed("no image"),
        );
        assert_eq!(result.material, "Unknown");
        assert!(!result.is_recyclable);
        assert_eq!(result.material_detection.error.as_deref(), Some("no image"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalizer = normalizer();
        let partial = PartialAnalysis {
            recycling_instructions: Some(
                "Recycling Instructions: 1. <i>How to recycle:</i> ### __Rinse__\n  2. Dry".to_string(),
            ),
            environmental_impact: Some("Impact: Impact: <<b>b> * _x_ ****".to_string()),
            ..Default::default()
        };
        let raw = "<div>\n# Title\n1. 2. Item\n\n***bold*** text</div>";
        let once = normalizer.finalize(partial, Some(raw), detection("paper"));
        let twice = normalizer.normalize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_oversized_field_returns_original() {
        let normalizer = ResponseNormalizer::new(
            &NormalizerConfig { max_field_bytes: 8 },
            ScoringConfig::default(),
        )
        .unwrap();
        let mut record = AnalysisResult::new(detection("paper"));
        record.full_analysis = "<b>far too long for the limit</b>".to_string();

        assert!(matches!(
            normalizer.try_normalize(&record),
            Err(FormattingError::FieldTooLarge { field: "full_analysis", .. })
        ));
        assert_eq!(normalizer.normalize(record.clone()), record);
    }
}
