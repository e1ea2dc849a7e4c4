use std::ops::Range;

use regex::Regex;

use super::section_rules::{AnswerKind, SectionRule, MATERIAL_VOCABULARY, SECTION_RULES};
use crate::error::ExtractionError;
use crate::pipeline::types::{PartialAnalysis, SectionField};

#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Flag(bool),
    Text(String),
}

/// Pulls the six prompt answers out of free-form model output.
///
/// Every field is located independently; a field that cannot be found is left unset and
/// its reason recorded in `PartialAnalysis::unresolved`.
#[derive(Debug, Clone)]
pub struct ResponseExtractor {
    rules: &'static [SectionRule],
    yes: Regex,
    no: Regex,
    vocabulary: Vec<(Regex, &'static str)>,
}

impl ResponseExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        let vocabulary = MATERIAL_VOCABULARY
            .iter()
            .map(|(term, category)| {
                Regex::new(&format!(r"\b{}(?:s|es)?\b", regex::escape(term)))
                    .map(|re| (re, *category))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rules: &SECTION_RULES,
            yes: Regex::new(r"\byes\b")?,
            no: Regex::new(r"\bno\b")?,
            vocabulary,
        })
    }

    pub fn extract(&self, raw_text: &str) -> PartialAnalysis {
        // ASCII lowering keeps byte offsets valid for slicing the original text.
        let lower = raw_text.to_ascii_lowercase();
        let mut partial = PartialAnalysis::default();

        for rule in self.rules {
            match self.extract_field(rule, raw_text, &lower) {
                Ok(value) => assign(&mut partial, rule.field, value),
                Err(e) => {
                    tracing::debug!("Extraction miss: {}", e);
                    partial.unresolved.push(e);
                }
            }
        }

        tracing::debug!(
            "Extracted {} of {} sections",
            partial.resolved_count(),
            self.rules.len()
        );
        partial
    }

    fn extract_field(
        &self,
        rule: &SectionRule,
        original: &str,
        lower: &str,
    ) -> Result<FieldValue, ExtractionError> {
        let section = self
            .find_section(rule, lower)
            .ok_or(ExtractionError::IndicatorNotFound(rule.field))?;

        match rule.kind {
            AnswerKind::YesNo => self
                .yes_no(&lower[section])
                .map(FieldValue::Flag)
                .ok_or(ExtractionError::NoAnswer(rule.field)),
            AnswerKind::Material => self
                .material(&lower[section])
                .map(|category| FieldValue::Text(category.to_string()))
                .ok_or(ExtractionError::UnknownMaterial),
            AnswerKind::Narrative => {
                let text = trim_section(&original[section]);
                if text.is_empty() {
                    Err(ExtractionError::EmptySection(rule.field))
                } else {
                    Ok(FieldValue::Text(text.to_string()))
                }
            }
        }
    }

    /// Byte range of a field's value: from the end of its first matching indicator up to
    /// the nearest following heading of another field, the rule's window, or end of text.
    fn find_section(&self, rule: &SectionRule, lower: &str) -> Option<Range<usize>> {
        let start = first_match_end(lower, rule.indicators)
            .or_else(|| first_match_end(lower, rule.fallback))?;

        let mut end = self.section_end(rule.field, lower, start);
        if let Some(window) = rule.window {
            end = end.min(floor_char_boundary(lower, start + window));
        }

        Some(start..end)
    }

    fn section_end(&self, field: SectionField, lower: &str, start: usize) -> usize {
        let rest = &lower[start..];
        self.rules
            .iter()
            .filter(|other| other.field != field)
            .flat_map(|other| {
                let headed = other.indicators.iter().any(|i| lower.contains(i));
                let loose: &[&str] = if headed { &[] } else { other.loose_boundaries };
                other.boundaries.iter().chain(loose)
            })
            .filter_map(|marker| rest.find(marker))
            .min()
            .map_or(lower.len(), |offset| start + offset)
    }

    /// Whichever of "yes"/"no" appears first decides.
    fn yes_no(&self, window: &str) -> Option<bool> {
        let yes = self.yes.find(window).map(|m| m.start());
        let no = self.no.find(window).map(|m| m.start());
        match (yes, no) {
            (Some(y), Some(n)) => Some(y < n),
            (Some(_), None) => Some(true),
            (None, Some(_)) => Some(false),
            (None, None) => None,
        }
    }

    fn material(&self, window: &str) -> Option<&'static str> {
        self.vocabulary
            .iter()
            .find(|(term, _)| term.is_match(window))
            .map(|(_, category)| *category)
    }
}

fn assign(partial: &mut PartialAnalysis, field: SectionField, value: FieldValue) {
    match (field, value) {
        (SectionField::Recyclable, FieldValue::Flag(v)) => partial.is_recyclable = Some(v),
        (SectionField::Ewaste, FieldValue::Flag(v)) => partial.is_ewaste = Some(v),
        (SectionField::Material, FieldValue::Text(v)) => partial.material = Some(v),
        (SectionField::RecyclingInstructions, FieldValue::Text(v)) => {
            partial.recycling_instructions = Some(v)
        }
        (SectionField::EnvironmentalImpact, FieldValue::Text(v)) => {
            partial.environmental_impact = Some(v)
        }
        (SectionField::DisposalRecommendations, FieldValue::Text(v)) => {
            partial.disposal_recommendations = Some(v)
        }
        (field, value) => {
            tracing::warn!("Value {:?} does not fit field {}", value, field);
        }
    }
}

fn first_match_end(lower: &str, indicators: &[&str]) -> Option<usize> {
    indicators
        .iter()
        .find_map(|indicator| lower.find(indicator).map(|pos| pos + indicator.len()))
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Drops the heading punctuation left behind the indicator and markdown residue.
fn trim_section(section: &str) -> &str {
    section
        .trim_start_matches(|c: char| matches!(c, ':' | '*' | '?' | ')' | '#') || c.is_whitespace())
        .trim_end_matches(|c: char| matches!(c, '*' | '#') || c.is_whitespace())
}
