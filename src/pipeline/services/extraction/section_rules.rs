/// Indicator tables for the six-point analysis prompt.
///
/// The prompt and these tables are one contract: renumbering or renaming a heading in
/// `ANALYSIS_PROMPT` means updating the matching `SectionRule` in the same change.
use crate::pipeline::types::SectionField;

pub const ANALYSIS_PROMPT: &str = "You are a waste management expert analyzing this image of waste.
Answer the six points below. Reply with yes or no to points 1 and 2, name the main material \
for point 3, and write a short paragraph for each of points 4 to 6. Start every answer with \
its numbered heading exactly as shown.

1. Is it recyclable?
2. Is it e-waste?
3. Material:
4. Recycling Instructions:
5. Environmental Impact:
6. Disposal Recommendations:

If you cannot determine something with certainty, say so clearly.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    YesNo,
    Material,
    Narrative,
}

/// How to find one field. All strings are lower-case.
#[derive(Debug, Clone, Copy)]
pub struct SectionRule {
    pub field: SectionField,
    /// Tried in order; the first one present anywhere in the text starts the section.
    pub indicators: &'static [&'static str],
    /// Looser starts, only tried when no indicator matched.
    pub fallback: &'static [&'static str],
    /// Heading forms that end *another* field's section when they follow it.
    pub boundaries: &'static [&'static str],
    /// Bare numbering that only ends another section while this field's own headings are
    /// absent, so numbered steps inside an answer survive.
    pub loose_boundaries: &'static [&'static str],
    pub kind: AnswerKind,
    /// Maximum section length in bytes; `None` runs to the next boundary or end of text.
    pub window: Option<usize>,
}

pub const SECTION_RULES: [SectionRule; 6] = [
    SectionRule {
        field: SectionField::Recyclable,
        indicators: &[
            "1. is it recyclable",
            "1. is this item recyclable",
            "is it recyclable",
            "is this item recyclable",
            "recyclable:",
            "recyclable?",
        ],
        fallback: &[],
        boundaries: &["1. is it recyclable", "1. is this item recyclable", "recyclable:"],
        loose_boundaries: &[],
        kind: AnswerKind::YesNo,
        window: Some(100),
    },
    SectionRule {
        field: SectionField::Ewaste,
        indicators: &[
            "2. is it e-waste",
            "2. is this item e-waste",
            "is it e-waste",
            "is this item e-waste",
            "e-waste:",
            "e-waste?",
            "ewaste:",
        ],
        fallback: &[],
        boundaries: &["2. is it e-waste", "2. is this item e-waste", "is it e-waste", "e-waste:"],
        loose_boundaries: &[],
        kind: AnswerKind::YesNo,
        window: Some(100),
    },
    SectionRule {
        field: SectionField::Material,
        indicators: &[
            "3. material",
            "3. what material",
            "what material",
            "material:",
            "made of",
        ],
        fallback: &[],
        boundaries: &["3. material", "3. what material", "material:"],
        loose_boundaries: &[],
        kind: AnswerKind::Material,
        window: Some(150),
    },
    SectionRule {
        field: SectionField::RecyclingInstructions,
        indicators: &[
            "4. recycling instructions",
            "recycling instructions:",
            "how to recycle:",
        ],
        fallback: &["\n4.", "instructions:"],
        boundaries: &[
            "4. recycling instructions",
            "recycling instructions:",
            "how to recycle:",
            "\ninstructions:",
        ],
        loose_boundaries: &["\n4."],
        kind: AnswerKind::Narrative,
        window: None,
    },
    SectionRule {
        field: SectionField::EnvironmentalImpact,
        indicators: &["5. environmental impact", "environmental impact:"],
        fallback: &["\n5.", "impact:"],
        boundaries: &[
            "5. environmental impact",
            "environmental impact:",
            "\nimpact:",
        ],
        loose_boundaries: &["\n5."],
        kind: AnswerKind::Narrative,
        window: None,
    },
    SectionRule {
        field: SectionField::DisposalRecommendations,
        indicators: &[
            "6. disposal recommendations",
            "disposal recommendations:",
            "best disposal method:",
        ],
        fallback: &["\n6.", "disposal:"],
        boundaries: &[
            "6. disposal recommendations",
            "disposal recommendations:",
            "best disposal method:",
            "\ndisposal:",
        ],
        loose_boundaries: &["\n6."],
        kind: AnswerKind::Narrative,
        window: None,
    },
];

/// Material vocabulary in priority order: the first term present wins, not the earliest.
pub const MATERIAL_VOCABULARY: &[(&str, &str)] = &[
    ("plastic", "Plastic"),
    ("polyethylene", "Plastic"),
    ("polypropylene", "Plastic"),
    ("polystyrene", "Plastic"),
    ("styrofoam", "Plastic"),
    ("paper", "Paper"),
    ("cardboard", "Paper"),
    ("carton", "Paper"),
    ("metal", "Metal"),
    ("aluminum", "Metal"),
    ("aluminium", "Metal"),
    ("steel", "Metal"),
    ("tin", "Metal"),
    ("glass", "Glass"),
    ("fabric", "Textile"),
    ("textile", "Textile"),
    ("cotton", "Textile"),
    ("electronic", "Electronic"),
    ("battery", "Electronic"),
    ("batteries", "Electronic"),
    ("organic", "Organic"),
    ("food", "Organic"),
    ("wood", "Wood"),
];
