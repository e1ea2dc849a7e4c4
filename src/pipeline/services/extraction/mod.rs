pub mod response_extractor;
pub mod section_rules;

pub use response_extractor::ResponseExtractor;
pub use section_rules::{ANALYSIS_PROMPT, SECTION_RULES};
