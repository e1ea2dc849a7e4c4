use regex::Regex;

/// Item descriptions picked from keywords in the full analysis, first hit wins.
const ITEM_KEYWORDS: &[(&str, &str)] = &[
    ("bottle", "Bottle"),
    ("container", "Container"),
    ("packaging", "Packaging material"),
    ("bag", "Bag"),
    ("cup", "Cup"),
    ("box", "Box"),
    ("device", "Electronic device"),
    ("electronic", "Electronic device"),
];

const DEFAULT_ITEM: &str = "Waste item";

/// Three-line plain-text summary of a finished analysis.
#[derive(Debug, Clone)]
pub struct SummaryWriter {
    keywords: Vec<(Regex, &'static str)>,
}

impl SummaryWriter {
    pub fn new() -> Result<Self, regex::Error> {
        let keywords = ITEM_KEYWORDS
            .iter()
            .map(|(keyword, item)| {
                Regex::new(&format!(r"(?i)\b{}(?:s|es)?\b", regex::escape(keyword)))
                    .map(|re| (re, *item))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { keywords })
    }

    pub fn describe_item(&self, full_analysis: &str) -> &'static str {
        self.keywords
            .iter()
            .find(|(re, _)| re.is_match(full_analysis))
            .map_or(DEFAULT_ITEM, |(_, item)| *item)
    }

    pub fn summarize(&self, full_analysis: &str, material: &str, is_recyclable: bool) -> Vec<String> {
        let item = self.describe_item(full_analysis);
        let recyclable = if is_recyclable {
            "Recyclable"
        } else {
            "Not recyclable"
        };

        vec![
            format!("The image shows {} {}.", article(item), item),
            format!("It is primarily made of {}.", material),
            format!("This item is {}.", recyclable),
        ]
    }
}

fn article(word: &str) -> &'static str {
    match word.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}
