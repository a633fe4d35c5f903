//! Keyword lexicon driving alert classification and heartbeat suppression.
use {
    crate::domain::Category,
    anyhow::{Context, Result, bail},
    serde::{Deserialize, Serialize},
    std::path::Path,
};

/// One classification rule: any keyword hit assigns `category`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// Ordered rule list plus the heartbeat marker. Rule order is priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lexicon {
    pub rules: Vec<KeywordRule>,
    pub heartbeat_marker: String,
}

pub const HEARTBEAT_MARKER: &str = "无异常";

const DEFAULT_RULES: &[(Category, &[&str])] = &[
    (Category::TrafficViolation, &["交通规则", "行驶", "车辆"]),
    (Category::PersonFall, &["跌倒", "摔倒"]),
    (Category::AbnormalObject, &["物品", "异常物"]),
    (Category::Crowding, &["聚集", "人群"]),
];

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES
                .iter()
                .map(|(category, words)| KeywordRule {
                    category: *category,
                    keywords: words.iter().map(|w| w.to_string()).collect(),
                })
                .collect(),
            heartbeat_marker: HEARTBEAT_MARKER.to_string(),
        }
    }
}

impl Lexicon {
    /// Load a lexicon from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon file {}", path.display()))?;
        let lexicon: Lexicon = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse lexicon file {}", path.display()))?;
        lexicon.validate()?;
        Ok(lexicon)
    }

    /// An empty keyword or marker would match every message.
    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_marker.trim().is_empty() {
            bail!("Lexicon heartbeat_marker must not be empty");
        }
        for rule in &self.rules {
            if rule.keywords.iter().any(|k| k.trim().is_empty()) {
                bail!("Lexicon rule for {} contains an empty keyword", rule.category);
            }
        }
        Ok(())
    }
}
