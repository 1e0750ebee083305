// Description label -> category, driven by an ordered rule table.
use crate::error::{ReportError, Result};
use crate::types::{AssetRecord, Category, LabelCount};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// One row of the rule table: a label that maps to a category.
///
/// Matching is exact after both sides are case-folded, trimmed and have
/// inner whitespace collapsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub pattern: String,
    pub category: Category,
}

impl ClassificationRule {
    pub fn new(pattern: &str, category: Category) -> Self {
        ClassificationRule {
            pattern: pattern.to_string(),
            category,
        }
    }
}

/// The labels observed in real registers, highest precedence first.
pub fn default_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule::new("LED ALTA INTENSIDAD", Category::HighIntensity),
        ClassificationRule::new("High-Intensity LED", Category::HighIntensity),
        ClassificationRule::new("LED BAJA INTENSIDAD", Category::LowIntensity),
        ClassificationRule::new("LUMINARIA BAJA INTENSIDAD", Category::LowIntensity),
        ClassificationRule::new("Low-Intensity LED", Category::LowIntensity),
        ClassificationRule::new("Low-Intensity Luminaire", Category::LowIntensity),
    ]
}

/// How labels that match no rule are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UnrecognizedPolicy {
    /// Keep them in their own `Unrecognized` bucket.
    #[default]
    Separate,
    /// Fail the run and list them.
    Reject,
}

pub fn fold_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

pub struct Classifier {
    rules: Vec<(String, Category)>,
}

impl Classifier {
    /// Compile a rule table. Rules may only target the labelled categories;
    /// `Uncategorized` is reserved for blank labels and `Unrecognized` for
    /// everything no rule matches, so rules aiming at either are skipped.
    pub fn new(rules: &[ClassificationRule]) -> Self {
        let rules = rules
            .iter()
            .filter(|r| {
                let usable = matches!(r.category, Category::HighIntensity | Category::LowIntensity);
                if !usable {
                    warn!(pattern = %r.pattern, category = %r.category, "ignoring rule for a reserved category");
                }
                usable
            })
            .map(|r| (fold_label(&r.pattern), r.category))
            .filter(|(p, _)| !p.is_empty())
            .collect();
        Classifier { rules }
    }

    pub fn classify(&self, label: Option<&str>) -> Category {
        let folded = label.map(fold_label).unwrap_or_default();
        if let Some((_, category)) = self.rules.iter().find(|(p, _)| *p == folded) {
            return *category;
        }
        if folded.is_empty() {
            Category::Uncategorized
        } else {
            Category::Unrecognized
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new(&default_rules())
    }
}

/// Records split into disjoint per-category subsets.
#[derive(Debug, Default)]
pub struct Partition {
    pub groups: BTreeMap<Category, Vec<AssetRecord>>,
    /// Distinct labels that landed in `Unrecognized`, most frequent first.
    pub unrecognized: Vec<LabelCount>,
}

impl Partition {
    pub fn records(&self, category: Category) -> &[AssetRecord] {
        self.groups.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

pub fn partition(
    records: Vec<AssetRecord>,
    classifier: &Classifier,
    policy: UnrecognizedPolicy,
) -> Result<Partition> {
    let mut groups: BTreeMap<Category, Vec<AssetRecord>> = BTreeMap::new();
    let mut unknown: HashMap<String, usize> = HashMap::new();
    for r in records {
        let category = classifier.classify(r.label.as_deref());
        if category == Category::Unrecognized {
            let key = r.label.as_deref().map(fold_label).unwrap_or_default();
            *unknown.entry(key).or_default() += 1;
        }
        groups.entry(category).or_default().push(r);
    }

    let mut unrecognized: Vec<LabelCount> = unknown
        .into_iter()
        .map(|(label, rows)| LabelCount { label, rows })
        .collect();
    unrecognized.sort_by(|a, b| b.rows.cmp(&a.rows).then_with(|| a.label.cmp(&b.label)));

    if !unrecognized.is_empty() {
        warn!(
            distinct = unrecognized.len(),
            rows = unrecognized.iter().map(|l| l.rows).sum::<usize>(),
            "description labels matched no rule"
        );
        if policy == UnrecognizedPolicy::Reject {
            return Err(ReportError::UnrecognizedLabels(
                unrecognized.into_iter().map(|l| l.label).collect(),
            ));
        }
    }
    for (category, recs) in &groups {
        debug!(category = %category, rows = recs.len(), "classified");
    }
    Ok(Partition {
        groups,
        unrecognized,
    })
}
