//! Labeled key/value extraction.

use regex::Regex;
use tracing::debug;

use crate::error::{FinscanError, Result};
use crate::models::config::{LabelPattern, ValueKind};
use crate::models::record::{Category, CategoryTable, FieldSet};

use super::amounts::parse_amount;

/// A compiled label rule.
#[derive(Debug, Clone)]
struct LabelRule {
    field: String,
    kind: ValueKind,
    pattern: Regex,
}

impl LabelRule {
    fn compile(label: &LabelPattern) -> Result<Self> {
        let source = format!(r"(?i)\b(?:{})[:\s]*({})", label.label, label.value.pattern());
        let pattern = Regex::new(&source).map_err(|e| FinscanError::LabelPattern {
            field: label.field.clone(),
            source: e,
        })?;

        Ok(Self {
            field: label.field.clone(),
            kind: label.value,
            pattern,
        })
    }

    fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        let value = self.pattern.captures(text)?.get(1)?.as_str().trim();

        // Numbers stay text, but must at least be readable as a number.
        if self.kind == ValueKind::Numeric && parse_amount(value).is_none() {
            debug!("Field {} has unreadable numeric value {:?}", self.field, value);
            return None;
        }

        Some(value)
    }
}

/// Pulls scalar fields (account number, balances, payee, salary figures) out
/// of page text using per-category label rules.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    rules: CategoryTable<Vec<LabelRule>>,
}

impl FieldExtractor {
    /// Compile label rules. Fails on a label that is not a valid regex.
    pub fn new(labels: &CategoryTable<Vec<LabelPattern>>) -> Result<Self> {
        let rules = labels.try_map(|_, patterns| {
            patterns
                .iter()
                .map(LabelRule::compile)
                .collect::<Result<Vec<_>>>()
        })?;
        Ok(Self { rules })
    }

    /// Extract every configured field for `category`. Each field is
    /// independent; the first occurrence in the text wins.
    pub fn extract_fields(&self, text: &str, category: Category) -> FieldSet {
        let mut fields = FieldSet::new();

        let Some(rules) = self.rules.get(category) else {
            return fields;
        };

        for rule in rules {
            if let Some(value) = rule.find(text) {
                fields.insert(rule.field.clone(), value);
            }
        }

        debug!("Extracted {}/{} {} fields", fields.len(), rules.len(), category);
        fields
    }

    /// Field names configured for `category`, in rule order.
    pub fn field_names(&self, category: Category) -> Vec<&str> {
        self.rules
            .get(category)
            .map(|rules| rules.iter().map(|r| r.field.as_str()).collect())
            .unwrap_or_default()
    }
}
