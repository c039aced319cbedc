use std::collections::BTreeMap;

use crate::rule::ConversionRule;

/// The ordered rules for one provider.
///
/// Rules are sorted once on construction by `(dimension_id, priority)` and
/// never reordered afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionPlan {
    provider: String,
    rules: Vec<ConversionRule>,
}

impl ConversionPlan {
    pub fn new(provider: impl Into<String>, mut rules: Vec<ConversionRule>) -> Self {
        rules.sort_by(|left, right| left.ordering_key().cmp(&right.ordering_key()));
        Self {
            provider: provider.into(),
            rules,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn rules(&self) -> &[ConversionRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConversionRule> {
        self.rules.iter()
    }
}

impl<'a> IntoIterator for &'a ConversionPlan {
    type Item = &'a ConversionRule;
    type IntoIter = std::slice::Iter<'a, ConversionRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Plans keyed by provider name.
pub type ProviderPlans = BTreeMap<String, ConversionPlan>;
