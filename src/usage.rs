use crate::query::{collect_fields, Filter};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Per-field count of the documents whose filter references it. A field
/// repeated inside one filter counts once.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldUsage {
    counts: BTreeMap<String, usize>,
    documents: usize,
}

impl FieldUsage {
    pub fn record(&mut self, filter: Option<&Filter>) {
        self.documents += 1;
        let Some(filter) = filter else {
            return;
        };
        for field in collect_fields(filter) {
            *self.counts.entry(field).or_default() += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn count(&self, field: &str) -> usize {
        self.counts.get(field).copied().unwrap_or(0)
    }

    /// Field names, or `field: used/total` lines ordered by usage when
    /// `show_count` is set. Ties stay in name order.
    pub fn lines(&self, show_count: bool) -> Vec<String> {
        if !show_count {
            return self.counts.keys().cloned().collect();
        }

        let mut items: Vec<(&String, usize)> =
            self.counts.iter().map(|(field, count)| (field, *count)).collect();
        items.sort_by_key(|(_, count)| Reverse(*count));
        items
            .into_iter()
            .map(|(field, count)| format!("{}: {}/{}", field, count, self.documents))
            .collect()
    }
}

impl<'a> FromIterator<Option<&'a Filter>> for FieldUsage {
    fn from_iter<I: IntoIterator<Item = Option<&'a Filter>>>(iter: I) -> Self {
        let mut usage = FieldUsage::default();
        for filter in iter {
            usage.record(filter);
        }
        usage
    }
}
