use std::collections::{BTreeSet, HashSet};

use crate::date_utils::YearMonth;
use crate::models::TicketLineItem;

/// Ticket line items ordered by timestamp.
///
/// Rows sharing a timestamp keep their input order. A dataset is never
/// mutated after construction; filters return new datasets.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    items: Vec<TicketLineItem>,
}

impl Dataset {
    pub fn new(mut items: Vec<TicketLineItem>) -> Self {
        items.sort_by_key(|item| item.timestamp);
        Self { items }
    }

    pub fn items(&self) -> &[TicketLineItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TicketLineItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct calendar months present, ascending.
    pub fn months(&self) -> Vec<YearMonth> {
        self.items
            .iter()
            .map(TicketLineItem::month)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct categories in order of first appearance.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .filter(|item| seen.insert(item.category.as_str()))
            .map(|item| item.category.clone())
            .collect()
    }

    pub fn filter_month(&self, month: YearMonth) -> Dataset {
        self.filter(|item| month.contains(item.date()))
    }

    pub fn filter_category(&self, category: &str) -> Dataset {
        self.filter(|item| item.category == category)
    }

    fn filter(&self, predicate: impl Fn(&TicketLineItem) -> bool) -> Dataset {
        Dataset {
            items: self.items.iter().filter(|i| predicate(i)).cloned().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a TicketLineItem;
    type IntoIter = std::slice::Iter<'a, TicketLineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
