use strum::{EnumCount, IntoEnumIterator};

use crate::domain::Category;

/// Running count per category. Fixed-size: every category always has a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryCounters {
    counts: [u64; Category::COUNT],
}

impl CategoryCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, category: Category) {
        self.counts[category.index()] += 1;
    }

    pub fn get(&self, category: Category) -> u64 {
        self.counts[category.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// (category, count) in taxonomy order, zeros included. Chart series order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, u64)> + '_ {
        Category::iter().map(move |c| (c, self.get(c)))
    }

    pub fn clear(&mut self) {
        self.counts = [0; Category::COUNT];
    }
}
