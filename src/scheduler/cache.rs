//! Bounded per-month record cache
//!
//! Browsing back and forth through months would otherwise keep every month
//! ever opened in memory. The cache keeps the most recently loaded months
//! and drops the oldest load once it is full.

use std::collections::{HashMap, VecDeque};

use crate::models::YearMonth;
use crate::store::Stored;

/// Months kept per cache: the open month and its neighbours
pub const CACHED_MONTHS: usize = 3;

#[derive(Debug)]
pub struct MonthCache<T> {
    capacity: usize,
    months: HashMap<YearMonth, Vec<Stored<T>>>,
    order: VecDeque<YearMonth>,
}

impl<T> Default for MonthCache<T> {
    fn default() -> Self {
        Self::with_capacity(CACHED_MONTHS)
    }
}

impl<T> MonthCache<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            months: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&self, year_month: &YearMonth) -> Option<&Vec<Stored<T>>> {
        self.months.get(year_month)
    }

    /// Store a freshly loaded month, evicting the oldest load when full
    pub fn insert(&mut self, year_month: YearMonth, records: Vec<Stored<T>>) {
        self.order.retain(|m| *m != year_month);
        self.order.push_back(year_month);
        self.months.insert(year_month, records);

        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.months.remove(&evicted);
                tracing::trace!(year_month = %evicted, "Month evicted from cache");
            }
        }
    }

    pub fn clear(&mut self) {
        self.months.clear();
        self.order.clear();
    }

    /// Cached months, oldest load first
    pub fn months(&self) -> Vec<YearMonth> {
        self.order.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}
