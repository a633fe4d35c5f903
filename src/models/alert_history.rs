use std::collections::VecDeque;

use chrono::NaiveDate;

use crate::domain::Alert;
use crate::error::{EngineError, Result};
use crate::utils::local_day;

/// Accepted alerts, newest first. Append-only: entries are never edited or evicted.
#[derive(Debug, Clone, Default)]
pub struct AlertHistory {
    alerts: VecDeque<Alert>,
}

impl AlertHistory {
    pub fn new() -> Self {
        Self {
            alerts: VecDeque::new(),
        }
    }

    /// Insert at index 0 and return the sequence number it is displayed with.
    pub fn push_newest(&mut self, alert: Alert) -> usize {
        self.alerts.push_front(alert);
        self.alerts.len()
    }

    pub fn get(&self, index: usize) -> Result<&Alert> {
        self.alerts.get(index).ok_or(EngineError::IndexOutOfRange {
            index,
            len: self.alerts.len(),
        })
    }

    /// Display sequence number of the alert at `index` (`len - index`).
    pub fn sequence_number(&self, index: usize) -> Result<usize> {
        self.get(index).map(|_| self.alerts.len() - index)
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    /// Number of alerts whose timestamp falls on `day` (local calendar).
    pub fn count_on(&self, day: NaiveDate) -> usize {
        self.alerts
            .iter()
            .filter(|a| local_day(&a.timestamp) == day)
            .count()
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }
}
