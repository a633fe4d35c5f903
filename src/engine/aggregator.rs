use chrono::{DateTime, Local, NaiveDate};

use crate::analysis::{Classifier, strip_markup};
use crate::config::DISPLAY;
#[cfg(debug_assertions)]
use crate::config::DF;
use crate::domain::{Alert, IncomingAlert};
use crate::error::Result;
use crate::models::{AlertHistory, CategoryCounters};
use crate::utils::{today, truncate_with_ellipsis};

use super::state::CombinedStatus;

/// Why an inbound alert left no trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No text, or only markup / whitespace.
    Empty,
    /// The backend's periodic "no anomaly" report.
    Heartbeat,
}

/// Everything the presentation layer needs after one accepted alert.
#[derive(Debug, Clone)]
pub struct AcceptedAlert {
    pub alert: Alert,
    /// Display number, `history.len() - index`; always the largest for a new alert.
    pub sequence_number: usize,
    /// Notification text, capped with an ellipsis.
    pub preview: String,
    pub counts: CategoryCounters,
    pub today_count: usize,
    pub total_count: usize,
    /// First alert since the aggregator was created or reset: select it by default.
    pub show_detail: bool,
}

#[derive(Debug, Clone)]
pub enum Acceptance {
    Accepted(Box<AcceptedAlert>),
    Rejected(RejectReason),
}

impl Acceptance {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Acceptance::Accepted(_))
    }
}

/// Owns the alert history and the running statistics derived from it.
///
/// Invariant: `counters.total() == history.len()` at all times.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    classifier: Classifier,
    history: AlertHistory,
    counters: CategoryCounters,
    status: CombinedStatus,
    session_start: Option<DateTime<Local>>,
}

impl Aggregator {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            history: AlertHistory::new(),
            counters: CategoryCounters::new(),
            status: CombinedStatus::Offline,
            session_start: None,
        }
    }

    /// Heartbeat suppression, classification and bookkeeping for one inbound alert.
    /// A rejection leaves every piece of state untouched.
    pub fn accept(&mut self, mut incoming: IncomingAlert) -> Acceptance {
        if let Some(reason) = self.screen(incoming.raw_message.as_deref()) {
            return Acceptance::Rejected(reason);
        }
        let Some(raw) = incoming.raw_message.take() else {
            return Acceptance::Rejected(RejectReason::Empty);
        };

        let text = strip_markup(&raw);
        let category = self.classifier.classify_stripped(&text);
        let alert = Alert::new(incoming, raw, text, category);
        let preview = truncate_with_ellipsis(
            &alert.text,
            DISPLAY.preview.notification_chars,
            DISPLAY.preview.ellipsis,
        );

        let sequence_number = self.history.push_newest(alert.clone());
        self.counters.increment(category);

        log::info!(
            "Alert #{} accepted as {} at {}",
            sequence_number,
            category,
            alert.timestamp
        );

        Acceptance::Accepted(Box::new(AcceptedAlert {
            alert,
            sequence_number,
            preview,
            counts: self.counters,
            today_count: self.today_count(),
            total_count: self.total_count(),
            show_detail: self.history.len() == 1,
        }))
    }

    /// Empty and heartbeat checks on the raw alert text alone. Runs before the
    /// rest of the payload is looked at, so a heartbeat with a broken timestamp
    /// is still just a heartbeat.
    pub fn screen(&self, raw: Option<&str>) -> Option<RejectReason> {
        let raw = match raw {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Some(RejectReason::Empty),
        };

        let text = strip_markup(raw);
        if self.classifier.is_heartbeat(&text) {
            #[cfg(debug_assertions)]
            if DF.log_heartbeats {
                log::debug!("Aggregator: heartbeat suppressed");
            }
            return Some(RejectReason::Heartbeat);
        }
        if text.trim().is_empty() {
            return Some(RejectReason::Empty);
        }
        None
    }

    pub fn total_count(&self) -> usize {
        self.history.len()
    }

    /// Alerts stamped on the current local day. Recomputed on each call, so a
    /// midnight rollover needs no timer.
    pub fn today_count(&self) -> usize {
        self.today_count_on(today())
    }

    pub fn today_count_on(&self, day: NaiveDate) -> usize {
        self.history.count_on(day)
    }

    /// Snapshot for chart redraws.
    pub fn counts(&self) -> CategoryCounters {
        self.counters
    }

    pub fn alert_at(&self, index: usize) -> Result<&Alert> {
        self.history.get(index)
    }

    pub fn sequence_number(&self, index: usize) -> Result<usize> {
        self.history.sequence_number(index)
    }

    /// Short text for the history list row at `index`.
    pub fn list_preview(&self, index: usize) -> Result<String> {
        self.alert_at(index).map(|alert| {
            truncate_with_ellipsis(
                &alert.text,
                DISPLAY.preview.list_chars,
                DISPLAY.preview.ellipsis,
            )
        })
    }

    pub fn history(&self) -> &AlertHistory {
        &self.history
    }

    pub fn status(&self) -> CombinedStatus {
        self.status
    }

    pub fn session_start(&self) -> Option<DateTime<Local>> {
        self.session_start
    }

    /// Session went online. Keeps an earlier start if one is already recorded.
    pub fn start(&mut self, at: DateTime<Local>) {
        self.status = CombinedStatus::Online;
        self.session_start.get_or_insert(at);
    }

    /// Session went offline. History and counters stay.
    pub fn stop(&mut self) {
        self.status = CombinedStatus::Offline;
        self.session_start = None;
    }

    /// Drop everything. Only for explicit session teardown.
    pub fn reset(&mut self) {
        self.history.clear();
        self.counters.clear();
        self.stop();
    }
}
