use std::time::Duration;

use super::PresentationSink;
use crate::domain::{Alert, Category};
use crate::engine::{ChannelKind, ChannelState, CombinedStatus, Frame};
use crate::models::CategoryCounters;

/// One call made on a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    AlertAccepted {
        sequence_number: usize,
        category: Category,
        text: String,
    },
    StatsChanged {
        counts: CategoryCounters,
        today_count: usize,
        total_count: usize,
    },
    StatusChanged(CombinedStatus),
    ChannelError(ChannelKind, String),
    Notification(String),
    DetailRequested(usize),
    ChannelState(ChannelKind, ChannelState),
    Frame(usize),
    MonitorTick(Duration),
}

/// Keeps every call in order. For headless embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub calls: Vec<SinkCall>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<CombinedStatus> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SinkCall::StatusChanged(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&SinkCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl PresentationSink for RecordingSink {
    fn on_alert_accepted(&mut self, alert: &Alert, sequence_number: usize) {
        self.calls.push(SinkCall::AlertAccepted {
            sequence_number,
            category: alert.category(),
            text: alert.text.clone(),
        });
    }

    fn on_stats_changed(&mut self, counts: &CategoryCounters, today_count: usize, total_count: usize) {
        self.calls.push(SinkCall::StatsChanged {
            counts: *counts,
            today_count,
            total_count,
        });
    }

    fn on_status_changed(&mut self, status: CombinedStatus) {
        self.calls.push(SinkCall::StatusChanged(status));
    }

    fn on_channel_error(&mut self, kind: ChannelKind, message: &str) {
        self.calls.push(SinkCall::ChannelError(kind, message.to_string()));
    }

    fn on_notification_requested(&mut self, text: &str) {
        self.calls.push(SinkCall::Notification(text.to_string()));
    }

    fn on_detail_requested(&mut self, index: usize, _alert: &Alert) {
        self.calls.push(SinkCall::DetailRequested(index));
    }

    fn on_channel_state(&mut self, kind: ChannelKind, state: ChannelState) {
        self.calls.push(SinkCall::ChannelState(kind, state));
    }

    fn on_frame(&mut self, frame: Frame) {
        self.calls.push(SinkCall::Frame(frame.len()));
    }

    fn on_monitor_tick(&mut self, elapsed: Duration) {
        self.calls.push(SinkCall::MonitorTick(elapsed));
    }
}
