//! Presentation boundary. The engine pushes everything user-visible through
//! [`PresentationSink`]; rendering, charts and notifications live behind it.

mod console;
mod recording;

use std::time::Duration;

use crate::domain::Alert;
use crate::engine::{ChannelKind, ChannelState, CombinedStatus, Frame};
use crate::models::CategoryCounters;

pub use console::ConsoleSink;
pub use recording::{RecordingSink, SinkCall};

/// Fire-and-forget display calls. Implementations must not block.
pub trait PresentationSink {
    /// A new alert entered the history at index 0.
    fn on_alert_accepted(&mut self, alert: &Alert, sequence_number: usize);

    /// Counters changed; redraw the chart and the totals.
    fn on_stats_changed(&mut self, counts: &CategoryCounters, today_count: usize, total_count: usize);

    fn on_status_changed(&mut self, status: CombinedStatus);

    /// Non-fatal problem on one channel (transport error or malformed payload).
    fn on_channel_error(&mut self, kind: ChannelKind, message: &str);

    /// Short toast / desktop notification text.
    fn on_notification_requested(&mut self, text: &str);

    /// Select `index` in the history and show its detail.
    fn on_detail_requested(&mut self, _index: usize, _alert: &Alert) {}

    /// Per-channel badge update.
    fn on_channel_state(&mut self, _kind: ChannelKind, _state: ChannelState) {}

    /// Latest video still. Dropped when this returns.
    fn on_frame(&mut self, _frame: Frame) {}

    /// Once a second while online.
    fn on_monitor_tick(&mut self, _elapsed: Duration) {}
}
