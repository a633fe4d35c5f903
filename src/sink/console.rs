use std::time::Duration;

use super::PresentationSink;
use crate::domain::Alert;
use crate::config::DISPLAY;
use crate::engine::{ChannelKind, ChannelState, CombinedStatus, Frame};
use crate::models::CategoryCounters;
use crate::utils::{format_display_time, format_monitor_duration};

/// Terminal rendition of the operator console: everything goes to the log.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    frames_shown: u64,
    last_frame_bytes: usize,
    /// Report bucket (`elapsed / monitor_report_secs`) last logged this session.
    monitor_reported: Option<u64>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }

    /// True on the first tick of a session and then once per report period.
    fn monitor_report_due(&mut self, elapsed: Duration) -> bool {
        let bucket = elapsed.as_secs() / DISPLAY.console.monitor_report_secs.max(1);
        if self.monitor_reported == Some(bucket) {
            return false;
        }
        self.monitor_reported = Some(bucket);
        true
    }
}

impl PresentationSink for ConsoleSink {
    fn on_alert_accepted(&mut self, alert: &Alert, sequence_number: usize) {
        log::warn!(
            "[Alert #{}] {} | {} | {}",
            sequence_number,
            alert.category().label(),
            format_display_time(&alert.timestamp),
            alert.text
        );
    }

    fn on_stats_changed(&mut self, counts: &CategoryCounters, today_count: usize, total_count: usize) {
        let breakdown: Vec<String> = counts
            .iter()
            .map(|(category, n)| format!("{}={}", category.label(), n))
            .collect();
        log::info!(
            "Stats: total {} | today {} | {}",
            total_count,
            today_count,
            breakdown.join(" ")
        );
    }

    fn on_status_changed(&mut self, status: CombinedStatus) {
        log::info!("Status: {}", status);
        if !status.is_online() {
            self.monitor_reported = None;
        }
    }

    fn on_channel_error(&mut self, kind: ChannelKind, message: &str) {
        log::error!("{} error: {}", kind, message);
    }

    fn on_notification_requested(&mut self, text: &str) {
        log::warn!("Anomaly detected: {}", text);
    }

    fn on_detail_requested(&mut self, index: usize, alert: &Alert) {
        log::info!(
            "Detail [{}] {} @ {}\n  {}\n  description: {}\n  image: {}\n  video: {}",
            index,
            alert.category().label(),
            format_display_time(&alert.timestamp),
            alert.text,
            alert.description.as_deref().unwrap_or("-"),
            alert.image_url().as_deref().unwrap_or("-"),
            alert.video_url().as_deref().unwrap_or("-"),
        );
    }

    fn on_channel_state(&mut self, kind: ChannelKind, state: ChannelState) {
        log::info!("{} -> {:?}", kind, state);
        if kind == ChannelKind::Video && state != ChannelState::Open && self.frames_shown > 0 {
            log::info!(
                "Video paused after {} frames (last {} bytes)",
                self.frames_shown,
                self.last_frame_bytes
            );
        }
    }

    fn on_frame(&mut self, frame: Frame) {
        self.frames_shown += 1;
        self.last_frame_bytes = frame.len();
        log::trace!("Frame {} ({} bytes)", self.frames_shown, frame.len());
    }

    fn on_monitor_tick(&mut self, elapsed: Duration) {
        if self.monitor_report_due(elapsed) {
            log::info!("Monitoring {}", format_monitor_duration(elapsed));
        }
    }
}
