//! Debugging feature flags.

#[allow(dead_code)]
pub struct LogFlags {
    /// Log every open/close/error transition of the two channels.
    pub log_channel_transitions: bool,

    /// Log each inbound alert payload before classification.
    pub log_alert_payloads: bool,

    /// Log dropped heartbeat ("no anomaly") messages.
    pub log_heartbeats: bool,

    /// Log every video frame size (very noisy).
    pub log_frames: bool,

    /// Log events discarded by the generation guard.
    pub log_stale_events: bool,
}

pub const DF: LogFlags = LogFlags {
    log_channel_transitions: true,
    log_stale_events: true,

    log_alert_payloads: false,
    log_heartbeats: false,
    log_frames: false,
};
