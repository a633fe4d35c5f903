//! Display-side constants handed to the presentation layer.

pub struct PreviewConfig {
    /// Characters kept in the toast / notification preview.
    pub notification_chars: usize,
    /// Characters kept in the history list row.
    pub list_chars: usize,
    pub ellipsis: &'static str,
}

pub struct MediaConfig {
    /// Path prefix under which the backend serves evidence images and clips.
    pub evidence_prefix: &'static str,
}

pub struct ConsoleConfig {
    /// The terminal reports the monitor duration once per this many seconds
    /// (the tick itself is every second).
    pub monitor_report_secs: u64,
}

pub struct DisplayConfig {
    pub preview: PreviewConfig,
    pub media: MediaConfig,
    pub console: ConsoleConfig,
}

pub const DISPLAY: DisplayConfig = DisplayConfig {
    preview: PreviewConfig {
        notification_chars: 50,
        list_chars: 60,
        ellipsis: "...",
    },
    media: MediaConfig {
        evidence_prefix: "/video_warning/",
    },
    console: ConsoleConfig {
        monitor_report_secs: 10,
    },
};
