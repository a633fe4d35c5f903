//! Stream endpoint and scheduling configuration.

use std::time::Duration;

/// Endpoint layout of the analysis backend. Both channels are host-relative.
pub struct EndpointConfig {
    pub default_host: &'static str,
    pub alert_path: &'static str,
    pub video_path: &'static str,
}

pub struct ScheduleConfig {
    /// Period of the monitor-duration tick while online.
    pub monitor_tick: Duration,
    /// Pause between the disconnect and connect halves of a reconnect.
    pub reconnect_pause: Duration,
}

pub struct StreamConfig {
    pub endpoints: EndpointConfig,
    pub schedule: ScheduleConfig,
}

pub const STREAM: StreamConfig = StreamConfig {
    endpoints: EndpointConfig {
        default_host: "127.0.0.1:8000",
        alert_path: "/alerts",
        video_path: "/video_feed",
    },
    schedule: ScheduleConfig {
        monitor_tick: Duration::from_secs(1),
        reconnect_pause: Duration::from_millis(1000),
    },
};

/// Runtime endpoint selection, built from the CLI (or defaults).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSettings {
    pub host: String,
    pub alert_path: String,
    pub video_path: String,
    pub secure: bool,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            host: STREAM.endpoints.default_host.to_string(),
            alert_path: STREAM.endpoints.alert_path.to_string(),
            video_path: STREAM.endpoints.video_path.to_string(),
            secure: false,
        }
    }
}

impl EndpointSettings {
    pub fn alert_url(&self) -> String {
        self.url_for(&self.alert_path)
    }

    pub fn video_url(&self) -> String {
        self.url_for(&self.video_path)
    }

    fn url_for(&self, path: &str) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        if path.starts_with('/') {
            format!("{}://{}{}", scheme, self.host, path)
        } else {
            format!("{}://{}/{}", scheme, self.host, path)
        }
    }
}
