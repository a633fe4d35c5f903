use std::fmt;

use serde::{Deserialize, Serialize};

/// The two independent stream connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    /// JSON alert events.
    Alert,
    /// Binary video frames.
    Video,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 2] = [ChannelKind::Alert, ChannelKind::Video];
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Alert => write!(f, "alert channel"),
            ChannelKind::Video => write!(f, "video channel"),
        }
    }
}

/// Lifecycle of a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    ClosedWithError,
}

impl ChannelState {
    pub fn is_open(&self) -> bool {
        matches!(self, ChannelState::Open)
    }
}

/// Single online/offline signal fused from both channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CombinedStatus {
    Online,
    #[default]
    Offline,
}

impl CombinedStatus {
    /// Either channel open is enough.
    pub fn from_states(alert: ChannelState, video: ChannelState) -> Self {
        if alert.is_open() || video.is_open() {
            CombinedStatus::Online
        } else {
            CombinedStatus::Offline
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, CombinedStatus::Online)
    }
}

impl fmt::Display for CombinedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombinedStatus::Online => write!(f, "online"),
            CombinedStatus::Offline => write!(f, "offline"),
        }
    }
}
