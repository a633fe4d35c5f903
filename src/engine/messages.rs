use super::state::ChannelKind;

/// One still image from the video channel. Owned, so the backing buffer is
/// released as soon as whoever displays it drops it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
}

impl Frame {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// What a transport task observed on its connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSignal {
    Opened,
    Text(String),
    Binary(Vec<u8>),
    /// Transport-level failure. Always followed by `Closed`.
    Error(String),
    Closed,
}

/// A transport observation tagged with the connect cycle that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    pub generation: u64,
    pub kind: ChannelKind,
    pub signal: ChannelSignal,
}

impl ChannelEvent {
    pub fn new(generation: u64, kind: ChannelKind, signal: ChannelSignal) -> Self {
        Self {
            generation,
            kind,
            signal,
        }
    }
}

/// Operator actions fed into [`crate::engine::AlertEngine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    Connect,
    Disconnect,
    /// Disconnect, pause, connect. History survives.
    Reconnect,
    /// Select the alert at this history index for the detail view.
    ShowDetail(usize),
    Shutdown,
}
