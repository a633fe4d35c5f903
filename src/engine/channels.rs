use chrono::{DateTime, Local};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant};

use crate::config::EndpointSettings;
#[cfg(debug_assertions)]
use crate::config::DF;

use super::messages::ChannelEvent;
use super::state::{ChannelKind, ChannelState, CombinedStatus};

/// Close signal for one running transport. Dropping it closes the connection.
#[derive(Debug)]
pub struct ChannelHandle {
    _shutdown: Option<oneshot::Sender<()>>,
}

impl ChannelHandle {
    pub fn new(shutdown: oneshot::Sender<()>) -> Self {
        Self {
            _shutdown: Some(shutdown),
        }
    }

    /// A handle with no transport behind it.
    pub fn detached() -> Self {
        Self { _shutdown: None }
    }
}

/// Opens a transport for one channel.
///
/// The transport reports everything through `events`, tagging each event with
/// `generation`. It must emit `Closed` after any `Error`, and must stop once the
/// returned handle is dropped.
pub trait ChannelConnector {
    fn open(
        &self,
        kind: ChannelKind,
        url: String,
        generation: u64,
        events: UnboundedSender<ChannelEvent>,
    ) -> ChannelHandle;
}

/// Observable effect of one manager operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub channels: Vec<(ChannelKind, ChannelState)>,
    pub status: Option<CombinedStatus>,
}

impl Transition {
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.status.is_none()
    }
}

#[derive(Debug, Default)]
struct ChannelSlot {
    state: ChannelState,
    handle: Option<ChannelHandle>,
}

#[derive(Debug, Clone, Copy)]
struct SessionClock {
    started_at: DateTime<Local>,
    started: Instant,
}

/// Owns both channel lifecycles and fuses them into one status.
///
/// Every `connect` and `disconnect` starts a new generation; events stamped
/// with an older generation belong to a torn-down cycle and are ignored.
pub struct ChannelManager {
    connector: Box<dyn ChannelConnector>,
    endpoints: EndpointSettings,
    events: UnboundedSender<ChannelEvent>,
    alert: ChannelSlot,
    video: ChannelSlot,
    generation: u64,
    published: CombinedStatus,
    session: Option<SessionClock>,
}

impl ChannelManager {
    pub fn new(
        connector: Box<dyn ChannelConnector>,
        endpoints: EndpointSettings,
        events: UnboundedSender<ChannelEvent>,
    ) -> Self {
        Self {
            connector,
            endpoints,
            events,
            alert: ChannelSlot::default(),
            video: ChannelSlot::default(),
            generation: 0,
            published: CombinedStatus::Offline,
            session: None,
        }
    }

    pub fn state(&self, kind: ChannelKind) -> ChannelState {
        self.slot(kind).state
    }

    /// Last published status. Only open/close and connect/disconnect move it.
    pub fn status(&self) -> CombinedStatus {
        self.published
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn endpoints(&self) -> &EndpointSettings {
        &self.endpoints
    }

    pub fn session_started_at(&self) -> Option<DateTime<Local>> {
        self.session.map(|s| s.started_at)
    }

    /// Time since the session went online, `None` while offline.
    pub fn session_elapsed(&self) -> Option<Duration> {
        self.session.map(|s| s.started.elapsed())
    }

    pub fn is_current(&self, event: &ChannelEvent) -> bool {
        event.generation == self.generation
    }

    /// Open both channels. No-op unless both are disconnected.
    pub fn connect(&mut self) -> Transition {
        if ChannelKind::ALL
            .iter()
            .any(|&k| self.state(k) != ChannelState::Disconnected)
        {
            log::warn!(
                "Connect ignored: channels busy (alert {:?}, video {:?})",
                self.alert.state,
                self.video.state
            );
            return Transition::default();
        }

        self.generation += 1;
        let mut transition = Transition::default();
        for kind in ChannelKind::ALL {
            let url = match kind {
                ChannelKind::Alert => self.endpoints.alert_url(),
                ChannelKind::Video => self.endpoints.video_url(),
            };
            log::info!("Opening {} at {} (generation {})", kind, url, self.generation);

            let handle = self
                .connector
                .open(kind, url, self.generation, self.events.clone());
            let slot = self.slot_mut(kind);
            slot.handle = Some(handle);
            slot.state = ChannelState::Connecting;
            transition.channels.push((kind, ChannelState::Connecting));
        }
        transition
    }

    /// Close both channels from any state and force the status offline.
    pub fn disconnect(&mut self) -> Transition {
        self.generation += 1;
        let mut transition = Transition::default();
        for kind in ChannelKind::ALL {
            let slot = self.slot_mut(kind);
            // Dropping the handle signals the transport to close.
            slot.handle = None;
            if slot.state != ChannelState::Disconnected {
                slot.state = ChannelState::Disconnected;
                transition.channels.push((kind, ChannelState::Disconnected));
            }
        }

        if self.published.is_online() {
            log::info!("Session offline (disconnect)");
        }
        self.published = CombinedStatus::Offline;
        self.session = None;
        transition.status = Some(CombinedStatus::Offline);
        transition
    }

    pub fn on_open(&mut self, kind: ChannelKind) -> Transition {
        let mut transition = Transition::default();
        if self.state(kind) == ChannelState::Connecting {
            self.set_state(kind, ChannelState::Open, &mut transition);
            self.publish_status(&mut transition);
        }
        transition
    }

    /// Marks the channel failed. The status is left alone until the close that follows.
    pub fn on_error(&mut self, kind: ChannelKind) -> Transition {
        let mut transition = Transition::default();
        if matches!(
            self.state(kind),
            ChannelState::Connecting | ChannelState::Open
        ) {
            self.set_state(kind, ChannelState::ClosedWithError, &mut transition);
        }
        transition
    }

    /// Remote close. A channel that already failed stays `ClosedWithError`.
    pub fn on_closed(&mut self, kind: ChannelKind) -> Transition {
        let mut transition = Transition::default();
        if matches!(
            self.state(kind),
            ChannelState::Connecting | ChannelState::Open
        ) {
            self.set_state(kind, ChannelState::Disconnected, &mut transition);
        }
        self.slot_mut(kind).handle = None;
        self.publish_status(&mut transition);
        transition
    }

    fn set_state(&mut self, kind: ChannelKind, state: ChannelState, transition: &mut Transition) {
        #[cfg(debug_assertions)]
        if DF.log_channel_transitions {
            log::info!("{}: {:?} -> {:?}", kind, self.state(kind), state);
        }
        self.slot_mut(kind).state = state;
        transition.channels.push((kind, state));
    }

    fn publish_status(&mut self, transition: &mut Transition) {
        let derived = CombinedStatus::from_states(self.alert.state, self.video.state);
        if derived == self.published {
            return;
        }

        self.published = derived;
        match derived {
            CombinedStatus::Online => {
                if self.session.is_none() {
                    self.session = Some(SessionClock {
                        started_at: Local::now(),
                        started: Instant::now(),
                    });
                }
                log::info!("Session online");
            }
            CombinedStatus::Offline => {
                self.session = None;
                log::warn!("Session offline: no channel open");
            }
        }
        transition.status = Some(derived);
    }

    fn slot(&self, kind: ChannelKind) -> &ChannelSlot {
        match kind {
            ChannelKind::Alert => &self.alert,
            ChannelKind::Video => &self.video,
        }
    }

    fn slot_mut(&mut self, kind: ChannelKind) -> &mut ChannelSlot {
        match kind {
            ChannelKind::Alert => &mut self.alert,
            ChannelKind::Video => &mut self.video,
        }
    }
}
