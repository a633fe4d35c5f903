mod aggregator;
mod channels;
mod core;
mod messages;
mod state;

pub use aggregator::{AcceptedAlert, Acceptance, Aggregator, RejectReason};
pub use channels::{ChannelConnector, ChannelHandle, ChannelManager, Transition};
pub use core::{AlertEngine, command_channel};
pub use messages::{ChannelEvent, ChannelSignal, EngineCommand, Frame};
pub use state::{ChannelKind, ChannelState, CombinedStatus};
