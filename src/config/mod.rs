//! Configuration module for the alert console.

mod debug;
mod display;
mod lexicon;
mod stream;

pub use debug::DF;
pub use display::DISPLAY;
pub use lexicon::{HEARTBEAT_MARKER, KeywordRule, Lexicon};
pub use stream::{EndpointSettings, STREAM};
