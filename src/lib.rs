//! V96 Remote
//!
//! SysEx remote control for Yamaha 01V96 consoles: a codec for the parameter
//! change and request messages, an event classifier for console feedback,
//! and a [`Mixer`] session on top of a MIDI [`Transport`].

pub mod config;
pub mod midi;
pub mod mixer;
pub mod observer;
pub mod protocol;
pub mod transport;

pub use config::{AppConfig, SharedMixerConfig};
pub use mixer::Mixer;
pub use observer::{NullObserver, Observer, TracingObserver};
pub use protocol::{
    Command, Error, EventKind, EventValue, FaderRange, FaderResolution, MixerConfig, MixerEvent,
    Result, Target,
};
pub use transport::{MemoryTransport, MidiTransport, Transport};
