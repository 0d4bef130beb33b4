//! Codec error types

use thiserror::Error;

/// Errors raised while validating an inbound frame.
///
/// These never escape the inbound path as failures: the classifier turns
/// them into "no event" so a stream can keep flowing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Frame shorter than its data type requires
    #[error("frame too short: need {needed} bytes, got {got}")]
    TooShort {
        /// Minimum length for this frame class
        needed: usize,
        /// Actual length
        got: usize,
    },

    /// Bad header or terminator byte
    #[error("malformed frame: {0}")]
    Malformed(&'static str),
}

/// Errors raised while building an outbound command.
///
/// Commands are rejected before any byte is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    /// Channel, group or scene index outside its category's range
    #[error("{what} {value} out of range ({min}-{max})")]
    ValueOutOfRange {
        /// Category name ("channel", "aux", "scene", ...)
        what: &'static str,
        /// Rejected value
        value: i64,
        /// Lowest accepted value
        min: i64,
        /// Highest accepted value
        max: i64,
    },

    /// Target category has no such control
    #[error("{what} has no {control} control")]
    UnsupportedTarget {
        /// Category name
        what: &'static str,
        /// Requested control ("on", "level", "solo")
        control: &'static str,
    },

    /// Fader percentage outside the range allowed by the current scaling
    #[error("fader level {value}% out of range (0-{max}%)")]
    InvalidPercent {
        /// Rejected percentage
        value: f64,
        /// Highest accepted percentage
        max: f64,
    },
}

/// Errors raised by a [`Transport`](crate::transport::Transport).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Output port has not been opened yet
    #[error("not connected to output port")]
    NotConnected,

    /// No port matched the configured name pattern
    #[error("MIDI port matching '{0}' not found")]
    PortNotFound(String),

    /// Backend failure
    #[error("MIDI error: {0}")]
    Midi(String),
}

/// Umbrella error for the session API
#[derive(Error, Debug)]
pub enum Error {
    /// Inbound frame rejected
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Outbound command rejected
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Transport failure
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
