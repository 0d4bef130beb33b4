//! 01V96 remote SysEx protocol
//!
//! Every message shares one envelope:
//!
//! ```text
//! F0 43 <sub-status> 3E <format> <data type> <element> <parameter> <channel> <data...> F7
//! ```
//!
//! Inbound traffic goes through [`frame::parse_frame`] then [`event::classify`];
//! outbound traffic is built as a [`command::Command`] and wrapped by
//! [`frame::build_frame`].

pub mod command;
pub mod error;
pub mod event;
pub mod fader;
pub mod frame;

pub use command::{Command, Target};
pub use error::{CommandError, Error, FrameError, Result, TransportError};
pub use event::{classify, EventKind, EventValue, MixerEvent};
pub use fader::{FaderRange, FaderResolution, MixerConfig};
pub use frame::{build_frame, parse_frame, Frame};

/// SysEx start byte
pub const SYSEX_START: u8 = 0xF0;
/// Yamaha manufacturer ID
pub const MANUFACTURER_ID: u8 = 0x43;
/// Digital mixer device family ID
pub const DEVICE_FAMILY: u8 = 0x3E;
/// SysEx end byte
pub const SYSEX_END: u8 = 0xF7;

/// Input channels
pub const CHANNEL_COUNT: u8 = 32;
/// Aux outputs
pub const AUX_COUNT: u8 = 8;
/// Bus outputs
pub const BUS_COUNT: u8 = 8;
/// Master layer slots: buses first, then auxes
pub const MASTER_COUNT: u8 = BUS_COUNT + AUX_COUNT;
/// Input group masters
pub const IN_GROUP_COUNT: u8 = 8;
/// Output group masters
pub const OUT_GROUP_COUNT: u8 = 4;
/// Highest scene memory number
pub const MAX_SCENE: u16 = 99;
/// Function call channel word meaning "current settings"
pub const CURRENT_SETTINGS: u16 = 256;

/// Message sub-status (high nibble of byte 2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SubStatus {
    /// Set a value, or report a changed value
    ParameterChange = 0x10,
    /// Ask the console to report a value
    ParameterRequest = 0x30,
}

impl SubStatus {
    /// Decode from the raw byte, ignoring the device number nibble
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte & 0xF0 {
            0x10 => Some(SubStatus::ParameterChange),
            0x30 => Some(SubStatus::ParameterRequest),
            _ => None,
        }
    }
}

/// Parameter format byte (byte 4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ParameterFormat {
    /// Shared by the whole digital mixer family
    Universal = 0x7F,
    /// 01V96-specific parameters
    Console = 0x0D,
}

/// Top-level message category (byte 5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    EditBuffer = 0x01,
    PatchData = 0x02,
    SetupMemory = 0x03,
    BackupMemory = 0x04,
    FunctionCall = 0x10,
    RemoteKey = 0x20,
    RemoteMeter = 0x21,
}

impl DataType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(DataType::EditBuffer),
            0x02 => Some(DataType::PatchData),
            0x03 => Some(DataType::SetupMemory),
            0x04 => Some(DataType::BackupMemory),
            0x10 => Some(DataType::FunctionCall),
            0x20 => Some(DataType::RemoteKey),
            0x21 => Some(DataType::RemoteMeter),
            _ => None,
        }
    }
}

/// Edit buffer element codes
pub mod element {
    pub const CHANNEL_ON: u8 = 0x1A;
    pub const CHANNEL_FADER: u8 = 0x1C;
    pub const BUS_ON: u8 = 0x29;
    pub const BUS_FADER: u8 = 0x2B;
    pub const AUX_ON: u8 = 0x36;
    pub const AUX_FADER: u8 = 0x39;
    pub const STEREO_ON: u8 = 0x4D;
    pub const IN_GROUP_MASTER: u8 = 0x5C;
    pub const OUT_GROUP_MASTER: u8 = 0x5E;

    /// Group master parameter selecting the fader
    pub const GROUP_MASTER_FADER: u8 = 0x00;
    /// Group master parameter selecting the on switch
    pub const GROUP_MASTER_ON: u8 = 0x02;
}

/// Setup memory element codes
pub mod setup_element {
    pub const SOLO_CH_ON: u8 = 0x2E;
    /// Shared by bus and aux outputs, see [`crate::protocol::event::resolve_master_solo`]
    pub const SOLO_MASTER_ON: u8 = 0x2F;
    pub const GROUP_SOLO_ON: u8 = 0x30;
    pub const GROUP_SOLO_MASTER_ON: u8 = 0x31;

    /// Only this parameter carries the solo switch; the rest are dropped
    pub const SOLO_PARAMETER: u8 = 0x00;
}

/// Function call library codes
pub mod library_function {
    pub const SCENE_RECALL: u8 = 0x00;
    pub const SCENE_STORE: u8 = 0x20;
}

/// Remote key codes as (parameter, channel)
pub mod remote_key {
    pub const SOLO_CLEAR: (u8, u8) = (0x00, 0x3F);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_status_ignores_device_number() {
        assert_eq!(SubStatus::from_byte(0x10), Some(SubStatus::ParameterChange));
        assert_eq!(SubStatus::from_byte(0x1F), Some(SubStatus::ParameterChange));
        assert_eq!(SubStatus::from_byte(0x32), Some(SubStatus::ParameterRequest));
        assert_eq!(SubStatus::from_byte(0x00), None);
    }

    #[test]
    fn test_data_type_codes() {
        assert_eq!(DataType::from_byte(0x21), Some(DataType::RemoteMeter));
        assert_eq!(DataType::from_byte(0x10), Some(DataType::FunctionCall));
        assert_eq!(DataType::from_byte(0x7F), None);
        assert_eq!(DataType::SetupMemory as u8, 0x03);
    }
}
