//! Outbound command encoding
//!
//! A [`Command`] is the pre-frame form of an outbound message. The typed
//! builders validate their 1-based index against the category's size and
//! fail with [`CommandError::ValueOutOfRange`] before producing any bytes.

use std::fmt;

use super::error::CommandError;
use super::fader::{percent_to_bytes, MixerConfig};
use super::frame::build_frame;
use super::{
    element, library_function, remote_key, setup_element, DataType, ParameterFormat, SubStatus,
    AUX_COUNT, BUS_COUNT, CHANNEL_COUNT, CURRENT_SETTINGS, IN_GROUP_COUNT, MASTER_COUNT, MAX_SCENE,
    OUT_GROUP_COUNT,
};
use crate::midi::convert::{on_to_bytes, word_to_bytes};
use crate::midi::format_hex;

/// A strip on the console, numbered from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Input channel 1-32
    Channel(u8),
    /// Aux output 1-8
    Aux(u8),
    /// Bus output 1-8
    Bus(u8),
    /// Master layer slot 1-16 (buses 1-8, then auxes 1-8); solo only
    Master(u8),
    /// Input group master 1-8
    InGroup(u8),
    /// Output group master 1-4
    OutGroup(u8),
}

impl Target {
    /// Category name used in errors and logs
    pub fn category(self) -> &'static str {
        match self {
            Target::Channel(_) => "channel",
            Target::Aux(_) => "aux",
            Target::Bus(_) => "bus",
            Target::Master(_) => "master channel",
            Target::InGroup(_) => "input group",
            Target::OutGroup(_) => "output group",
        }
    }

    /// 1-based index
    pub fn index(self) -> u8 {
        match self {
            Target::Channel(n)
            | Target::Aux(n)
            | Target::Bus(n)
            | Target::Master(n)
            | Target::InGroup(n)
            | Target::OutGroup(n) => n,
        }
    }

    /// Number of strips in the category
    pub fn count(self) -> u8 {
        match self {
            Target::Channel(_) => CHANNEL_COUNT,
            Target::Aux(_) => AUX_COUNT,
            Target::Bus(_) => BUS_COUNT,
            Target::Master(_) => MASTER_COUNT,
            Target::InGroup(_) => IN_GROUP_COUNT,
            Target::OutGroup(_) => OUT_GROUP_COUNT,
        }
    }

    /// Master faders are scaled absolutely
    pub fn is_master(self) -> bool {
        !matches!(self, Target::Channel(_))
    }

    /// Check the index and return the 0-based wire channel
    pub fn wire_channel(self) -> Result<u8, CommandError> {
        let n = self.index();
        if n < 1 || n > self.count() {
            return Err(CommandError::ValueOutOfRange {
                what: self.category(),
                value: n as i64,
                min: 1,
                max: self.count() as i64,
            });
        }
        Ok(n - 1)
    }

    fn unsupported(self, control: &'static str) -> CommandError {
        CommandError::UnsupportedTarget {
            what: self.category(),
            control,
        }
    }

    /// Edit buffer (element, parameter) of the on switch
    fn on_address(self) -> Result<(u8, u8), CommandError> {
        match self {
            Target::Channel(_) => Ok((element::CHANNEL_ON, 0x00)),
            Target::Aux(_) => Ok((element::AUX_ON, 0x00)),
            Target::Bus(_) => Ok((element::BUS_ON, 0x00)),
            Target::InGroup(_) => Ok((element::IN_GROUP_MASTER, element::GROUP_MASTER_ON)),
            Target::OutGroup(_) => Ok((element::OUT_GROUP_MASTER, element::GROUP_MASTER_ON)),
            Target::Master(_) => Err(self.unsupported("on")),
        }
    }

    /// Edit buffer (element, parameter) of the fader
    fn fader_address(self) -> Result<(u8, u8), CommandError> {
        match self {
            Target::Channel(_) => Ok((element::CHANNEL_FADER, 0x00)),
            Target::Aux(_) => Ok((element::AUX_FADER, 0x00)),
            Target::Bus(_) => Ok((element::BUS_FADER, 0x00)),
            Target::InGroup(_) => Ok((element::IN_GROUP_MASTER, element::GROUP_MASTER_FADER)),
            Target::OutGroup(_) => Ok((element::OUT_GROUP_MASTER, element::GROUP_MASTER_FADER)),
            Target::Master(_) => Err(self.unsupported("level")),
        }
    }

    /// Setup memory (element, wire channel) of the solo switch.
    ///
    /// Buses and auxes share the master solo element; auxes sit after the
    /// buses, mirroring [`resolve_master_solo`](super::event::resolve_master_solo).
    fn solo_address(self) -> Result<(u8, u8), CommandError> {
        let wire = self.wire_channel()?;
        let address = match self {
            Target::Channel(_) => (setup_element::SOLO_CH_ON, wire),
            Target::Bus(_) | Target::Master(_) => (setup_element::SOLO_MASTER_ON, wire),
            Target::Aux(_) => (setup_element::SOLO_MASTER_ON, BUS_COUNT + wire),
            Target::InGroup(_) => (setup_element::GROUP_SOLO_ON, wire),
            Target::OutGroup(_) => (setup_element::GROUP_SOLO_MASTER_ON, wire),
        };
        Ok(address)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.category(), self.index())
    }
}

/// A parameter change or request, ready to be framed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub sub_status: SubStatus,
    pub format: ParameterFormat,
    pub data_type: DataType,
    pub element: u8,
    /// One byte, or a 14-bit word for function calls
    pub parameter: Vec<u8>,
    /// One byte, or a 14-bit word for function calls
    pub channel: Vec<u8>,
    /// Value field for changes, optional trailer for requests
    pub extra: Vec<u8>,
}

/// Build a parameter change
pub fn encode_set(
    format: ParameterFormat,
    data_type: DataType,
    element: u8,
    parameter: &[u8],
    channel: &[u8],
    value: &[u8],
) -> Command {
    Command {
        sub_status: SubStatus::ParameterChange,
        format,
        data_type,
        element,
        parameter: parameter.to_vec(),
        channel: channel.to_vec(),
        extra: value.to_vec(),
    }
}

/// Build a parameter request
pub fn encode_request(
    format: ParameterFormat,
    data_type: DataType,
    element: u8,
    parameter: u8,
    channel: u8,
    extra: &[u8],
) -> Command {
    Command {
        sub_status: SubStatus::ParameterRequest,
        format,
        data_type,
        element,
        parameter: vec![parameter],
        channel: vec![channel],
        extra: extra.to_vec(),
    }
}

impl Command {
    /// Message body from the element byte on
    fn body(&self) -> Vec<u8> {
        let mut body =
            Vec::with_capacity(1 + self.parameter.len() + self.channel.len() + self.extra.len());
        body.push(self.element);
        body.extend_from_slice(&self.parameter);
        body.extend_from_slice(&self.channel);
        body.extend_from_slice(&self.extra);
        body
    }

    /// `[format, data type, element, parameter.., channel.., extra..]`
    pub fn payload(&self) -> Vec<u8> {
        let mut payload = vec![self.format as u8, self.data_type as u8];
        payload.extend(self.body());
        payload
    }

    /// Complete SysEx message
    pub fn to_frame(&self) -> Vec<u8> {
        build_frame(self.sub_status, self.format, self.data_type, &self.body())
    }

    /// Switch a strip on or off
    pub fn set_on(target: Target, on: bool) -> Result<Self, CommandError> {
        let (element, parameter) = target.on_address()?;
        let channel = target.wire_channel()?;
        Ok(encode_set(
            ParameterFormat::Universal,
            DataType::EditBuffer,
            element,
            &[parameter],
            &[channel],
            &on_to_bytes(on),
        ))
    }

    /// Ask for a strip's on state
    pub fn request_on(target: Target) -> Result<Self, CommandError> {
        let (element, parameter) = target.on_address()?;
        let channel = target.wire_channel()?;
        Ok(encode_request(
            ParameterFormat::Universal,
            DataType::EditBuffer,
            element,
            parameter,
            channel,
            &[],
        ))
    }

    /// Move a fader to `percent` under `config`
    pub fn set_level(target: Target, percent: f64, config: MixerConfig) -> Result<Self, CommandError> {
        let (element, parameter) = target.fader_address()?;
        let channel = target.wire_channel()?;
        let value = percent_to_bytes(percent, config, target.is_master())?;
        Ok(encode_set(
            ParameterFormat::Universal,
            DataType::EditBuffer,
            element,
            &[parameter],
            &[channel],
            &value,
        ))
    }

    /// Ask for a fader level
    pub fn request_level(target: Target) -> Result<Self, CommandError> {
        let (element, parameter) = target.fader_address()?;
        let channel = target.wire_channel()?;
        Ok(encode_request(
            ParameterFormat::Universal,
            DataType::EditBuffer,
            element,
            parameter,
            channel,
            &[],
        ))
    }

    /// Set a solo switch
    pub fn set_solo(target: Target, solo: bool) -> Result<Self, CommandError> {
        let (element, channel) = target.solo_address()?;
        Ok(encode_set(
            ParameterFormat::Console,
            DataType::SetupMemory,
            element,
            &[setup_element::SOLO_PARAMETER],
            &[channel],
            &on_to_bytes(solo),
        ))
    }

    /// Ask for a solo state
    pub fn request_solo(target: Target) -> Result<Self, CommandError> {
        let (element, channel) = target.solo_address()?;
        Ok(encode_request(
            ParameterFormat::Console,
            DataType::SetupMemory,
            element,
            setup_element::SOLO_PARAMETER,
            channel,
            &[],
        ))
    }

    /// Recall a scene memory into the current settings
    pub fn recall_scene(scene: u16) -> Result<Self, CommandError> {
        Self::library(library_function::SCENE_RECALL, scene)
    }

    /// Store the current settings into a scene memory
    pub fn store_scene(scene: u16) -> Result<Self, CommandError> {
        Self::library(library_function::SCENE_STORE, scene)
    }

    fn library(function: u8, scene: u16) -> Result<Self, CommandError> {
        if scene > MAX_SCENE {
            return Err(CommandError::ValueOutOfRange {
                what: "scene",
                value: scene as i64,
                min: 0,
                max: MAX_SCENE as i64,
            });
        }

        Ok(encode_set(
            ParameterFormat::Universal,
            DataType::FunctionCall,
            function,
            &word_to_bytes(scene),
            &word_to_bytes(CURRENT_SETTINGS),
            &[],
        ))
    }

    /// Press the console's SOLO CLEAR key
    pub fn clear_solo() -> Self {
        let (parameter, channel) = remote_key::SOLO_CLEAR;
        encode_set(
            ParameterFormat::Console,
            DataType::RemoteKey,
            0x00,
            &[parameter],
            &[channel],
            &[0x01],
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.sub_status {
            SubStatus::ParameterChange => "change",
            SubStatus::ParameterRequest => "request",
        };
        write!(f, "{} {}", kind, format_hex(&self.payload()))
    }
}
