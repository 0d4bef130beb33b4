//! Inbound event classification
//!
//! Maps a validated [`Frame`] onto one [`MixerEvent`]. Dispatch is by data
//! type, then by element code, with a parameter filter where the console
//! multiplexes several signals onto one element.

use serde::Serialize;
use std::fmt;
use tracing::trace;

use super::fader::{bytes_to_percent, MixerConfig};
use super::frame::{parse_frame, Frame};
use super::{element, library_function, setup_element, DataType, BUS_COUNT, CURRENT_SETTINGS};
use crate::midi::convert::{bytes_to_on, bytes_to_word};

/// What changed on the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    ChannelLevel,
    ChannelOn,
    BusLevel,
    BusOn,
    AuxLevel,
    AuxOn,
    InGroupMasterLevel,
    InGroupMasterOn,
    OutGroupMasterLevel,
    OutGroupMasterOn,
    SceneRecall,
    SceneStore,
    SoloChannel,
    SoloBus,
    SoloAux,
    SoloInGroupMaster,
    SoloOutGroupMaster,
}

/// How an event's value field is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCodec {
    /// 4-byte on/off switch
    OnOff,
    /// 4-byte fader register; master faders are always scaled absolutely
    Fader { master: bool },
    /// Two 14-bit words (function calls)
    Word,
}

impl EventKind {
    /// Value decoding strategy for this kind
    pub fn value_codec(self) -> ValueCodec {
        use EventKind::*;
        match self {
            ChannelLevel => ValueCodec::Fader { master: false },
            BusLevel | AuxLevel | InGroupMasterLevel | OutGroupMasterLevel => {
                ValueCodec::Fader { master: true }
            }
            ChannelOn | BusOn | AuxOn | InGroupMasterOn | OutGroupMasterOn | SoloChannel
            | SoloBus | SoloAux | SoloInGroupMaster | SoloOutGroupMaster => ValueCodec::OnOff,
            SceneRecall | SceneStore => ValueCodec::Word,
        }
    }

    /// Event name as used by event consumers
    pub fn name(self) -> &'static str {
        use EventKind::*;
        match self {
            ChannelLevel => "channelLevel",
            ChannelOn => "channelOn",
            BusLevel => "busLevel",
            BusOn => "busOn",
            AuxLevel => "auxLevel",
            AuxOn => "auxOn",
            InGroupMasterLevel => "inGroupMasterLevel",
            InGroupMasterOn => "inGroupMasterOn",
            OutGroupMasterLevel => "outGroupMasterLevel",
            OutGroupMasterOn => "outGroupMasterOn",
            SceneRecall => "sceneRecall",
            SceneStore => "sceneStore",
            SoloChannel => "soloChannel",
            SoloBus => "soloBus",
            SoloAux => "soloAux",
            SoloInGroupMaster => "soloInGroupMaster",
            SoloOutGroupMaster => "soloOutGroupMaster",
        }
    }
}

/// Decoded event value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventValue {
    /// Fader level in percent (0-100, or 0-200 for relative channel faders)
    Level(u16),
    /// Switch state
    On(bool),
    /// Scene or library number
    Word(u16),
}

/// A change reported by the console.
///
/// `channel` is 1-based for channel, bus, aux and group events. For scene
/// events it is the function call channel word, where
/// [`CURRENT_SETTINGS`] means the current mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MixerEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub channel: u16,
    pub value: EventValue,
}

impl fmt::Display for MixerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.value) {
            (EventKind::SceneRecall | EventKind::SceneStore, EventValue::Word(scene)) => {
                if self.channel == CURRENT_SETTINGS {
                    write!(f, "{} scene:{}", self.kind.name(), scene)
                } else {
                    write!(f, "{} scene:{} ch:{}", self.kind.name(), scene, self.channel)
                }
            }
            (_, EventValue::Level(level)) => {
                write!(f, "{} ch:{} = {}%", self.kind.name(), self.channel, level)
            }
            (_, EventValue::On(on)) => write!(
                f,
                "{} ch:{} = {}",
                self.kind.name(),
                self.channel,
                if on { "on" } else { "off" }
            ),
            (_, EventValue::Word(word)) => {
                write!(f, "{} ch:{} = {}", self.kind.name(), self.channel, word)
            }
        }
    }
}

/// Resolve the shared master solo element.
///
/// One element code reports solo for all 16 master layer slots: buses 1-8,
/// then auxes 1-8.
pub fn resolve_master_solo(wire_channel: u8) -> (EventKind, u16) {
    let channel = wire_channel as u16 + 1;
    if channel > BUS_COUNT as u16 {
        (EventKind::SoloAux, channel - BUS_COUNT as u16)
    } else {
        (EventKind::SoloBus, channel)
    }
}

/// Decode a raw message straight to an event.
///
/// Malformed frames are dropped like unknown ones.
pub fn decode(raw: &[u8], config: MixerConfig) -> Option<MixerEvent> {
    match parse_frame(raw) {
        Ok(frame) => classify(&frame, config),
        Err(e) => {
            trace!("Dropping frame: {}", e);
            None
        }
    }
}

/// Classify a validated frame.
///
/// Returns `None` for meter traffic and any element/parameter combination
/// that carries no event.
pub fn classify(frame: &Frame<'_>, config: MixerConfig) -> Option<MixerEvent> {
    match frame.data_type()? {
        DataType::EditBuffer => classify_edit_buffer(frame, config),
        DataType::FunctionCall => classify_function_call(frame),
        DataType::SetupMemory => classify_setup(frame, config),
        DataType::RemoteMeter => None,
        _ => None,
    }
}

fn classify_edit_buffer(frame: &Frame<'_>, config: MixerConfig) -> Option<MixerEvent> {
    use element::*;

    let kind = match (frame.element, frame.parameter) {
        (CHANNEL_FADER, _) => EventKind::ChannelLevel,
        (CHANNEL_ON, _) => EventKind::ChannelOn,
        (BUS_FADER, _) => EventKind::BusLevel,
        (BUS_ON, _) => EventKind::BusOn,
        (AUX_FADER, _) => EventKind::AuxLevel,
        (AUX_ON, _) => EventKind::AuxOn,
        (IN_GROUP_MASTER, GROUP_MASTER_FADER) => EventKind::InGroupMasterLevel,
        (IN_GROUP_MASTER, GROUP_MASTER_ON) => EventKind::InGroupMasterOn,
        (OUT_GROUP_MASTER, GROUP_MASTER_FADER) => EventKind::OutGroupMasterLevel,
        (OUT_GROUP_MASTER, GROUP_MASTER_ON) => EventKind::OutGroupMasterOn,
        _ => return None,
    };

    value_event(kind, frame.channel as u16 + 1, frame, config)
}

fn classify_setup(frame: &Frame<'_>, config: MixerConfig) -> Option<MixerEvent> {
    use setup_element::*;

    if frame.parameter != SOLO_PARAMETER {
        return None;
    }

    let wire = frame.channel;
    let (kind, channel) = match frame.element {
        SOLO_CH_ON => (EventKind::SoloChannel, wire as u16 + 1),
        SOLO_MASTER_ON => resolve_master_solo(wire),
        GROUP_SOLO_ON => (EventKind::SoloInGroupMaster, wire as u16 + 1),
        GROUP_SOLO_MASTER_ON => (EventKind::SoloOutGroupMaster, wire as u16 + 1),
        _ => return None,
    };

    value_event(kind, channel, frame, config)
}

fn classify_function_call(frame: &Frame<'_>) -> Option<MixerEvent> {
    let kind = match frame.element {
        library_function::SCENE_RECALL => EventKind::SceneRecall,
        library_function::SCENE_STORE => EventKind::SceneStore,
        _ => return None,
    };

    let scene = bytes_to_word(frame.parameter, frame.channel);
    let channel = match frame.data {
        [hi, lo, ..] => bytes_to_word(*hi, *lo),
        _ => return None,
    };

    Some(MixerEvent {
        kind,
        channel,
        value: EventValue::Word(scene),
    })
}

fn value_event(
    kind: EventKind,
    channel: u16,
    frame: &Frame<'_>,
    config: MixerConfig,
) -> Option<MixerEvent> {
    let field = frame.value_field()?;
    let value = match kind.value_codec() {
        ValueCodec::OnOff => EventValue::On(bytes_to_on(&field)),
        ValueCodec::Fader { master } => EventValue::Level(bytes_to_percent(&field, config, master)),
        ValueCodec::Word => return None,
    };

    Some(MixerEvent {
        kind,
        channel,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{FaderRange, FaderResolution};

    fn edit_buffer(element: u8, parameter: u8, channel: u8, value: [u8; 4]) -> Vec<u8> {
        let mut raw = vec![0xF0, 0x43, 0x10, 0x3E, 0x7F, 0x01, element, parameter, channel];
        raw.extend_from_slice(&value);
        raw.push(0xF7);
        raw
    }

    fn setup(element: u8, parameter: u8, channel: u8, on: bool) -> Vec<u8> {
        vec![
            0xF0, 0x43, 0x10, 0x3E, 0x0D, 0x03, element, parameter, channel, 0, 0, 0, on as u8,
            0xF7,
        ]
    }

    fn event(raw: &[u8]) -> Option<MixerEvent> {
        decode(raw, MixerConfig::default())
    }

    #[test]
    fn test_channel_on() {
        let raw = edit_buffer(element::CHANNEL_ON, 0, 4, [0, 0, 0, 1]);
        assert_eq!(
            event(&raw),
            Some(MixerEvent {
                kind: EventKind::ChannelOn,
                channel: 5,
                value: EventValue::On(true),
            })
        );
    }

    #[test]
    fn test_channel_level_uses_config() {
        // 207 is 0 dB at low resolution
        let raw = edit_buffer(element::CHANNEL_FADER, 0, 0, [0, 0, 1, 79]);
        let absolute = decode(&raw, MixerConfig::default()).unwrap();
        assert_eq!(absolute.value, EventValue::Level(81));

        let relative = decode(
            &raw,
            MixerConfig::new(FaderResolution::Low, FaderRange::Relative),
        )
        .unwrap();
        assert_eq!(relative.value, EventValue::Level(100));
    }

    #[test]
    fn test_master_levels_ignore_relative_range() {
        let config = MixerConfig::new(FaderResolution::Low, FaderRange::Relative);
        for element in [element::BUS_FADER, element::AUX_FADER] {
            let raw = edit_buffer(element, 0, 2, [0, 0, 1, 79]);
            let ev = decode(&raw, config).unwrap();
            assert_eq!(ev.channel, 3);
            assert_eq!(ev.value, EventValue::Level(81));
        }
    }

    #[test]
    fn test_group_master_parameter_split() {
        let level = edit_buffer(element::IN_GROUP_MASTER, 0x00, 1, [0, 0, 1, 0x7F]);
        let ev = event(&level).unwrap();
        assert_eq!(ev.kind, EventKind::InGroupMasterLevel);
        assert_eq!(ev.channel, 2);
        assert_eq!(ev.value, EventValue::Level(100));

        let on = edit_buffer(element::OUT_GROUP_MASTER, 0x02, 3, [0, 0, 0, 1]);
        let ev = event(&on).unwrap();
        assert_eq!(ev.kind, EventKind::OutGroupMasterOn);
        assert_eq!(ev.channel, 4);
        assert_eq!(ev.value, EventValue::On(true));

        let other = edit_buffer(element::IN_GROUP_MASTER, 0x01, 0, [0, 0, 0, 1]);
        assert_eq!(event(&other), None);
    }

    #[test]
    fn test_master_solo_remapping() {
        assert_eq!(resolve_master_solo(0), (EventKind::SoloBus, 1));
        assert_eq!(resolve_master_solo(7), (EventKind::SoloBus, 8));
        assert_eq!(resolve_master_solo(8), (EventKind::SoloAux, 1));
        assert_eq!(resolve_master_solo(15), (EventKind::SoloAux, 8));

        let ev = event(&setup(setup_element::SOLO_MASTER_ON, 0, 8, true)).unwrap();
        assert_eq!(ev.kind, EventKind::SoloAux);
        assert_eq!(ev.channel, 1);
        assert_eq!(ev.value, EventValue::On(true));
    }

    #[test]
    fn test_group_solo_elements_are_distinct() {
        let ev = event(&setup(setup_element::GROUP_SOLO_ON, 0, 0, true)).unwrap();
        assert_eq!(ev.kind, EventKind::SoloInGroupMaster);

        let ev = event(&setup(setup_element::GROUP_SOLO_MASTER_ON, 0, 3, false)).unwrap();
        assert_eq!(ev.kind, EventKind::SoloOutGroupMaster);
        assert_eq!(ev.channel, 4);
        assert_eq!(ev.value, EventValue::On(false));
    }

    #[test]
    fn test_solo_parameter_filter() {
        assert!(event(&setup(setup_element::SOLO_CH_ON, 0x00, 0, true)).is_some());
        assert_eq!(event(&setup(setup_element::SOLO_CH_ON, 0x01, 0, true)), None);
        assert_eq!(event(&setup(0x7E, 0x00, 0, true)), None);
    }

    #[test]
    fn test_scene_function_calls() {
        let recall = [0xF0, 0x43, 0x10, 0x3E, 0x7F, 0x10, 0x00, 0x00, 0x0C, 0x02, 0x00, 0xF7];
        let ev = event(&recall).unwrap();
        assert_eq!(ev.kind, EventKind::SceneRecall);
        assert_eq!(ev.value, EventValue::Word(12));
        assert_eq!(ev.channel, CURRENT_SETTINGS);

        let store = [0xF0, 0x43, 0x10, 0x3E, 0x7F, 0x10, 0x20, 0x00, 0x63, 0x02, 0x00, 0xF7];
        assert_eq!(event(&store).unwrap().kind, EventKind::SceneStore);

        let unknown = [0xF0, 0x43, 0x10, 0x3E, 0x7F, 0x10, 0x05, 0x00, 0x01, 0x02, 0x00, 0xF7];
        assert_eq!(event(&unknown), None);
    }

    #[test]
    fn test_meter_frames_are_dropped() {
        let mut raw = edit_buffer(0x00, 0x00, 0x00, [0x10, 0x20, 0x30, 0x40]);
        raw[5] = DataType::RemoteMeter as u8;
        assert_eq!(event(&raw), None);
    }

    #[test]
    fn test_invalid_frames_yield_nothing() {
        let valid = edit_buffer(element::CHANNEL_ON, 0, 0, [0, 0, 0, 1]);
        assert!(event(&valid).is_some());

        assert_eq!(event(&valid[..11]), None);
        for offset in [0, 1, 3] {
            let mut raw = valid.clone();
            raw[offset] ^= 0x01;
            assert_eq!(event(&raw), None);
        }
    }

    #[test]
    fn test_display() {
        let ev = MixerEvent {
            kind: EventKind::ChannelLevel,
            channel: 5,
            value: EventValue::Level(50),
        };
        assert_eq!(ev.to_string(), "channelLevel ch:5 = 50%");

        let ev = MixerEvent {
            kind: EventKind::SceneRecall,
            channel: CURRENT_SETTINGS,
            value: EventValue::Word(3),
        };
        assert_eq!(ev.to_string(), "sceneRecall scene:3");
    }

    #[test]
    fn test_serialize() {
        let ev = MixerEvent {
            kind: EventKind::SoloAux,
            channel: 2,
            value: EventValue::On(true),
        };
        let json = serde_json::to_value(ev).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "soloAux", "channel": 2, "value": true })
        );
    }
}
