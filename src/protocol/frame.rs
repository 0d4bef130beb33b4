//! Message envelope validation and construction

use super::error::FrameError;
use super::{
    DataType, ParameterFormat, SubStatus, DEVICE_FAMILY, MANUFACTURER_ID, SYSEX_END, SYSEX_START,
};

/// Shortest frame of any kind (function calls: two 2-byte words)
pub const MIN_FRAME_LEN: usize = 12;
/// Frames carrying a 4-byte value field
pub const VALUE_FRAME_LEN: usize = 14;
/// Offset of the first data byte after the channel
pub const DATA_OFFSET: usize = 9;

/// A frame whose envelope has been checked.
///
/// Borrows the raw message; nothing is retained past classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Raw sub-status byte including the device number nibble
    pub sub_status: u8,
    pub format: u8,
    pub data_type: u8,
    pub element: u8,
    pub parameter: u8,
    pub channel: u8,
    /// Bytes between the channel and the terminator
    pub data: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn sub_status(&self) -> Option<SubStatus> {
        SubStatus::from_byte(self.sub_status)
    }

    pub fn data_type(&self) -> Option<DataType> {
        DataType::from_byte(self.data_type)
    }

    /// The leading 4-byte value field, if the frame carries one
    pub fn value_field(&self) -> Option<[u8; 4]> {
        self.data.get(..4)?.try_into().ok()
    }
}

/// Minimum frame length for a data type byte
fn min_len(data_type: u8) -> usize {
    match DataType::from_byte(data_type) {
        Some(DataType::EditBuffer) | Some(DataType::SetupMemory) => VALUE_FRAME_LEN,
        _ => MIN_FRAME_LEN,
    }
}

/// Validate the envelope of a raw message.
///
/// Never panics, whatever the input.
pub fn parse_frame(raw: &[u8]) -> Result<Frame<'_>, FrameError> {
    if raw.len() < MIN_FRAME_LEN {
        return Err(FrameError::TooShort {
            needed: MIN_FRAME_LEN,
            got: raw.len(),
        });
    }

    if raw[0] != SYSEX_START {
        return Err(FrameError::Malformed("missing SysEx start byte"));
    }
    if raw[1] != MANUFACTURER_ID {
        return Err(FrameError::Malformed("not a Yamaha message"));
    }
    if raw[3] != DEVICE_FAMILY {
        return Err(FrameError::Malformed("not a digital mixer message"));
    }
    if raw[raw.len() - 1] != SYSEX_END {
        return Err(FrameError::Malformed("missing SysEx end byte"));
    }

    let needed = min_len(raw[5]);
    if raw.len() < needed {
        return Err(FrameError::TooShort {
            needed,
            got: raw.len(),
        });
    }

    Ok(Frame {
        sub_status: raw[2],
        format: raw[4],
        data_type: raw[5],
        element: raw[6],
        parameter: raw[7],
        channel: raw[8],
        data: &raw[DATA_OFFSET..raw.len() - 1],
    })
}

/// Wrap a message body in the SysEx envelope.
///
/// `body` starts at the element byte.
pub fn build_frame(
    sub_status: SubStatus,
    format: ParameterFormat,
    data_type: DataType,
    body: &[u8],
) -> Vec<u8> {
    let mut frame = Vec::with_capacity(body.len() + 7);
    frame.extend_from_slice(&[
        SYSEX_START,
        MANUFACTURER_ID,
        sub_status as u8,
        DEVICE_FAMILY,
        format as u8,
        data_type as u8,
    ]);
    frame.extend_from_slice(body);
    frame.push(SYSEX_END);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::event::decode;
    use crate::protocol::{FaderRange, FaderResolution, MixerConfig};
    use proptest::prelude::*;

    fn all_configs() -> [MixerConfig; 4] {
        [
            MixerConfig::new(FaderResolution::Low, FaderRange::Absolute),
            MixerConfig::new(FaderResolution::Low, FaderRange::Relative),
            MixerConfig::new(FaderResolution::High, FaderRange::Absolute),
            MixerConfig::new(FaderResolution::High, FaderRange::Relative),
        ]
    }

    const CHANNEL_ON_FRAME: [u8; 14] = [
        0xF0, 0x43, 0x10, 0x3E, 0x7F, 0x01, 0x1A, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01, 0xF7,
    ];

    #[test]
    fn test_parse_value_frame() {
        let frame = parse_frame(&CHANNEL_ON_FRAME).unwrap();
        assert_eq!(frame.sub_status(), Some(SubStatus::ParameterChange));
        assert_eq!(frame.format, 0x7F);
        assert_eq!(frame.data_type(), Some(DataType::EditBuffer));
        assert_eq!(frame.element, 0x1A);
        assert_eq!(frame.parameter, 0x00);
        assert_eq!(frame.channel, 0x04);
        assert_eq!(frame.value_field(), Some([0, 0, 0, 1]));
    }

    #[test]
    fn test_parse_function_call_frame() {
        let raw = [0xF0, 0x43, 0x10, 0x3E, 0x7F, 0x10, 0x00, 0x00, 0x05, 0x02, 0x00, 0xF7];
        let frame = parse_frame(&raw).unwrap();
        assert_eq!(frame.data_type(), Some(DataType::FunctionCall));
        assert_eq!(frame.data, &[0x02, 0x00]);
        assert_eq!(frame.value_field(), None);
    }

    #[test]
    fn test_reject_short_frames() {
        for len in 0..MIN_FRAME_LEN {
            assert!(matches!(
                parse_frame(&CHANNEL_ON_FRAME[..len]),
                Err(FrameError::TooShort { .. })
            ));
        }

        // Edit buffer frames need their value field
        let mut short = CHANNEL_ON_FRAME[..12].to_vec();
        short[11] = 0xF7;
        assert_eq!(
            parse_frame(&short),
            Err(FrameError::TooShort {
                needed: 14,
                got: 12
            })
        );
    }

    #[test]
    fn test_reject_bad_envelope() {
        for (offset, byte) in [(0, 0xF1), (1, 0x41), (3, 0x3F), (13, 0x00)] {
            let mut raw = CHANNEL_ON_FRAME;
            raw[offset] = byte;
            assert!(
                matches!(parse_frame(&raw), Err(FrameError::Malformed(_))),
                "offset {} accepted",
                offset
            );
        }
    }

    #[test]
    fn test_build_frame() {
        let frame = build_frame(
            SubStatus::ParameterChange,
            ParameterFormat::Universal,
            DataType::EditBuffer,
            &[0x1A, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01],
        );
        assert_eq!(frame, CHANNEL_ON_FRAME);
    }

    #[test]
    fn test_build_request_frame() {
        let frame = build_frame(
            SubStatus::ParameterRequest,
            ParameterFormat::Console,
            DataType::SetupMemory,
            &[0x2E, 0x00, 0x00],
        );
        assert_eq!(
            frame,
            vec![0xF0, 0x43, 0x30, 0x3E, 0x0D, 0x03, 0x2E, 0x00, 0x00, 0xF7]
        );
    }

    proptest! {
        #[test]
        fn prop_arbitrary_bytes_never_panic(raw in proptest::collection::vec(any::<u8>(), 0..40)) {
            let _ = parse_frame(&raw);
            for config in all_configs() {
                let _ = decode(&raw, config);
            }
        }

        #[test]
        fn prop_enveloped_bytes_never_panic(
            sub_status in any::<u8>(),
            body in proptest::collection::vec(any::<u8>(), 0..36),
        ) {
            let mut raw = vec![SYSEX_START, MANUFACTURER_ID, sub_status, DEVICE_FAMILY];
            raw.extend_from_slice(&body);
            raw.push(SYSEX_END);

            let parsed = parse_frame(&raw);
            prop_assert_eq!(parsed.is_ok(), raw.len() >= min_len(raw.get(5).copied().unwrap_or(0)));
            for config in all_configs() {
                let _ = decode(&raw, config);
            }
        }
    }
}
