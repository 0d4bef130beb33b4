//! MIDI utilities
//!
//! Byte packing for SysEx data fields, hex formatting and port lookup.

use midir::MidiIO;
use tracing::debug;

/// SysEx data byte packing
///
/// Every data byte inside a SysEx message is 7-bit, so wider values are
/// split over several bytes, most significant first.
pub mod convert {
    /// Split a 14-bit word into two 7-bit bytes, high bits first.
    ///
    /// Bits above bit 13 are dropped; callers validate the range.
    pub fn word_to_bytes(value: u16) -> [u8; 2] {
        [((value >> 7) & 0x7F) as u8, (value & 0x7F) as u8]
    }

    /// Join two 7-bit bytes into a 14-bit word
    pub fn bytes_to_word(hi: u8, lo: u8) -> u16 {
        ((hi as u16) << 7) + lo as u16
    }

    /// Encode an on/off switch as a 4-byte value field
    pub fn on_to_bytes(on: bool) -> [u8; 4] {
        [0, 0, 0, on as u8]
    }

    /// Decode an on/off value field.
    ///
    /// Only the last byte carries the state; the leading bytes are ignored.
    pub fn bytes_to_on(data: &[u8; 4]) -> bool {
        data[3] != 0
    }

    /// Pack a fader register value as `00 00 0nnn 0nnnnnnn`
    pub fn fader_to_bytes(raw: u16) -> [u8; 4] {
        let [hi, lo] = word_to_bytes(raw);
        [0, 0, hi, lo]
    }

    /// Read the fader register value from a 4-byte value field
    pub fn bytes_to_fader(data: &[u8; 4]) -> u16 {
        bytes_to_word(data[2], data[3])
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// List the names of every port a MIDI endpoint can see
pub fn port_names<T: MidiIO>(io: &T) -> Vec<String> {
    io.ports()
        .iter()
        .filter_map(|port| io.port_name(port).ok())
        .collect()
}

/// Find a port by case-insensitive substring match
pub fn find_port_by_substring<T: MidiIO>(io: &T, pattern: &str) -> Option<(T::Port, String)> {
    let needle = pattern.to_lowercase();
    for port in io.ports() {
        if let Ok(name) = io.port_name(&port) {
            if name.to_lowercase().contains(&needle) {
                debug!("Found port '{}' matching pattern '{}'", name, pattern);
                return Some((port, name));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::convert::*;
    use super::*;

    #[test]
    fn test_word_packing() {
        assert_eq!(word_to_bytes(300), [2, 44]);
        assert_eq!(bytes_to_word(2, 44), 300);
        assert_eq!(word_to_bytes(256), [2, 0]);
        assert_eq!(word_to_bytes(16383), [0x7F, 0x7F]);
    }

    #[test]
    fn test_word_round_trip() {
        for value in 0..=16383u16 {
            let [hi, lo] = word_to_bytes(value);
            assert_eq!(bytes_to_word(hi, lo), value);
        }
    }

    #[test]
    fn test_word_truncates_upper_bits() {
        assert_eq!(word_to_bytes(16384), [0, 0]);
    }

    #[test]
    fn test_on_field() {
        assert_eq!(on_to_bytes(true), [0, 0, 0, 1]);
        assert_eq!(on_to_bytes(false), [0, 0, 0, 0]);
        // Leading bytes are slack
        assert!(bytes_to_on(&[0x7F, 0x7F, 0x7F, 1]));
        assert!(!bytes_to_on(&[1, 1, 1, 0]));
    }

    #[test]
    fn test_fader_field() {
        assert_eq!(fader_to_bytes(823), [0, 0, 6, 55]);
        assert_eq!(bytes_to_fader(&[0, 0, 6, 55]), 823);
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0xF0, 0x43, 0x10, 0x3E]), "F0 43 10 3E");
        assert_eq!(format_hex(&[]), "");
    }
}
