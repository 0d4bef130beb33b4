//! Fader value codec
//!
//! Converts between a percentage and the console's fader register, which is
//! carried in a 4-byte value field as `00 00 0nnn 0nnnnnnn`.
//!
//! Two independent settings drive the scaling:
//!
//! - **Resolution**: the register is 8-bit (`low`, 0-255) or 10-bit (`high`, 0-1023).
//! - **Range**: `absolute` maps 0-100% linearly over the whole fader travel.
//!   `relative` maps 0-100% up to the 0 dB mark and 100-200% over the
//!   +0..+10 dB overdrive segment.
//!
//! Master faders (bus, aux and group masters) top out at 0 dB, so they are
//! always scaled as absolute whatever the configured range.
//!
//! Rounding: every segment is rounded half-up on its own, in both
//! directions. Decoding an encoded value lands within 1% of the input.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::CommandError;
use crate::midi::convert::{bytes_to_fader, fader_to_bytes};

/// Fader register width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FaderResolution {
    /// 8-bit register
    #[default]
    Low,
    /// 10-bit register
    High,
}

impl FaderResolution {
    /// Register value for 100% in absolute scaling
    pub fn full_scale(self) -> u32 {
        match self {
            FaderResolution::High => 1024,
            FaderResolution::Low => 255,
        }
    }

    /// Register value at 0 dB (100% in relative scaling)
    pub fn unity(self) -> u32 {
        match self {
            FaderResolution::High => 823,
            FaderResolution::Low => 207,
        }
    }

    /// Register span of the overdrive segment (0 dB to +10 dB)
    pub fn overdrive(self) -> u32 {
        match self {
            FaderResolution::High => 200,
            FaderResolution::Low => 48,
        }
    }

    /// Highest value the register can hold
    pub fn register_max(self) -> u32 {
        match self {
            FaderResolution::High => 1023,
            FaderResolution::Low => 255,
        }
    }
}

/// Percentage semantics for non-master faders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FaderRange {
    /// 100% is the top of the fader (+10 dB)
    #[default]
    Absolute,
    /// 100% is 0 dB, 200% is +10 dB
    Relative,
}

/// Session-wide fader scaling settings.
///
/// Both ends of a session must agree on these for values to round-trip;
/// the protocol has no way to negotiate them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MixerConfig {
    pub fader_resolution: FaderResolution,
    pub fader_range: FaderRange,
}

impl MixerConfig {
    pub fn new(fader_resolution: FaderResolution, fader_range: FaderRange) -> Self {
        Self {
            fader_resolution,
            fader_range,
        }
    }

    /// Whether a fader is scaled absolutely under this config
    fn is_absolute(&self, is_master: bool) -> bool {
        is_master || self.fader_range == FaderRange::Absolute
    }

    /// Highest percentage accepted when encoding
    pub fn max_percent(&self, is_master: bool) -> f64 {
        if self.is_absolute(is_master) {
            100.0
        } else {
            200.0
        }
    }
}

/// Integer division rounding half-up
fn div_round(numerator: u32, denominator: u32) -> u32 {
    (2 * numerator + denominator) / (2 * denominator)
}

/// Decode a fader value field into a percentage
pub fn bytes_to_percent(data: &[u8; 4], config: MixerConfig, is_master: bool) -> u16 {
    let raw = bytes_to_fader(data) as u32;
    raw_to_percent(raw, config, is_master) as u16
}

fn raw_to_percent(raw: u32, config: MixerConfig, is_master: bool) -> u32 {
    let res = config.fader_resolution;
    // Bits past the register width read as full travel
    let raw = raw.min(res.register_max());

    if config.is_absolute(is_master) {
        return div_round(raw * 100, res.full_scale());
    }

    let unity = res.unity();
    if raw > unity {
        100 + div_round((raw - unity) * 100, res.overdrive())
    } else {
        div_round(raw * 100, unity)
    }
}

/// Encode a percentage into a fader value field.
///
/// Rejects NaN, negative values and values above
/// [`MixerConfig::max_percent`] without producing any bytes.
pub fn percent_to_bytes(
    percent: f64,
    config: MixerConfig,
    is_master: bool,
) -> Result<[u8; 4], CommandError> {
    let max = config.max_percent(is_master);
    if !(0.0..=max).contains(&percent) {
        return Err(CommandError::InvalidPercent {
            value: percent,
            max,
        });
    }

    Ok(fader_to_bytes(percent_to_raw(percent, config, is_master) as u16))
}

fn percent_to_raw(percent: f64, config: MixerConfig, is_master: bool) -> u32 {
    let res = config.fader_resolution;

    let raw = if config.is_absolute(is_master) {
        (percent * res.full_scale() as f64 / 100.0).round() as u32
    } else {
        let base = (percent.min(100.0) * res.unity() as f64 / 100.0).round() as u32;
        let over = if percent > 100.0 {
            ((percent - 100.0) * res.overdrive() as f64 / 100.0).round() as u32
        } else {
            0
        };
        base + over
    };

    // 100% absolute at high resolution lands one past the register
    raw.min(res.register_max())
}

impl fmt::Display for FaderResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaderResolution::Low => write!(f, "low"),
            FaderResolution::High => write!(f, "high"),
        }
    }
}

impl fmt::Display for FaderRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaderRange::Absolute => write!(f, "absolute"),
            FaderRange::Relative => write!(f, "relative"),
        }
    }
}

impl FromStr for FaderResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" | "8bit" => Ok(FaderResolution::Low),
            "high" | "10bit" => Ok(FaderResolution::High),
            other => Err(format!("unknown fader resolution '{}'", other)),
        }
    }
}

impl FromStr for FaderRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "absolute" | "abs" => Ok(FaderRange::Absolute),
            "relative" | "rel" => Ok(FaderRange::Relative),
            other => Err(format!("unknown fader range '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const LOW_ABS: MixerConfig = MixerConfig {
        fader_resolution: FaderResolution::Low,
        fader_range: FaderRange::Absolute,
    };
    const HIGH_REL: MixerConfig = MixerConfig {
        fader_resolution: FaderResolution::High,
        fader_range: FaderRange::Relative,
    };
    const LOW_REL: MixerConfig = MixerConfig {
        fader_resolution: FaderResolution::Low,
        fader_range: FaderRange::Relative,
    };

    fn resolution() -> impl Strategy<Value = FaderResolution> {
        prop_oneof![Just(FaderResolution::Low), Just(FaderResolution::High)]
    }

    #[test]
    fn test_default_is_low_absolute() {
        assert_eq!(MixerConfig::default(), LOW_ABS);
    }

    #[test]
    fn test_absolute_low_encoding() {
        assert_eq!(percent_to_bytes(0.0, LOW_ABS, false).unwrap(), [0, 0, 0, 0]);
        // 50% of 255 rounds up to 128
        assert_eq!(percent_to_bytes(50.0, LOW_ABS, false).unwrap(), [0, 0, 1, 0]);
        assert_eq!(percent_to_bytes(100.0, LOW_ABS, false).unwrap(), [0, 0, 1, 0x7F]);
    }

    #[test]
    fn test_absolute_high_clamps_to_register() {
        let config = MixerConfig::new(FaderResolution::High, FaderRange::Absolute);
        assert_eq!(percent_to_bytes(100.0, config, false).unwrap(), [0, 0, 7, 0x7F]);
        assert_eq!(bytes_to_percent(&[0, 0, 7, 0x7F], config, false), 100);
        assert_eq!(bytes_to_percent(&[0, 0, 8, 0], config, false), 100);
    }

    #[test]
    fn test_decode_clamps_oversized_register() {
        let oversized = [0, 0, 0x7F, 0x7F];
        assert_eq!(bytes_to_percent(&oversized, LOW_ABS, false), 100);
        assert_eq!(bytes_to_percent(&oversized, LOW_REL, false), 200);
        assert_eq!(bytes_to_percent(&oversized, HIGH_REL, false), 200);
        assert_eq!(bytes_to_percent(&oversized, HIGH_REL, true), 100);
        // 256 is one past the 8-bit register
        assert_eq!(bytes_to_percent(&[0, 0, 2, 0], LOW_ABS, false), 100);
    }

    #[test]
    fn test_relative_segment_boundary() {
        // 0 dB sits at 823 at high resolution
        assert_eq!(percent_to_bytes(100.0, HIGH_REL, false).unwrap(), [0, 0, 6, 55]);
        assert_eq!(bytes_to_percent(&[0, 0, 6, 55], HIGH_REL, false), 100);
        // one step past 0 dB is overdrive
        assert_eq!(bytes_to_percent(&[0, 0, 6, 57], HIGH_REL, false), 101);
        // top of the fader
        assert_eq!(percent_to_bytes(200.0, HIGH_REL, false).unwrap(), [0, 0, 7, 0x7F]);
        assert_eq!(bytes_to_percent(&[0, 0, 7, 0x7F], HIGH_REL, false), 200);
    }

    #[test]
    fn test_relative_low_resolution() {
        assert_eq!(percent_to_bytes(100.0, LOW_REL, false).unwrap(), [0, 0, 1, 79]);
        assert_eq!(percent_to_bytes(200.0, LOW_REL, false).unwrap(), [0, 0, 1, 0x7F]);
        assert_eq!(bytes_to_percent(&[0, 0, 1, 79], LOW_REL, false), 100);
    }

    #[test]
    fn test_master_forces_absolute() {
        // 823 is 0 dB for a channel but 80% for a master fader
        assert_eq!(bytes_to_percent(&[0, 0, 6, 55], HIGH_REL, true), 80);
        assert_eq!(
            percent_to_bytes(100.0, HIGH_REL, true).unwrap(),
            percent_to_bytes(
                100.0,
                MixerConfig::new(FaderResolution::High, FaderRange::Absolute),
                false
            )
            .unwrap()
        );
    }

    #[test]
    fn test_out_of_range_percent_is_rejected() {
        assert!(percent_to_bytes(-1.0, LOW_ABS, false).is_err());
        assert!(percent_to_bytes(100.5, LOW_ABS, false).is_err());
        assert!(percent_to_bytes(150.0, HIGH_REL, true).is_err());
        assert!(percent_to_bytes(200.1, HIGH_REL, false).is_err());
        assert!(percent_to_bytes(f64::NAN, HIGH_REL, false).is_err());
        assert!(percent_to_bytes(150.0, HIGH_REL, false).is_ok());
    }

    #[test]
    fn test_parse_settings() {
        assert_eq!("HIGH".parse::<FaderResolution>().unwrap(), FaderResolution::High);
        assert_eq!("rel".parse::<FaderRange>().unwrap(), FaderRange::Relative);
        assert!("medium".parse::<FaderResolution>().is_err());
    }

    proptest! {
        #[test]
        fn prop_absolute_round_trip(percent in 0u16..=100, res in resolution(), master in any::<bool>()) {
            let config = MixerConfig::new(res, FaderRange::Absolute);
            let bytes = percent_to_bytes(percent as f64, config, master).unwrap();
            let decoded = bytes_to_percent(&bytes, config, master);
            prop_assert!((decoded as i32 - percent as i32).abs() <= 1);
        }

        #[test]
        fn prop_relative_round_trip(percent in 0u16..=200, res in resolution()) {
            let config = MixerConfig::new(res, FaderRange::Relative);
            let bytes = percent_to_bytes(percent as f64, config, false).unwrap();
            let decoded = bytes_to_percent(&bytes, config, false);
            prop_assert!((decoded as i32 - percent as i32).abs() <= 1);
        }

        #[test]
        fn prop_decoded_percent_is_bounded(
            field in any::<[u8; 4]>(),
            res in resolution(),
            relative in any::<bool>(),
            master in any::<bool>(),
        ) {
            let range = if relative { FaderRange::Relative } else { FaderRange::Absolute };
            let config = MixerConfig::new(res, range);
            let percent = bytes_to_percent(&field, config, master);
            prop_assert!(percent as f64 <= config.max_percent(master));
        }

        #[test]
        fn prop_encoded_register_fits(percent in 0.0f64..=200.0, res in resolution()) {
            let config = MixerConfig::new(res, FaderRange::Relative);
            let bytes = percent_to_bytes(percent, config, false).unwrap();
            prop_assert!(bytes_to_fader(&bytes) as u32 <= res.register_max());
            prop_assert_eq!(&bytes[..2], &[0, 0]);
        }
    }
}
