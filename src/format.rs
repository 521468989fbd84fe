//! # Format Negotiation
//!
//! Maps the abstract output format a caller requests onto the concrete
//! PCM representation the pipeline produces: a sample-value enum onto a
//! packed byte layout, and a channel count onto a channel layout.
//!
//! Only mono and stereo layouts are supported. This is a policy choice,
//! not an oversight: callers needing other layouts must pre- or
//! post-process.

use crate::error::{ReaderError, Result};

/// Abstract sample value representations a caller may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleValueFormat {
    /// Unsigned 8-bit PCM, silence at 128.
    Uint8,
    /// Signed 16-bit little-endian PCM.
    Int16,
    /// Signed 32-bit little-endian PCM.
    Int32,
    /// 32-bit little-endian IEEE float PCM in `[-1.0, 1.0]`.
    Float32,
}

/// Concrete packed PCM representation resolved from a [`SampleValueFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    /// The abstract representation this format was resolved from.
    pub value_format: SampleValueFormat,

    /// Size of one packed sample in bytes.
    pub bytes_per_sample: usize,
}

impl PcmFormat {
    /// Pack one normalized f32 sample into this representation,
    /// little-endian, appending to `out`. Values outside `[-1.0, 1.0]`
    /// are clamped to the representable range.
    #[inline]
    pub fn write_sample(&self, sample: f32, out: &mut Vec<u8>) {
        let s = sample.clamp(-1.0, 1.0);
        match self.value_format {
            SampleValueFormat::Uint8 => {
                out.push((s * 127.0 + 128.0).round() as u8);
            }
            SampleValueFormat::Int16 => {
                out.extend_from_slice(&((s * 32_767.0).round() as i16).to_le_bytes());
            }
            SampleValueFormat::Int32 => {
                out.extend_from_slice(&((s as f64 * 2_147_483_647.0).round() as i32).to_le_bytes());
            }
            SampleValueFormat::Float32 => {
                out.extend_from_slice(&s.to_le_bytes());
            }
        }
    }
}

/// Concrete output channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    /// Number of channels in this layout.
    pub fn count(&self) -> u16 {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }
}

/// Resolve an abstract sample representation to its packed PCM format.
///
/// Every current enum member has a native counterpart; the operation is
/// fallible at the API boundary so additions to the abstract enum fail
/// loudly instead of producing garbage audio.
pub fn resolve_sample_format(format: SampleValueFormat) -> Result<PcmFormat> {
    let bytes_per_sample = match format {
        SampleValueFormat::Uint8 => 1,
        SampleValueFormat::Int16 => 2,
        SampleValueFormat::Int32 => 4,
        SampleValueFormat::Float32 => 4,
    };

    Ok(PcmFormat {
        value_format: format,
        bytes_per_sample,
    })
}

/// Resolve a requested channel count to a concrete layout.
///
/// Exactly mono (1) and stereo (2) are accepted; any other count fails
/// with [`ReaderError::UnsupportedChannelCount`].
pub fn resolve_channel_layout(channels: u16) -> Result<ChannelLayout> {
    match channels {
        1 => Ok(ChannelLayout::Mono),
        2 => Ok(ChannelLayout::Stereo),
        other => Err(ReaderError::UnsupportedChannelCount(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_sample_format_sizes() {
        assert_eq!(
            resolve_sample_format(SampleValueFormat::Uint8)
                .unwrap()
                .bytes_per_sample,
            1
        );
        assert_eq!(
            resolve_sample_format(SampleValueFormat::Int16)
                .unwrap()
                .bytes_per_sample,
            2
        );
        assert_eq!(
            resolve_sample_format(SampleValueFormat::Int32)
                .unwrap()
                .bytes_per_sample,
            4
        );
        assert_eq!(
            resolve_sample_format(SampleValueFormat::Float32)
                .unwrap()
                .bytes_per_sample,
            4
        );
    }

    #[test]
    fn test_resolve_channel_layout() {
        assert_eq!(resolve_channel_layout(1).unwrap(), ChannelLayout::Mono);
        assert_eq!(resolve_channel_layout(2).unwrap(), ChannelLayout::Stereo);

        for bad in [0u16, 3, 6, 255] {
            match resolve_channel_layout(bad) {
                Err(ReaderError::UnsupportedChannelCount(n)) => assert_eq!(n, bad),
                other => panic!("expected UnsupportedChannelCount, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_write_sample_int16_endpoints() {
        let fmt = resolve_sample_format(SampleValueFormat::Int16).unwrap();

        let mut out = Vec::new();
        fmt.write_sample(0.0, &mut out);
        fmt.write_sample(1.0, &mut out);
        fmt.write_sample(-1.0, &mut out);
        // Out-of-range input clamps instead of wrapping.
        fmt.write_sample(2.0, &mut out);

        assert_eq!(&out[0..2], &0i16.to_le_bytes());
        assert_eq!(&out[2..4], &32_767i16.to_le_bytes());
        assert_eq!(&out[4..6], &(-32_767i16).to_le_bytes());
        assert_eq!(&out[6..8], &32_767i16.to_le_bytes());
    }

    #[test]
    fn test_write_sample_uint8_silence_midpoint() {
        let fmt = resolve_sample_format(SampleValueFormat::Uint8).unwrap();

        let mut out = Vec::new();
        fmt.write_sample(0.0, &mut out);
        fmt.write_sample(1.0, &mut out);
        fmt.write_sample(-1.0, &mut out);

        assert_eq!(out, vec![128, 255, 1]);
    }

    #[test]
    fn test_write_sample_float32_is_bit_exact() {
        let fmt = resolve_sample_format(SampleValueFormat::Float32).unwrap();

        let mut out = Vec::new();
        fmt.write_sample(0.25, &mut out);

        assert_eq!(out, 0.25f32.to_le_bytes());
    }

    #[test]
    fn test_channel_layout_counts() {
        assert_eq!(ChannelLayout::Mono.count(), 1);
        assert_eq!(ChannelLayout::Stereo.count(), 2);
    }
}
