//! # Session Configuration
//!
//! Configuration types supplied when opening a reader session.
//!
//! The target output format is immutable for the session's lifetime.
//! Diagnostics are controlled per session rather than through
//! process-wide flags, so independent sessions stay independently
//! configurable and testable.

use crate::format::SampleValueFormat;

/// The fixed PCM output format a session produces.
///
/// Every block returned by [`AudioReader::read`](crate::AudioReader::read)
/// is interleaved PCM in this representation, rate, and channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpec {
    /// Sample value representation of the produced PCM.
    pub sample_format: SampleValueFormat,

    /// Output sample rate in Hz. Must be greater than zero.
    pub sample_rate: u32,

    /// Output channel count. Only mono (1) and stereo (2) are supported.
    pub channels: u16,
}

impl OutputSpec {
    /// Convenience constructor.
    pub fn new(sample_format: SampleValueFormat, sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_format,
            sample_rate,
            channels,
        }
    }
}

impl Default for OutputSpec {
    /// CD-quality stereo: 16-bit signed, 44.1 kHz, 2 channels.
    fn default() -> Self {
        Self {
            sample_format: SampleValueFormat::Int16,
            sample_rate: 44_100,
            channels: 2,
        }
    }
}

/// Per-session reader configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReaderConfig {
    /// When set, the demuxer logs a per-track stream summary and the
    /// computed duration at open time via `tracing::info!`.
    pub verbose: bool,
}

impl ReaderConfig {
    /// Configuration with the verbose stream-info dump enabled.
    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_spec_default_is_cd_quality() {
        let spec = OutputSpec::default();
        assert_eq!(spec.sample_format, SampleValueFormat::Int16);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.channels, 2);
    }

    #[test]
    fn test_reader_config_default_is_quiet() {
        assert!(!ReaderConfig::default().verbose);
        assert!(ReaderConfig::verbose().verbose);
    }
}
