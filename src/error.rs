//! # Reader Error Types
//!
//! Error taxonomy for the decode-and-resample pipeline.
//!
//! Open-time failures are terminal for that `open` call: the caller
//! receives an error and holds no session. Read-time failures
//! ([`ReaderError::Decode`], [`ReaderError::Resample`],
//! [`ReaderError::Allocation`]) are terminal for the session — the
//! pipeline does not resynchronize the decoder after an error. Callers
//! must drop the session and may reopen the source.

use thiserror::Error;

/// Errors that can occur while opening or reading an audio source.
#[derive(Error, Debug)]
pub enum ReaderError {
    // ========================================================================
    // Argument Errors
    // ========================================================================
    /// An input argument was empty or otherwise unusable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Buffer growth failed because the allocator refused the request.
    #[error("Allocation failed: {0}")]
    Allocation(String),

    // ========================================================================
    // Target Format Errors
    // ========================================================================
    /// The requested sample value representation has no native counterpart.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// The requested channel count is outside the supported set (mono/stereo).
    #[error("Unsupported channel count: {0} (supported: 1 or 2)")]
    UnsupportedChannelCount(u16),

    // ========================================================================
    // Source Errors
    // ========================================================================
    /// The container could not be opened for reading.
    #[error("Failed to open container: {0}")]
    ContainerOpen(String),

    /// The container was opened but its stream layout could not be parsed.
    #[error("Stream info unavailable: {0}")]
    StreamInfo(String),

    /// No audio stream exists in the container.
    #[error("No audio stream found in container")]
    NoAudioStream,

    // ========================================================================
    // Codec Errors
    // ========================================================================
    /// No decoder is registered for the selected stream's codec.
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    /// A decoder is registered but could not be instantiated.
    #[error("Decoder initialization failed: {0}")]
    DecoderInit(String),

    // ========================================================================
    // Conversion Errors
    // ========================================================================
    /// The resampler could not be constructed from the negotiated formats.
    #[error("Resampler initialization failed: {0}")]
    ResamplerInit(String),

    /// A packet failed to decode. Terminal for the session.
    #[error("Decoding error: {0}")]
    Decode(String),

    /// A decoded frame failed to convert. Terminal for the session.
    #[error("Resampling error: {0}")]
    Resample(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReaderError {
    /// Returns `true` if this error concerns the source rather than the
    /// requested output format (unreadable, malformed, or audio-free input).
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            ReaderError::ContainerOpen(_)
                | ReaderError::StreamInfo(_)
                | ReaderError::NoAudioStream
                | ReaderError::Io(_)
        )
    }

    /// Returns `true` if this error means the requested target format is
    /// not representable, independent of any particular source.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ReaderError::UnsupportedFormat(_) | ReaderError::UnsupportedChannelCount(_)
        )
    }

    /// Returns `true` if this error is terminal for an open session.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            ReaderError::Decode(_) | ReaderError::Resample(_) | ReaderError::Allocation(_)
        )
    }
}

/// Result type for reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert!(ReaderError::NoAudioStream.is_source_error());
        assert!(ReaderError::ContainerOpen("bad".into()).is_source_error());
        assert!(ReaderError::UnsupportedChannelCount(3).is_format_error());
        assert!(ReaderError::Decode("x".into()).is_session_fatal());
        assert!(!ReaderError::NoAudioStream.is_format_error());
        assert!(!ReaderError::UnsupportedFormat("x".into()).is_session_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = ReaderError::UnsupportedChannelCount(5);
        assert_eq!(
            err.to_string(),
            "Unsupported channel count: 5 (supported: 1 or 2)"
        );
    }
}
