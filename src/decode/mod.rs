//! # Decode Stage
//!
//! Owns the codec decoder for the session's selected audio stream.
//!
//! The decoder instance and the stream's codec identity are fixed for
//! the session: the stage is configured once at open time from the
//! selected track's codec parameters, and the native sample rate and
//! channel count recorded here are what the resampling stage's input
//! side is frozen to. A mid-stream change of the decoder's native
//! format is not detected.

mod sample_converter;

use crate::error::{ReaderError, Result};
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions};
use symphonia::core::formats::Packet;
use tracing::debug;

/// Default channel count assumed when the stream does not declare one
/// up front (some containers only reveal it on the first decoded frame).
const FALLBACK_CHANNELS: u16 = 2;

/// Codec decoder plus the reusable interleaved-f32 scratch buffer.
pub struct DecodeStage {
    decoder: Box<dyn Decoder>,
    native_rate: u32,
    native_channels: u16,
    scratch: Vec<f32>,
}

impl DecodeStage {
    /// Resolve and instantiate a decoder for the given codec parameters.
    ///
    /// Resolution and construction fail distinctly: a codec with no
    /// registered decoder is [`ReaderError::UnsupportedCodec`], while a
    /// registered decoder that cannot be built from these parameters is
    /// [`ReaderError::DecoderInit`].
    pub fn new(params: &CodecParameters) -> Result<Self> {
        let registry = symphonia::default::get_codecs();

        let descriptor = registry
            .get_codec(params.codec)
            .ok_or_else(|| ReaderError::UnsupportedCodec(format!("{:?}", params.codec)))?;
        debug!(codec = descriptor.short_name, "resolved audio decoder");

        let decoder = registry
            .make(params, &DecoderOptions::default())
            .map_err(|e| ReaderError::DecoderInit(e.to_string()))?;

        let native_rate = params
            .sample_rate
            .ok_or_else(|| ReaderError::DecoderInit("stream declares no sample rate".into()))?;
        let native_channels = params
            .channels
            .map(|ch| ch.count() as u16)
            .unwrap_or(FALLBACK_CHANNELS);

        Ok(Self {
            decoder,
            native_rate,
            native_channels,
            scratch: Vec::new(),
        })
    }

    /// The decoder's native sample rate in Hz.
    pub fn native_rate(&self) -> u32 {
        self.native_rate
    }

    /// The decoder's native channel count.
    pub fn native_channels(&self) -> u16 {
        self.native_channels
    }

    /// Decode one compressed packet into interleaved normalized f32.
    ///
    /// The returned slice borrows an internal scratch buffer that is
    /// overwritten by the next call. A decode failure is terminal for
    /// the session; no resynchronization is attempted.
    pub fn decode(&mut self, packet: &Packet) -> Result<&[f32]> {
        let decoded = self
            .decoder
            .decode(packet)
            .map_err(|e| ReaderError::Decode(e.to_string()))?;

        self.scratch.clear();
        sample_converter::append_interleaved_f32(&decoded, &mut self.scratch);
        Ok(&self.scratch)
    }
}
