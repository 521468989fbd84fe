//! # Reader Session
//!
//! The open/read/close state machine coordinating the demux, decode,
//! and resampling stages and the output staging buffer.
//!
//! Ownership is strictly tree-shaped: the session exclusively owns all
//! four subsystems, each stage owns its own handles, and nothing is
//! shared between sessions. A failed `open` drops every stage already
//! constructed, in reverse order, before the error reaches the caller;
//! `Drop` releases a live session the same way, so an explicit
//! [`close`](AudioReader::close) is a convenience rather than an
//! obligation.
//!
//! Sessions are synchronous and blocking. A session is not usable from
//! multiple threads at once; decode several sources concurrently by
//! opening one session per thread.

use crate::config::{OutputSpec, ReaderConfig};
use crate::decode::DecodeStage;
use crate::demux::{DemuxStage, MediaInput};
use crate::error::{ReaderError, Result};
use crate::format::{resolve_channel_layout, resolve_sample_format, PcmFormat};
use crate::resample::ResampleStage;
use crate::staging::StagingBuffer;
use std::time::Duration;
use tracing::{debug, instrument};

/// Outcome of one [`AudioReader::read`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// Frames-per-channel copied into the destination. Zero means
    /// "call again" (the packet belonged to another stream, or the
    /// pipeline needs more input), not end-of-stream and not an error.
    Samples(usize),
    /// The container is exhausted. Not an error.
    EndOfStream,
}

/// A decode-and-resample session over one audio source.
///
/// Produces interleaved PCM blocks in the fixed [`OutputSpec`] chosen
/// at open time. Pull model: call [`read`](Self::read) in a loop until
/// [`ReadStatus::EndOfStream`].
pub struct AudioReader {
    demux: DemuxStage,
    decode: DecodeStage,
    resample: ResampleStage,
    staging: StagingBuffer,
    pcm_format: PcmFormat,
    output: OutputSpec,
    bytes_per_frame: usize,
}

impl AudioReader {
    /// Open a source and negotiate the full pipeline.
    ///
    /// The target format is validated before any container I/O: an
    /// unsupported channel count or sample representation fails without
    /// touching the source. All open-time failures are terminal for
    /// this call; the caller holds no session and nothing leaks.
    #[instrument(skip(input, config), fields(rate = output.sample_rate, channels = output.channels))]
    pub fn open(input: MediaInput, output: OutputSpec, config: ReaderConfig) -> Result<Self> {
        if output.sample_rate == 0 {
            return Err(ReaderError::InvalidArgument(
                "output sample rate must be greater than zero".into(),
            ));
        }

        // Target-side negotiation first, before the container is opened.
        let layout = resolve_channel_layout(output.channels)?;
        let pcm_format = resolve_sample_format(output.sample_format)?;

        let demux = DemuxStage::open(input, config.verbose)?;
        let decode = DecodeStage::new(demux.codec_params())?;
        let resample = ResampleStage::new(
            decode.native_rate(),
            decode.native_channels(),
            output.sample_rate,
            layout,
        )?;

        debug!(
            native_rate = decode.native_rate(),
            native_channels = decode.native_channels(),
            duration = ?demux.duration(),
            "session opened"
        );

        Ok(Self {
            demux,
            decode,
            resample,
            // Lazy: no storage until the first read that produces output.
            staging: StagingBuffer::new(),
            pcm_format,
            output,
            bytes_per_frame: layout.count() as usize * pcm_format.bytes_per_sample,
        })
    }

    /// Produce the next block of converted PCM into `dest`.
    ///
    /// At most one compressed packet is consumed per call. Returns the
    /// frames-per-channel copied; the packed byte count is that times
    /// [`bytes_per_frame`](Self::bytes_per_frame). Never writes more
    /// than `dest.len() / bytes_per_frame` frames, for any destination
    /// size including zero.
    ///
    /// If the conversion produces more frames than `dest` can hold, the
    /// excess is dropped for this call. Size `dest` from
    /// [`bytes_per_frame`](Self::bytes_per_frame) times the largest
    /// block the source can decode to avoid the loss.
    ///
    /// Read-time errors are terminal for the session: drop it and
    /// reopen if the source supports it.
    pub fn read(&mut self, dest: &mut [u8]) -> Result<ReadStatus> {
        let dest_frames = dest.len() / self.bytes_per_frame;

        let packet = match self.demux.next_packet()? {
            Some(packet) => packet,
            None => return Ok(ReadStatus::EndOfStream),
        };

        // Packets from other streams are skipped, not errors; the caller
        // simply calls again.
        if packet.track_id() != self.demux.track_id() {
            return Ok(ReadStatus::Samples(0));
        }

        let samples = self.decode.decode(&packet)?;

        // Size the staging buffer from the conversion's upper bound
        // before converting. Grows only; never shrinks.
        let bound = self.resample.output_bound(samples.len());
        self.staging.ensure_frames(bound, self.bytes_per_frame)?;
        self.staging.reset();

        let produced = self
            .resample
            .process(samples, &mut self.staging, &self.pcm_format)?;

        let copy_frames = produced.min(dest_frames);
        let copy_bytes = copy_frames * self.bytes_per_frame;
        dest[..copy_bytes].copy_from_slice(&self.staging.bytes()[..copy_bytes]);

        Ok(ReadStatus::Samples(copy_frames))
    }

    /// Advisory total duration computed at open time. May be absent or
    /// approximate for some containers.
    pub fn duration(&self) -> Option<Duration> {
        self.demux.duration()
    }

    /// The fixed output format of this session.
    pub fn output_spec(&self) -> &OutputSpec {
        &self.output
    }

    /// Packed size of one output frame (all channels) in bytes.
    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_frame
    }

    /// The decoder's native sample rate, for diagnostics.
    pub fn native_rate(&self) -> u32 {
        self.decode.native_rate()
    }

    /// The decoder's native channel count, for diagnostics.
    pub fn native_channels(&self) -> u16 {
        self.decode.native_channels()
    }

    /// Release the session and everything it owns.
    ///
    /// Dropping the reader is equivalent; consuming it here makes the
    /// release explicit at call sites and leaves no handle behind to
    /// close twice or use afterwards.
    pub fn close(self) {
        debug!("session closed");
    }
}
