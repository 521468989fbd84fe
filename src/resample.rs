//! # Resampling Stage
//!
//! Converts decoded audio (native rate and channel count, interleaved
//! f32) into the session's target rate, channel layout, and packed
//! sample representation.
//!
//! Channel remixing happens first in the interleaved domain; rate
//! conversion second through a stateful [`rubato::FftFixedIn`] fed
//! fixed-size chunks from an internal planar accumulation buffer.
//! Same-rate sessions bypass the rate converter entirely.
//!
//! Input-side parameters are frozen at construction. A decoder whose
//! native format changes mid-stream is not detected; the converted
//! output is garbage-free but pitch-shifted in that (rare) case.
//!
//! At end of stream any accumulated input shorter than one chunk is
//! dropped rather than flushed, so up to one chunk of trailing audio
//! may be lost on rate-converting sessions.

use crate::error::{ReaderError, Result};
use crate::format::{ChannelLayout, PcmFormat};
use crate::staging::StagingBuffer;
use rubato::{FftFixedIn, Resampler};
use tracing::debug;

/// Input frames per rate-converter chunk. Frames below one chunk stay
/// accumulated until the next call.
const CHUNK_FRAMES: usize = 1024;

/// FFT sub-chunk count for the rate converter.
const SUB_CHUNKS: usize = 2;

/// Channel remix applied before rate conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Remix {
    /// Native and target channel counts already match.
    Passthrough,
    /// Average all native channels into one.
    ToMono { from: usize },
    /// Duplicate the single native channel.
    MonoToStereo,
    /// Average all native channels, then duplicate. Used when a
    /// multichannel source (>2) feeds a stereo target.
    MixAllToStereo { from: usize },
}

/// Rate converter state, absent for same-rate sessions.
struct RateConverter {
    resampler: FftFixedIn<f32>,
    /// Planar accumulation buffer, one inner vec per output channel.
    pending: Vec<Vec<f32>>,
    output_frames_max: usize,
}

/// Format/rate/channel converter configured once per session.
pub struct ResampleStage {
    remix: Remix,
    in_channels: usize,
    out_channels: usize,
    rate: Option<RateConverter>,
    /// Interleaved scratch holding the remixed input of the current call.
    remixed: Vec<f32>,
    /// Interleaved scratch for rate-converted output awaiting packing.
    converted: Vec<f32>,
}

impl ResampleStage {
    /// Construct the converter from the decoder's native parameters and
    /// the resolved target format.
    pub fn new(
        native_rate: u32,
        native_channels: u16,
        target_rate: u32,
        target_layout: ChannelLayout,
    ) -> Result<Self> {
        if native_rate == 0 || native_channels == 0 {
            return Err(ReaderError::ResamplerInit(format!(
                "decoder reports unusable native format: {native_rate} Hz, {native_channels} ch"
            )));
        }

        let in_channels = native_channels as usize;
        let out_channels = target_layout.count() as usize;

        let remix = match (in_channels, out_channels) {
            (i, o) if i == o => Remix::Passthrough,
            (_, 1) => Remix::ToMono { from: in_channels },
            (1, 2) => Remix::MonoToStereo,
            (_, 2) => Remix::MixAllToStereo { from: in_channels },
            _ => unreachable!("target layout is mono or stereo"),
        };

        let rate = if native_rate == target_rate {
            None
        } else {
            let resampler = FftFixedIn::<f32>::new(
                native_rate as usize,
                target_rate as usize,
                CHUNK_FRAMES,
                SUB_CHUNKS,
                out_channels,
            )
            .map_err(|e| ReaderError::ResamplerInit(e.to_string()))?;
            let output_frames_max = resampler.output_frames_max();

            debug!(
                native_rate,
                target_rate, output_frames_max, "rate converter configured"
            );

            Some(RateConverter {
                resampler,
                pending: vec![Vec::new(); out_channels],
                output_frames_max,
            })
        };

        Ok(Self {
            remix,
            in_channels,
            out_channels,
            rate,
            remixed: Vec::new(),
            converted: Vec::new(),
        })
    }

    /// Upper bound on the frames-per-channel the next [`process`](Self::process)
    /// call can produce from `input_samples` interleaved native samples.
    ///
    /// The session sizes the staging buffer from this bound before
    /// converting, so the bound must never under-estimate.
    pub fn output_bound(&self, input_samples: usize) -> usize {
        let input_frames = input_samples / self.in_channels.max(1);
        match &self.rate {
            None => input_frames,
            Some(rc) => {
                let pending_frames = rc.pending[0].len() + input_frames;
                (pending_frames / CHUNK_FRAMES) * rc.output_frames_max
            }
        }
    }

    /// Convert one decoded frame's worth of interleaved native samples
    /// into packed target-format bytes, appending to `staging`.
    ///
    /// Returns the frames-per-channel produced. Zero is a valid result:
    /// the rate converter may have accumulated all input while waiting
    /// for a full chunk.
    pub fn process(
        &mut self,
        input: &[f32],
        staging: &mut StagingBuffer,
        format: &PcmFormat,
    ) -> Result<usize> {
        self.apply_remix(input);

        match &mut self.rate {
            None => {
                staging.pack_samples(&self.remixed, format);
                Ok(self.remixed.len() / self.out_channels)
            }
            Some(rc) => {
                // Accumulate planar input.
                for (ch, plane) in rc.pending.iter_mut().enumerate() {
                    plane.extend(
                        self.remixed
                            .iter()
                            .skip(ch)
                            .step_by(self.out_channels)
                            .copied(),
                    );
                }

                let mut produced = 0;
                while rc.pending[0].len() >= CHUNK_FRAMES {
                    let chunk: Vec<&[f32]> = rc
                        .pending
                        .iter()
                        .map(|plane| &plane[..CHUNK_FRAMES])
                        .collect();

                    let output = rc
                        .resampler
                        .process(&chunk, None)
                        .map_err(|e| ReaderError::Resample(e.to_string()))?;

                    for plane in rc.pending.iter_mut() {
                        plane.drain(..CHUNK_FRAMES);
                    }

                    let frames = output.first().map_or(0, |plane| plane.len());
                    self.converted.clear();
                    for frame in 0..frames {
                        for plane in &output {
                            self.converted.push(plane[frame]);
                        }
                    }
                    staging.pack_samples(&self.converted, format);
                    produced += frames;
                }

                Ok(produced)
            }
        }
    }

    fn apply_remix(&mut self, input: &[f32]) {
        self.remixed.clear();
        match self.remix {
            Remix::Passthrough => self.remixed.extend_from_slice(input),
            Remix::ToMono { from } => {
                let scale = 1.0 / from as f32;
                for frame in input.chunks_exact(from) {
                    self.remixed.push(frame.iter().sum::<f32>() * scale);
                }
            }
            Remix::MonoToStereo => {
                for &sample in input {
                    self.remixed.push(sample);
                    self.remixed.push(sample);
                }
            }
            Remix::MixAllToStereo { from } => {
                let scale = 1.0 / from as f32;
                for frame in input.chunks_exact(from) {
                    let mixed = frame.iter().sum::<f32>() * scale;
                    self.remixed.push(mixed);
                    self.remixed.push(mixed);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{resolve_channel_layout, resolve_sample_format, SampleValueFormat};

    fn f32_format() -> PcmFormat {
        resolve_sample_format(SampleValueFormat::Float32).unwrap()
    }

    fn unpack_f32(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    #[test]
    fn test_same_rate_same_channels_is_passthrough() {
        let layout = resolve_channel_layout(2).unwrap();
        let mut stage = ResampleStage::new(44_100, 2, 44_100, layout).unwrap();
        let fmt = f32_format();

        let input = [0.1f32, -0.1, 0.2, -0.2];
        let mut staging = StagingBuffer::new();
        staging.ensure_frames(stage.output_bound(input.len()), 8).unwrap();

        let produced = stage.process(&input, &mut staging, &fmt).unwrap();
        assert_eq!(produced, 2);
        assert_eq!(unpack_f32(staging.bytes()), input);
    }

    #[test]
    fn test_stereo_to_mono_averages() {
        let layout = resolve_channel_layout(1).unwrap();
        let mut stage = ResampleStage::new(48_000, 2, 48_000, layout).unwrap();
        let fmt = f32_format();

        let input = [1.0f32, 0.0, 0.5, 0.5, -1.0, 1.0];
        let mut staging = StagingBuffer::new();
        staging.ensure_frames(stage.output_bound(input.len()), 4).unwrap();

        let produced = stage.process(&input, &mut staging, &fmt).unwrap();
        assert_eq!(produced, 3);
        assert_eq!(unpack_f32(staging.bytes()), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_mono_to_stereo_duplicates() {
        let layout = resolve_channel_layout(2).unwrap();
        let mut stage = ResampleStage::new(48_000, 1, 48_000, layout).unwrap();
        let fmt = f32_format();

        let input = [0.25f32, -0.75];
        let mut staging = StagingBuffer::new();
        staging.ensure_frames(stage.output_bound(input.len()), 8).unwrap();

        let produced = stage.process(&input, &mut staging, &fmt).unwrap();
        assert_eq!(produced, 2);
        assert_eq!(unpack_f32(staging.bytes()), vec![0.25, 0.25, -0.75, -0.75]);
    }

    #[test]
    fn test_rate_conversion_buffers_until_full_chunk() {
        let layout = resolve_channel_layout(1).unwrap();
        let mut stage = ResampleStage::new(22_050, 1, 44_100, layout).unwrap();
        let fmt = f32_format();
        let mut staging = StagingBuffer::new();

        // Half a chunk: everything accumulates, nothing is produced.
        let input = vec![0.0f32; CHUNK_FRAMES / 2];
        let bound = stage.output_bound(input.len());
        assert_eq!(bound, 0);
        staging.ensure_frames(bound, 4).unwrap();
        let produced = stage.process(&input, &mut staging, &fmt).unwrap();
        assert_eq!(produced, 0);

        // Second half completes the chunk and output appears.
        let bound = stage.output_bound(input.len());
        assert!(bound > 0);
        staging.ensure_frames(bound, 4).unwrap();
        staging.reset();
        let produced = stage.process(&input, &mut staging, &fmt).unwrap();
        assert!(produced > 0);
        assert!(produced <= bound);
        assert_eq!(staging.bytes().len(), produced * 4);
    }

    #[test]
    fn test_rate_conversion_total_is_proportional() {
        let layout = resolve_channel_layout(1).unwrap();
        let mut stage = ResampleStage::new(22_050, 1, 44_100, layout).unwrap();
        let fmt = f32_format();
        let mut staging = StagingBuffer::new();

        let total_in = 22_050usize;
        let mut total_out = 0usize;
        for block in vec![0.1f32; total_in].chunks(700) {
            let bound = stage.output_bound(block.len());
            staging.ensure_frames(bound, 4).unwrap();
            staging.reset();
            total_out += stage.process(block, &mut staging, &fmt).unwrap();
        }

        // 2x upsampling, minus at most one buffered chunk's worth of tail
        // and converter latency.
        let expected = total_in * 2;
        assert!(total_out <= expected + 2 * CHUNK_FRAMES);
        assert!(total_out >= expected.saturating_sub(4 * CHUNK_FRAMES));
    }

    #[test]
    fn test_output_bound_never_underestimates() {
        let layout = resolve_channel_layout(2).unwrap();
        let mut stage = ResampleStage::new(44_100, 2, 48_000, layout).unwrap();
        let fmt = f32_format();
        let mut staging = StagingBuffer::new();

        for block_frames in [100usize, 1024, 3000, 1, 5000] {
            let input = vec![0.0f32; block_frames * 2];
            let bound = stage.output_bound(input.len());
            staging.ensure_frames(bound, 8).unwrap();
            staging.reset();
            let produced = stage.process(&input, &mut staging, &fmt).unwrap();
            assert!(produced <= bound, "bound {bound} < produced {produced}");
        }
    }

    #[test]
    fn test_unusable_native_format_fails_init() {
        let layout = resolve_channel_layout(2).unwrap();
        match ResampleStage::new(0, 2, 44_100, layout) {
            Err(ReaderError::ResamplerInit(_)) => {}
            other => panic!("expected ResamplerInit, got {:?}", other.err()),
        }
    }
}
