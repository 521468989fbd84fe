//! # Sample Format Conversion
//!
//! Normalizes decoded audio to interleaved f32 in `[-1.0, 1.0]`.
//!
//! Decoders output audio in many sample formats (u8 through f64) and
//! in planar layout. Everything downstream of the decode stage works
//! on interleaved normalized f32, so this module collapses all buffer
//! variants into that one shape. Conversion appends into a
//! caller-provided vector so the decode stage can reuse one scratch
//! allocation across packets.

use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;

/// Convert a decoded audio buffer to interleaved f32, appending the
/// samples to `out`.
///
/// The output ordering is frame-major: for stereo, `L0 R0 L1 R1 ...`.
pub(crate) fn append_interleaved_f32(buffer: &AudioBufferRef<'_>, out: &mut Vec<f32>) {
    macro_rules! interleave {
        ($buf:expr) => {{
            let buf = $buf;
            let channels = buf.spec().channels.count();
            let frames = buf.frames();
            out.reserve(frames * channels);
            for frame in 0..frames {
                for ch in 0..channels {
                    out.push(buf.chan(ch)[frame].into_sample());
                }
            }
        }};
    }

    match buffer {
        AudioBufferRef::U8(buf) => interleave!(buf.as_ref()),
        AudioBufferRef::U16(buf) => interleave!(buf.as_ref()),
        AudioBufferRef::U24(buf) => interleave!(buf.as_ref()),
        AudioBufferRef::U32(buf) => interleave!(buf.as_ref()),
        AudioBufferRef::S8(buf) => interleave!(buf.as_ref()),
        AudioBufferRef::S16(buf) => interleave!(buf.as_ref()),
        AudioBufferRef::S24(buf) => interleave!(buf.as_ref()),
        AudioBufferRef::S32(buf) => interleave!(buf.as_ref()),
        AudioBufferRef::F32(buf) => interleave!(buf.as_ref()),
        AudioBufferRef::F64(buf) => interleave!(buf.as_ref()),
    }
}
