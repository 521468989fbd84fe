//! # Demux Stage
//!
//! Owns the open container and produces compressed packets.
//!
//! The container is probed once at open time: streams are enumerated,
//! the first audio stream is selected (first-match by container order,
//! deliberately not "best stream" — predictability over cleverness),
//! and an advisory total duration is computed from stream metadata.
//! The selected stream index never changes afterwards.

use crate::error::{ReaderError, Result};
use bytes::Bytes;
use std::fs::File;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;
use symphonia::core::codecs::{CodecParameters, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info};

/// A byte-addressable media source to open.
///
/// Path-to-bytes resolution and enumeration of files are the caller's
/// concern; this type only carries an already-resolved locator.
#[derive(Debug, Clone)]
pub enum MediaInput {
    /// A file on the local filesystem.
    File { path: PathBuf },
    /// An in-memory byte region, with an optional file-extension hint
    /// to guide container probing.
    Memory {
        data: Bytes,
        extension_hint: Option<String>,
    },
}

impl MediaInput {
    /// Input backed by a file path.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    /// Input backed by an in-memory byte region.
    pub fn memory(data: impl Into<Bytes>) -> Self {
        Self::Memory {
            data: data.into(),
            extension_hint: None,
        }
    }

    /// Attach a file-extension hint (e.g. `"mp3"`) to a memory input.
    pub fn with_extension_hint(mut self, extension: impl Into<String>) -> Self {
        if let Self::Memory { extension_hint, .. } = &mut self {
            *extension_hint = Some(extension.into());
        }
        self
    }
}

/// Container reader bound to one selected audio stream.
pub struct DemuxStage {
    format_reader: Box<dyn FormatReader>,
    track_id: u32,
    codec_params: CodecParameters,
    duration: Option<Duration>,
}

impl DemuxStage {
    /// Open and probe a container, selecting its first audio stream.
    pub fn open(input: MediaInput, verbose: bool) -> Result<Self> {
        let (source, hint) = open_media_source(input)?;
        let stream = MediaSourceStream::new(source, Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| ReaderError::StreamInfo(e.to_string()))?;
        let format_reader = probed.format;

        // First stream in container order whose codec parameters describe
        // decodable audio.
        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(ReaderError::NoAudioStream)?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let duration = compute_duration(&codec_params);
        debug!(track_id, ?duration, "selected audio stream");

        if verbose {
            dump_stream_info(format_reader.as_ref(), duration);
        }

        Ok(Self {
            format_reader,
            track_id,
            codec_params,
            duration,
        })
    }

    /// Build a stage around an already-constructed format reader,
    /// bypassing the probe. Lets tests drive the session with packet
    /// sequences no single-stream fixture can produce.
    #[cfg(test)]
    pub(crate) fn from_parts(
        format_reader: Box<dyn FormatReader>,
        track_id: u32,
        codec_params: CodecParameters,
    ) -> Self {
        Self {
            format_reader,
            track_id,
            codec_params,
            duration: None,
        }
    }

    /// Identifier of the selected audio stream.
    pub fn track_id(&self) -> u32 {
        self.track_id
    }

    /// Codec parameters of the selected audio stream.
    pub fn codec_params(&self) -> &CodecParameters {
        &self.codec_params
    }

    /// Advisory total duration computed at open time. May be absent or
    /// approximate depending on the container.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Produce the next compressed packet from the container, from any
    /// stream. `Ok(None)` means the container is exhausted, which is
    /// not an error. Filtering by stream is the session's concern.
    pub fn next_packet(&mut self) -> Result<Option<Packet>> {
        match self.format_reader.next_packet() {
            Ok(packet) => Ok(Some(packet)),
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                debug!("end of container");
                Ok(None)
            }
            Err(SymphoniaError::ResetRequired) => Err(ReaderError::Decode(
                "stream list changed mid-container".into(),
            )),
            Err(e) => Err(ReaderError::Decode(e.to_string())),
        }
    }
}

fn open_media_source(input: MediaInput) -> Result<(Box<dyn MediaSource>, Hint)> {
    match input {
        MediaInput::File { path } => {
            if path.as_os_str().is_empty() {
                return Err(ReaderError::InvalidArgument("empty source path".into()));
            }

            let mut hint = Hint::new();
            if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
                hint.with_extension(extension);
            }

            let file = File::open(&path).map_err(|e| {
                ReaderError::ContainerOpen(format!("{}: {e}", path.display()))
            })?;
            Ok((Box::new(file), hint))
        }
        MediaInput::Memory {
            data,
            extension_hint,
        } => {
            let mut hint = Hint::new();
            if let Some(extension) = extension_hint {
                hint.with_extension(&extension);
            }

            // `Cursor<Bytes>` is a `MediaSource` in its own right, so the
            // byte region is shared, not copied, into the probe.
            Ok((Box::new(Cursor::new(data)), hint))
        }
    }
}

/// Total duration from stream metadata: known frame count over the
/// declared sample rate. Containers without a frame count yield `None`.
fn compute_duration(params: &CodecParameters) -> Option<Duration> {
    match (params.n_frames, params.sample_rate) {
        (Some(frames), Some(rate)) if rate > 0 => {
            Some(Duration::from_secs_f64(frames as f64 / rate as f64))
        }
        _ => None,
    }
}

fn dump_stream_info(reader: &dyn FormatReader, duration: Option<Duration>) {
    for track in reader.tracks() {
        let params = &track.codec_params;
        info!(
            track_id = track.id,
            codec = ?params.codec,
            sample_rate = params.sample_rate,
            channels = params.channels.map(|ch| ch.count()),
            n_frames = params.n_frames,
            "container stream"
        );
    }
    info!(?duration, "total duration");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_is_invalid_argument() {
        match DemuxStage::open(MediaInput::file(""), false) {
            Err(ReaderError::InvalidArgument(_)) => {}
            other => panic!("expected InvalidArgument, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_missing_file_is_container_open() {
        match DemuxStage::open(MediaInput::file("/nonexistent/audio.mp3"), false) {
            Err(ReaderError::ContainerOpen(_)) => {}
            other => panic!("expected ContainerOpen, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_garbage_bytes_is_stream_info() {
        let input = MediaInput::memory(vec![0u8; 64]);
        match DemuxStage::open(input, false) {
            Err(ReaderError::StreamInfo(_)) => {}
            other => panic!("expected StreamInfo, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_extension_hint_applies_to_memory_only() {
        let input = MediaInput::file("x.mp3").with_extension_hint("wav");
        match input {
            MediaInput::File { path } => assert_eq!(path, PathBuf::from("x.mp3")),
            _ => panic!("hint must not change the input kind"),
        }
    }
}
