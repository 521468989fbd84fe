//! # pcm-reader
//!
//! Streaming audio decode-and-resample pipeline: open a compressed
//! audio source, pull fixed-format PCM blocks, close.
//!
//! ## Overview
//!
//! Given an arbitrary compressed audio file (or in-memory byte region),
//! the reader produces interleaved PCM blocks in a caller-chosen sample
//! rate, channel count, and sample representation. Container
//! demultiplexing, codec selection, decoding, and format/rate/channel
//! conversion are coordinated behind three operations:
//!
//! - [`AudioReader::open`] — probe the container, select the first
//!   audio stream, build the decoder and converter
//! - [`AudioReader::read`] — produce at most one converted block per
//!   call, pull model, loop until [`ReadStatus::EndOfStream`]
//! - [`AudioReader::close`] — release everything (dropping works too)
//!
//! ```rust,no_run
//! use pcm_reader::{AudioReader, MediaInput, OutputSpec, ReadStatus, ReaderConfig};
//!
//! # fn example() -> pcm_reader::Result<()> {
//! let mut reader = AudioReader::open(
//!     MediaInput::file("/music/song.mp3"),
//!     OutputSpec::default(), // s16le, 44.1 kHz, stereo
//!     ReaderConfig::default(),
//! )?;
//!
//! let mut block = vec![0u8; 4096 * reader.bytes_per_frame()];
//! loop {
//!     match reader.read(&mut block)? {
//!         ReadStatus::Samples(0) => continue, // call again
//!         ReadStatus::Samples(_frames) => { /* consume the block */ }
//!         ReadStatus::EndOfStream => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decode;
pub mod demux;
pub mod error;
pub mod format;
pub mod reader;
pub mod resample;
pub mod staging;

pub use config::{OutputSpec, ReaderConfig};
pub use demux::MediaInput;
pub use error::{ReaderError, Result};
pub use format::{ChannelLayout, PcmFormat, SampleValueFormat};
pub use reader::{AudioReader, ReadStatus};
