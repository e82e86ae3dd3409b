//! Audio file I/O for nuclear lattices.
//!
//! Lattices move interleaved multichannel periods, so unlike a mono or stereo
//! effect host these helpers never mix down: every channel of the file comes
//! back interleaved, and every channel written goes out as-is.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nuclear_io::{read_wav_interleaved, write_wav_interleaved};
//!
//! let (samples, spec) = read_wav_interleaved("input.wav")?;
//! // ... run periods of `spec.channels` through a ChannelLattice ...
//! write_wav_interleaved("output.wav", &samples, spec)?;
//! ```

mod wav;

pub use wav::{
    WavFormat, WavInfo, WavSpec, frame_count, read_wav_info, read_wav_interleaved,
    write_wav_interleaved,
};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Sample data does not fit the declared channel layout.
    #[error("Sample layout error: {0}")]
    Shape(String),

    /// The requested sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),
}

/// Convenience result alias for nuclear-io operations.
pub type Result<T> = std::result::Result<T, Error>;
