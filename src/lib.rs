//! Decoder for CINE high-speed camera files.
//!
//! Opens a cine container, parses its headers and frame index once,
//! and serves individual frames as calibrated `u16` pixel buffers,
//! grayscale straight from the sensor or RGB after demosaicing.
//! Encoding to PNG/JPEG/video is left to an external image encoder
//! that consumes the buffer plus its dimensions and channel count.
//!
//! ```no_run
//! use cine_decode_rs::CineFile;
//!
//! # fn main() -> cine_decode_rs::Result<()> {
//! let mut video = CineFile::open("capture.cine")?;
//! let frame = video.get_frame(0)?;
//! println!(
//!     "{}x{}, {} channels, {} samples",
//!     frame.width(),
//!     frame.height(),
//!     frame.channels(),
//!     frame.len()
//! );
//! # Ok(())
//! # }
//! ```

pub mod cine;
pub mod logger;

pub use cine::{
    BitmapInfoHeader, CfaPattern, CineError, CineFile, Compression, DecodeConfig,
    DecodeConfigBuilder, FileHeader, FrameIndexEntry, PixelBuffer, PixelFormat, PixelPacking,
    Result, SetupBlock,
};
