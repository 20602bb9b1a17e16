//! CINE container decoding.
//!
//! The pipeline runs leaf to root: fixed-layout headers, the frame
//! offset index, packed-sample unpacking, black/white-level
//! calibration and, for color sensors, Bayer demosaicing. The
//! [`file::CineFile`] handle orchestrates all of it behind
//! `get_frame`.

pub mod calibrate;
pub mod demosaic;
pub mod error;
pub mod file;
pub mod headers;
pub mod index;
pub mod types;
pub mod unpack;


pub use error::{CineError, Result};

pub use headers::{
    BitmapInfoHeader, Compression, FileHeader, PixelPacking, SetupBlock, parse_headers,
};

pub use index::{FrameIndexEntry, load_index};

pub use calibrate::calibrate;
pub use demosaic::{CfaPattern, demosaic};
pub use unpack::{flip_vertical, unpack};

pub use file::CineFile;
pub use types::{DecodeConfig, DecodeConfigBuilder, PixelBuffer, PixelFormat};
