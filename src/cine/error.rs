use thiserror::Error;

#[derive(Error, Debug)]
pub enum CineError {
    #[error("not a cine file: expected magic \"CI\", found {found:#06x}")]
    NotACineFile { found: u16 },

    #[error("unsupported cine version {found}, this reader understands version {supported}")]
    UnsupportedVersion { found: u16, supported: u16 },

    #[error("truncated {what} at byte {offset}: needed {needed} bytes, only {available} available")]
    TruncatedHeader {
        what: &'static str,
        offset: u64,
        needed: usize,
        available: usize,
    },

    #[error("invalid header field {field} = {value}")]
    InvalidHeaderField { field: &'static str, value: i64 },

    #[error("corrupt frame index entry {entry}: {detail}")]
    CorruptIndex { entry: u32, detail: String },

    #[error("frame {frame_no} out of range, file holds {image_count} frames")]
    FrameIndexOutOfRange { frame_no: u32, image_count: u32 },

    #[error(
        "frame payload length mismatch for {width}x{height} at {bit_count} bits: \
         expected {expected} bytes, got {actual}"
    )]
    UnpackLengthMismatch {
        width: u32,
        height: u32,
        bit_count: u16,
        expected: usize,
        actual: usize,
    },

    #[error("unknown CFA pattern id {0:#06x}")]
    UnknownCfaPattern(u16),

    #[error("demosaic failed: {0}")]
    Demosaic(String),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CineError>;
