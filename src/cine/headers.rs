//! Fixed-layout binary headers at the front of a cine file.
//!
//! Three blocks are read at open: the file header at byte 0, the
//! bitmap info header at `off_image_header` and the camera setup block
//! at `off_setup`. All integers are little-endian. Each block declares
//! its own size, which is validated before any field is trusted.

use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use crate::cine::error::{CineError, Result};

/// ASCII "CI" read as a little-endian u16.
pub const CINE_MAGIC: u16 = 0x4943;
pub const SUPPORTED_VERSION: u16 = 1;

pub const FILE_HEADER_SIZE: usize = 44;
pub const BITMAP_HEADER_SIZE: usize = 40;
/// Smallest setup block this reader accepts; vendor fields past the
/// documented layout are ignored.
pub const SETUP_MIN_SIZE: usize = 36;

/// File-level compression mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Uncompressed grayscale.
    None,
    /// Lossy JPEG-compressed frames.
    Jpeg,
    /// Uninterpolated color sensor data (raw mosaic).
    Uninterpolated,
}

impl Compression {
    pub fn from_tag(tag: u16) -> Result<Self> {
        match tag {
            0 => Ok(Self::None),
            1 => Ok(Self::Jpeg),
            2 => Ok(Self::Uninterpolated),
            other => Err(CineError::InvalidHeaderField {
                field: "compression",
                value: other as i64,
            }),
        }
    }
}

/// Pixel packing of the stored frames, from `bi_compression`.
///
/// This tag is independent of the file-level [`Compression`] mode: a
/// file whose bitmap header says 16 bits per sample can still carry
/// 10-bit packed sensor data, flagged here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelPacking {
    /// Samples stored at `bi_bit_count` width, no bit-shuffling.
    Raw,
    /// 4 samples of 10 bits in every 5 bytes.
    Packed10,
    /// 2 samples of 12 bits in every 3 bytes.
    Packed12,
}

impl PixelPacking {
    pub fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            0 => Ok(Self::Raw),
            256 => Ok(Self::Packed10),
            1024 => Ok(Self::Packed12),
            other => Err(CineError::InvalidHeaderField {
                field: "bi_compression",
                value: other as i64,
            }),
        }
    }

    /// Effective stored bits per sample.
    pub fn bit_depth(&self, bi_bit_count: u16) -> u16 {
        match self {
            Self::Raw => bi_bit_count,
            Self::Packed10 => 10,
            Self::Packed12 => 12,
        }
    }
}

/// The 44-byte header at the start of every cine file.
#[derive(Debug, Clone)]
pub struct FileHeader {
    pub header_size: u16,
    pub compression: Compression,
    pub version: u16,
    pub first_movie_image: i32,
    pub total_image_count: u32,
    pub first_image_no: i32,
    pub image_count: u32,
    pub off_image_header: u32,
    pub off_setup: u32,
    pub off_image_offsets: u32,
    pub trigger_time: u64,
}

/// BMP-style info header describing the stored frames.
#[derive(Debug, Clone)]
pub struct BitmapInfoHeader {
    pub bi_size: u32,
    pub bi_width: i32,
    pub bi_height: i32,
    pub bi_planes: u16,
    pub bi_bit_count: u16,
    pub bi_compression: u32,
    pub bi_size_image: u32,
    pub bi_x_pels_per_meter: i32,
    pub bi_y_pels_per_meter: i32,
    pub bi_clr_used: u32,
    pub bi_clr_important: u32,
}

/// Camera and sensor metadata. Read-only after parse; only used to
/// select the color pipeline and scale intensities.
#[derive(Debug, Clone)]
pub struct SetupBlock {
    pub setup_size: u16,
    pub frame_rate16: u16,
    pub serial: u32,
    pub cfa: u16,
    pub black_level: u16,
    pub white_level: u16,
    pub real_bpp: u16,
    pub rec_bpp: u16,
    pub im_width: u32,
    pub im_height: u32,
    pub d_frame_rate: f64,
}

impl SetupBlock {
    /// Nominal capture rate. Newer files carry the double-precision
    /// field; older ones only the 16-bit integer.
    pub fn frame_rate(&self) -> f64 {
        if self.d_frame_rate > 0.0 {
            self.d_frame_rate
        } else {
            self.frame_rate16 as f64
        }
    }
}

/// Little-endian field cursor over an exact-size header buffer.
struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn u16(&mut self) -> u16 {
        let v = u16::from_le_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        self.pos += 2;
        v
    }

    fn u32(&mut self) -> u32 {
        let v = u32::from_le_bytes(self.buf[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        v
    }

    fn i32(&mut self) -> i32 {
        let v = i32::from_le_bytes(self.buf[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        v
    }

    fn u64(&mut self) -> u64 {
        let v = u64::from_le_bytes(self.buf[self.pos..self.pos + 8].try_into().unwrap());
        self.pos += 8;
        v
    }

    fn f64(&mut self) -> f64 {
        f64::from_bits(self.u64())
    }

    fn skip(&mut self, n: usize) {
        self.pos += n;
    }
}

/// Reads exactly `len` bytes at `offset`, or reports how far the file
/// actually reached.
fn read_block<R: Read + Seek>(
    source: &mut R,
    offset: u64,
    len: usize,
    what: &'static str,
) -> Result<Vec<u8>> {
    source.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        match source.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(CineError::TruncatedHeader {
                    what,
                    offset,
                    needed: len,
                    available: filled,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(buf)
}

/// Parses the three header blocks from the start of a cine byte source.
///
/// Fails with `NotACineFile` on a bad magic, `UnsupportedVersion` on
/// anything but version 1, `TruncatedHeader` when a declared block does
/// not fit in the file, and `InvalidHeaderField` when a field violates
/// a format invariant. Does not mutate the source beyond its cursor.
pub fn parse_headers<R: Read + Seek>(
    source: &mut R,
) -> Result<(FileHeader, BitmapInfoHeader, SetupBlock)> {
    let magic_buf = read_block(source, 0, 2, "file header magic")?;
    let magic = u16::from_le_bytes([magic_buf[0], magic_buf[1]]);
    if magic != CINE_MAGIC {
        return Err(CineError::NotACineFile { found: magic });
    }

    let buf = read_block(source, 2, FILE_HEADER_SIZE - 2, "file header")?;
    let mut r = FieldReader::new(&buf);
    let header_size = r.u16();
    if (header_size as usize) < FILE_HEADER_SIZE {
        return Err(CineError::InvalidHeaderField {
            field: "header_size",
            value: header_size as i64,
        });
    }
    let compression_tag = r.u16();
    let version = r.u16();
    if version != SUPPORTED_VERSION {
        return Err(CineError::UnsupportedVersion {
            found: version,
            supported: SUPPORTED_VERSION,
        });
    }
    let file_header = FileHeader {
        header_size,
        compression: Compression::from_tag(compression_tag)?,
        version,
        first_movie_image: r.i32(),
        total_image_count: r.u32(),
        first_image_no: r.i32(),
        image_count: r.u32(),
        off_image_header: r.u32(),
        off_setup: r.u32(),
        off_image_offsets: r.u32(),
        trigger_time: r.u64(),
    };

    let buf = read_block(
        source,
        file_header.off_image_header as u64,
        BITMAP_HEADER_SIZE,
        "bitmap info header",
    )?;
    let mut r = FieldReader::new(&buf);
    let bitmap = BitmapInfoHeader {
        bi_size: r.u32(),
        bi_width: r.i32(),
        bi_height: r.i32(),
        bi_planes: r.u16(),
        bi_bit_count: r.u16(),
        bi_compression: r.u32(),
        bi_size_image: r.u32(),
        bi_x_pels_per_meter: r.i32(),
        bi_y_pels_per_meter: r.i32(),
        bi_clr_used: r.u32(),
        bi_clr_important: r.u32(),
    };
    if (bitmap.bi_size as usize) < BITMAP_HEADER_SIZE {
        return Err(CineError::InvalidHeaderField {
            field: "bi_size",
            value: bitmap.bi_size as i64,
        });
    }
    if bitmap.bi_width <= 0 {
        return Err(CineError::InvalidHeaderField {
            field: "bi_width",
            value: bitmap.bi_width as i64,
        });
    }
    if bitmap.bi_height <= 0 {
        return Err(CineError::InvalidHeaderField {
            field: "bi_height",
            value: bitmap.bi_height as i64,
        });
    }

    let buf = read_block(
        source,
        file_header.off_setup as u64,
        SETUP_MIN_SIZE,
        "setup block",
    )?;
    let mut r = FieldReader::new(&buf);
    let setup = SetupBlock {
        setup_size: r.u16(),
        frame_rate16: r.u16(),
        serial: r.u32(),
        cfa: r.u16(),
        black_level: r.u16(),
        white_level: r.u16(),
        real_bpp: r.u16(),
        rec_bpp: {
            let v = r.u16();
            r.skip(2); // reserved
            v
        },
        im_width: r.u32(),
        im_height: r.u32(),
        d_frame_rate: r.f64(),
    };
    if (setup.setup_size as usize) < SETUP_MIN_SIZE {
        return Err(CineError::InvalidHeaderField {
            field: "setup_size",
            value: setup.setup_size as i64,
        });
    }
    if setup.black_level >= setup.white_level {
        return Err(CineError::InvalidHeaderField {
            field: "white_level",
            value: setup.white_level as i64,
        });
    }
    // The sensor crop echoed in the setup block must agree with the
    // bitmap header when present (zero means absent).
    if setup.im_width != 0 && setup.im_width != bitmap.bi_width as u32 {
        return Err(CineError::InvalidHeaderField {
            field: "im_width",
            value: setup.im_width as i64,
        });
    }
    if setup.im_height != 0 && setup.im_height != bitmap.bi_height as u32 {
        return Err(CineError::InvalidHeaderField {
            field: "im_height",
            value: setup.im_height as i64,
        });
    }

    debug!(
        "parsed headers: {}x{}, {} frames, bit_count {}, packing tag {}",
        bitmap.bi_width,
        bitmap.bi_height,
        file_header.image_count,
        bitmap.bi_bit_count,
        bitmap.bi_compression
    );

    Ok((file_header, bitmap, setup))
}
