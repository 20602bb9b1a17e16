//! The open-file handle and frame accessor.

use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, info};

use crate::cine::calibrate::calibrate;
use crate::cine::demosaic::{CfaPattern, demosaic};
use crate::cine::error::{CineError, Result};
use crate::cine::headers::{
    BitmapInfoHeader, FileHeader, PixelPacking, SetupBlock, parse_headers,
};
use crate::cine::index::{FrameIndexEntry, load_index};
use crate::cine::types::{DecodeConfig, PixelBuffer, PixelFormat};
use crate::cine::unpack::{expected_byte_len, flip_vertical, unpack};

/// Decoded-frame cache. Keyed by frame number, oldest insertion
/// evicted first; the handle is its sole owner.
#[derive(Debug)]
struct FrameCache {
    capacity: usize,
    frames: HashMap<u32, PixelBuffer>,
    order: VecDeque<u32>,
}

impl FrameCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            frames: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, frame_no: u32) -> Option<&PixelBuffer> {
        self.frames.get(&frame_no)
    }

    fn insert(&mut self, frame_no: u32, buffer: PixelBuffer) {
        if self.capacity == 0 || self.frames.contains_key(&frame_no) {
            return;
        }
        if self.frames.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.frames.remove(&oldest);
            }
        }
        self.frames.insert(frame_no, buffer);
        self.order.push_back(frame_no);
    }
}

/// An open cine file.
///
/// Headers and the frame index are parsed exactly once at open and are
/// read-only afterwards; any header or index error fails the open and
/// no handle is returned. A failure while decoding one frame aborts
/// only that `get_frame` call, the handle stays valid for other frames.
#[derive(Debug)]
pub struct CineFile<R: Read + Seek> {
    source: R,
    file_len: u64,
    file_header: FileHeader,
    bitmap_header: BitmapInfoHeader,
    setup: SetupBlock,
    index: Vec<FrameIndexEntry>,
    packing: PixelPacking,
    cfa: CfaPattern,
    frame_byte_len: usize,
    cache: Option<FrameCache>,
}

impl CineFile<File> {
    /// Opens a cine file on disk with the default configuration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, DecodeConfig::default())
    }

    pub fn open_with_config<P: AsRef<Path>>(path: P, config: DecodeConfig) -> Result<Self> {
        let path = path.as_ref();
        info!("opening cine file {}", path.display());
        let file = File::open(path)?;
        Self::from_reader_with_config(file, config)
    }
}

impl<R: Read + Seek> CineFile<R> {
    /// Opens any seekable byte source holding cine data.
    pub fn from_reader(source: R) -> Result<Self> {
        Self::from_reader_with_config(source, DecodeConfig::default())
    }

    pub fn from_reader_with_config(mut source: R, config: DecodeConfig) -> Result<Self> {
        let file_len = source.seek(SeekFrom::End(0))?;
        let (file_header, bitmap_header, setup) = parse_headers(&mut source)?;

        if config.validate_dimensions {
            if let Some(max) = config.max_dimension {
                if bitmap_header.bi_width as u32 > max {
                    return Err(CineError::InvalidHeaderField {
                        field: "bi_width",
                        value: bitmap_header.bi_width as i64,
                    });
                }
                if bitmap_header.bi_height as u32 > max {
                    return Err(CineError::InvalidHeaderField {
                        field: "bi_height",
                        value: bitmap_header.bi_height as i64,
                    });
                }
            }
        }

        let packing = PixelPacking::from_tag(bitmap_header.bi_compression)?;
        let bit_depth = packing.bit_depth(bitmap_header.bi_bit_count);
        if !matches!(bit_depth, 8 | 10 | 12 | 16) {
            return Err(CineError::InvalidHeaderField {
                field: "bi_bit_count",
                value: bitmap_header.bi_bit_count as i64,
            });
        }
        let cfa = CfaPattern::from_id(setup.cfa)?;

        let frame_byte_len = expected_byte_len(
            bitmap_header.bi_width as u32,
            bitmap_header.bi_height as u32,
            bit_depth,
        )
        .ok_or(CineError::InvalidHeaderField {
            field: "bi_width",
            value: bitmap_header.bi_width as i64,
        })?;

        let index = load_index(&mut source, &file_header, file_len)?;
        let cache = config.frame_cache_capacity.map(FrameCache::new);

        info!(
            "cine source ready: {}x{} px, {} frames, {:?} packing ({} bit), {:?} sensor",
            bitmap_header.bi_width,
            bitmap_header.bi_height,
            file_header.image_count,
            packing,
            bit_depth,
            cfa
        );

        Ok(Self {
            source,
            file_len,
            file_header,
            bitmap_header,
            setup,
            index,
            packing,
            cfa,
            frame_byte_len,
            cache,
        })
    }

    pub fn file_header(&self) -> &FileHeader {
        &self.file_header
    }

    pub fn bitmap_header(&self) -> &BitmapInfoHeader {
        &self.bitmap_header
    }

    pub fn setup(&self) -> &SetupBlock {
        &self.setup
    }

    pub fn width(&self) -> u32 {
        self.bitmap_header.bi_width as u32
    }

    pub fn height(&self) -> u32 {
        self.bitmap_header.bi_height as u32
    }

    pub fn frame_count(&self) -> u32 {
        self.file_header.image_count
    }

    pub fn frame_rate(&self) -> f64 {
        self.setup.frame_rate()
    }

    /// Effective stored bits per sample (packing overrides the bitmap
    /// header's nominal bit count).
    pub fn bit_depth(&self) -> u16 {
        self.packing.bit_depth(self.bitmap_header.bi_bit_count)
    }

    pub fn cfa_pattern(&self) -> CfaPattern {
        self.cfa
    }

    /// Channels per pixel of decoded frames: 1 for mono, 3 for color.
    pub fn channels(&self) -> u32 {
        if self.cfa.is_color() { 3 } else { 1 }
    }

    /// Decodes frame `frame_no` (zero-based) into a calibrated pixel
    /// buffer.
    ///
    /// Deterministic and idempotent: repeated calls on the same
    /// unmutated source return bit-identical buffers.
    pub fn get_frame(&mut self, frame_no: u32) -> Result<PixelBuffer> {
        let image_count = self.file_header.image_count;
        if frame_no >= image_count {
            return Err(CineError::FrameIndexOutOfRange {
                frame_no,
                image_count,
            });
        }

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(frame_no) {
                debug!("frame {frame_no} served from cache");
                return Ok(hit.clone());
            }
        }

        let entry = self.index[frame_no as usize];
        let raw = self.read_frame_bytes(entry)?;

        let width = self.width();
        let height = self.height();
        let bit_depth = self.bit_depth();
        let mut samples = unpack(&raw, width, height, bit_depth)?;
        if self.packing == PixelPacking::Raw {
            // Raw frames are stored bottom-up, packed frames top-down.
            flip_vertical(&mut samples, width, height);
        }
        calibrate(&mut samples, self.setup.black_level, self.setup.white_level);

        let (format, data) = if self.cfa.is_color() {
            (PixelFormat::Rgb, demosaic(&samples, width, height, self.cfa)?)
        } else {
            (PixelFormat::Gray, samples)
        };
        let buffer = PixelBuffer::new(width, height, format, data);

        debug!(
            "decoded frame {frame_no}: {}x{} {:?}, {} samples",
            width,
            height,
            format,
            buffer.len()
        );

        if let Some(cache) = &mut self.cache {
            cache.insert(frame_no, buffer.clone());
        }
        Ok(buffer)
    }

    /// Expected packed payload length per frame, for callers sizing
    /// their own buffers.
    pub fn frame_byte_len(&self) -> usize {
        self.frame_byte_len
    }

    /// Reads the pixel payload of one image block. The block opens
    /// with its annotation segment; the leading u32 is the byte
    /// distance from block start to the pixel data.
    fn read_frame_bytes(&mut self, entry: FrameIndexEntry) -> Result<Vec<u8>> {
        self.source.seek(SeekFrom::Start(entry.offset))?;
        let mut offset_buf = [0u8; 4];
        self.source.read_exact(&mut offset_buf)?;
        let offset_to_pixels = u32::from_le_bytes(offset_buf);

        self.source
            .seek(SeekFrom::Start(entry.offset + offset_to_pixels as u64))?;
        let mut raw = vec![0u8; entry.length as usize];
        self.source.read_exact(&mut raw)?;
        Ok(raw)
    }

    pub fn file_len(&self) -> u64 {
        self.file_len
    }
}
