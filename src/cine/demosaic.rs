//! Color-filter-array handling: pattern ids and Bayer demosaicing.

use std::io::Cursor;

use bayer::{BayerDepth, CFA, Demosaic, RasterDepth, RasterMut};
use tracing::debug;

use crate::cine::error::{CineError, Result};

/// Sensor color-filter layouts named by the setup block's CFA id.
///
/// The pattern id lives in the low byte of the field; the high byte
/// flags gray heads on multi-head cameras and does not change the
/// pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfaPattern {
    /// 0, monochrome sensor, no interpolation.
    Gray,
    /// 1, gbrg/rggb sensor.
    Vri,
    /// 2, bggr/grbg sensor.
    VriV6,
    /// 3, gb/rg sensor.
    Bayer,
    /// 4, rg/gb sensor.
    BayerFlip,
    /// 5, gr/bg sensor.
    BayerFlipPb,
    /// 6, bg/gr sensor.
    BayerFlipPh,
}

impl CfaPattern {
    pub fn from_id(id: u16) -> Result<Self> {
        match id & 0x00FF {
            0 => Ok(Self::Gray),
            1 => Ok(Self::Vri),
            2 => Ok(Self::VriV6),
            3 => Ok(Self::Bayer),
            4 => Ok(Self::BayerFlip),
            5 => Ok(Self::BayerFlipPb),
            6 => Ok(Self::BayerFlipPh),
            _ => Err(CineError::UnknownCfaPattern(id)),
        }
    }

    pub fn is_color(&self) -> bool {
        *self != Self::Gray
    }

    /// The 2x2 channel layout each pattern id resolves to.
    fn bayer_cfa(&self) -> Option<CFA> {
        match self {
            Self::Gray => None,
            Self::Vri | Self::Bayer => Some(CFA::GBRG),
            Self::VriV6 | Self::BayerFlipPh => Some(CFA::BGGR),
            Self::BayerFlip => Some(CFA::RGGB),
            Self::BayerFlipPb => Some(CFA::GRBG),
        }
    }
}

/// Interpolates a single-channel mosaic into interleaved RGB.
///
/// `Gray` passes the samples through untouched. Color patterns run
/// bilinear interpolation keyed by the 2x2 layout above; edge pixels
/// use boundary-duplicated neighbors. Output length is
/// `width * height * 3`.
pub fn demosaic(samples: &[u16], width: u32, height: u32, pattern: CfaPattern) -> Result<Vec<u16>> {
    let Some(cfa) = pattern.bayer_cfa() else {
        return Ok(samples.to_vec());
    };

    let w = width as usize;
    let h = height as usize;
    if samples.len() != w * h {
        return Err(CineError::Demosaic(format!(
            "mosaic has {} samples, expected {} for {}x{}",
            samples.len(),
            w * h,
            width,
            height
        )));
    }

    debug!("demosaicing {}x{} mosaic as {:?}", width, height, cfa);

    // The demosaic routine consumes a byte stream, so feed the mosaic
    // as 16-bit little-endian and read the raster back the same way.
    let mosaic_bytes: Vec<u8> = samples.iter().flat_map(|&v| v.to_le_bytes()).collect();
    let mut rgb_bytes = vec![0u8; w * h * 3 * 2];
    let mut raster = RasterMut::new(w, h, RasterDepth::Depth16, &mut rgb_bytes);

    bayer::run_demosaic(
        &mut Cursor::new(&mosaic_bytes[..]),
        BayerDepth::Depth16LE,
        cfa,
        Demosaic::Linear,
        &mut raster,
    )
    .map_err(|e| CineError::Demosaic(format!("{e:?}")))?;

    Ok(rgb_bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_is_a_passthrough() {
        let samples = vec![1u16, 2, 3, 4];
        let out = demosaic(&samples, 2, 2, CfaPattern::Gray).unwrap();
        assert_eq!(out, samples);
    }

    #[test]
    fn uniform_mosaic_stays_uniform() {
        let samples = vec![512u16; 8 * 8];
        let out = demosaic(&samples, 8, 8, CfaPattern::Bayer).unwrap();
        assert_eq!(out.len(), 8 * 8 * 3);
        assert!(out.iter().all(|&v| v == 512));
    }

    #[test]
    fn every_color_pattern_produces_three_channels() {
        let samples = vec![100u16; 8 * 8];
        for pattern in [
            CfaPattern::Vri,
            CfaPattern::VriV6,
            CfaPattern::Bayer,
            CfaPattern::BayerFlip,
            CfaPattern::BayerFlipPb,
            CfaPattern::BayerFlipPh,
        ] {
            let out = demosaic(&samples, 8, 8, pattern).unwrap();
            assert_eq!(out.len(), 8 * 8 * 3);
        }
    }

    #[test]
    fn unknown_pattern_id_is_rejected() {
        let err = CfaPattern::from_id(9).unwrap_err();
        assert!(matches!(err, CineError::UnknownCfaPattern(9)));
    }

    #[test]
    fn high_byte_head_flags_do_not_change_the_pattern() {
        // 0x8003: top-left-gray head flag over a Bayer sensor.
        assert_eq!(CfaPattern::from_id(0x8003).unwrap(), CfaPattern::Bayer);
    }

    #[test]
    fn rejects_wrong_mosaic_length() {
        let samples = vec![0u16; 10];
        let err = demosaic(&samples, 8, 8, CfaPattern::Bayer).unwrap_err();
        assert!(matches!(err, CineError::Demosaic(_)));
    }
}
