//! Black/white-level normalization.

/// Rescales each sample from the sensor's usable range into the full
/// `u16` output range.
///
/// `black_level` maps to 0, `white_level` to `u16::MAX`, values in
/// between scale linearly and monotonically. Samples outside the range
/// clip; nothing wraps. The header parser guarantees
/// `black_level < white_level`.
pub fn calibrate(samples: &mut [u16], black_level: u16, white_level: u16) {
    debug_assert!(black_level < white_level);
    let black = black_level as u32;
    let white = white_level as u32;
    let range = white - black;
    for s in samples.iter_mut() {
        let v = *s as u32;
        *s = if v <= black {
            0
        } else if v >= white {
            u16::MAX
        } else {
            ((v - black) * u16::MAX as u32 / range) as u16
        };
    }
}
