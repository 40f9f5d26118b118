//! Bit-level FPNC operations.

use provideo_core::error::{Error, Result};

/// Sub-field of an even physical column.
pub const EVEN_MASK: u32 = 0x0000_0FFF;
pub const EVEN_SHIFT: u32 = 0;

/// Sub-field of an odd physical column.
pub const ODD_MASK: u32 = 0x00FF_F000;
pub const ODD_SHIFT: u32 = 12;

/// Bits a valid calibration value may use.
pub const CALIBRATION_MASK: u32 = 0x00FF_FFFF;

const SIGN_BIT: u32 = 1 << 11;
const SIGN_EXTEND: u32 = 0xFFFF_F000;

/// Mask and shift of the sub-field holding `column`.
pub fn field_for(column: usize) -> (u32, u32) {
    if column % 2 == 0 {
        (EVEN_MASK, EVEN_SHIFT)
    } else {
        (ODD_MASK, ODD_SHIFT)
    }
}

/// Extract a 12-bit two's complement sample from a register.
///
/// ```
/// use provideo_fpnc::codec::{correction_value, ODD_MASK, ODD_SHIFT};
///
/// assert_eq!(correction_value(0x00FF_F000, ODD_MASK, ODD_SHIFT), -1);
/// assert_eq!(correction_value(0x0000_07FF, 0xFFF, 0), 2047);
/// ```
pub fn correction_value(raw: u32, mask: u32, shift: u32) -> i32 {
    let mut field = (raw & mask) >> shift;
    if field & SIGN_BIT != 0 {
        field |= SIGN_EXTEND;
    }
    field as i32
}

/// Check that a calibration value fits in 24 bits.
pub fn validate(raw: u32) -> Result<u32> {
    if raw & !CALIBRATION_MASK != 0 {
        return Err(Error::InvalidArgument(format!(
            "calibration value {raw:#010x} uses bits 24-31"
        )));
    }
    Ok(raw)
}

/// Scale factor of the sample at `index`.
pub fn multiplier(index: usize) -> i32 {
    match index {
        0..=7 => 1,
        8..=9 => 2,
        10..=11 => 4,
        12..=13 => 8,
        _ => 16,
    }
}

/// Undo the device's per-index compression of correction samples.
///
/// Samples decoded from registers are 12-bit; wider inputs saturate at
/// the `i32` range.
pub fn uncompress(samples: &[i32]) -> Vec<i32> {
    samples
        .iter()
        .enumerate()
        .map(|(i, v)| v.saturating_mul(multiplier(i)))
        .collect()
}

/// Pack a correction sample into the sub-field of `column`, leaving the
/// other column's bits of `raw` untouched.
///
/// `value` is the compressed sample and must fit 12-bit two's complement.
pub fn encode_correction(raw: u32, value: i32, column: usize) -> Result<u32> {
    if !(-2048..=2047).contains(&value) {
        return Err(Error::InvalidArgument(format!(
            "correction sample {value} does not fit 12 bits"
        )));
    }
    let (mask, shift) = field_for(column);
    let field = ((value as u32) << shift) & mask;
    Ok((raw & !mask) | field)
}
