//! Fixed pattern noise correction (FPNC) data for ProVideo devices.
//!
//! A sensor's FPNC data is a table of 32-bit registers, `width / 2`
//! register columns by `no_samples` samples. Each register packs two
//! physical columns:
//!
//! ```text
//!  31      24 23          12 11           0
//! +----------+--------------+--------------+
//! |   zero   |  odd column  | even column  |
//! +----------+--------------+--------------+
//! ```
//!
//! Runtime correction samples are the 12-bit sub-fields, two's complement,
//! stored compressed: samples 8 and up are scaled down on the device and
//! must be multiplied back ([`codec::uncompress`]). Calibration data uses
//! the full 24 bits and is only valid while the top byte is zero.
//!
//! - [`codec`] -- the bit-level operations
//! - [`data`] -- [`FpncData`], the table and its binary file format

pub mod codec;
pub mod data;

pub use codec::{
    EVEN_MASK, EVEN_SHIFT, ODD_MASK, ODD_SHIFT, correction_value, encode_correction,
    multiplier, uncompress, validate,
};
pub use data::FpncData;
