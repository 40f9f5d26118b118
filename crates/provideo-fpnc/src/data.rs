//! The FPNC correction table and its file format.
//!
//! The file is a flat array of little-endian `u32` registers with no
//! header, register-column major: all samples of register column 0, then
//! all samples of register column 1, and so on. Its length must be exactly
//! `(width / 2) * no_samples * 4` bytes.

use std::io::ErrorKind;
use std::path::Path;

use bytes::{Buf, BufMut, BytesMut};
use tracing::{debug, info};

use provideo_core::error::{Error, Result};

use crate::codec;

/// FPNC correction table of one sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FpncData {
    width: usize,
    no_samples: usize,
    table: Vec<u32>,
    has_data: bool,
}

impl FpncData {
    /// An all-zero table with no data loaded.
    pub fn new(width: usize, no_samples: usize) -> Result<Self> {
        check_geometry(width, no_samples)?;
        Ok(FpncData {
            width,
            no_samples,
            table: vec![0; (width / 2) * no_samples],
            has_data: false,
        })
    }

    /// Build a table from raw register values in file order.
    pub fn from_raw(width: usize, no_samples: usize, values: Vec<u32>) -> Result<Self> {
        check_geometry(width, no_samples)?;
        let expected = (width / 2) * no_samples;
        if values.len() != expected {
            return Err(Error::InvalidArgument(format!(
                "expected {expected} registers, got {}",
                values.len()
            )));
        }
        Ok(FpncData {
            width,
            no_samples,
            table: values,
            has_data: true,
        })
    }

    /// Load a table from a binary file.
    ///
    /// Fails with [`Error::NotFound`] if the file does not exist and
    /// [`Error::InvalidArgument`] if it cannot be read or has the wrong
    /// size.
    pub fn load(path: impl AsRef<Path>, width: usize, no_samples: usize) -> Result<Self> {
        let mut data = Self::new(width, no_samples)?;
        data.reload(path)?;
        Ok(data)
    }

    /// Replace the table with the contents of a file. On failure the
    /// current table is left as it was.
    pub fn reload(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let expected = self.byte_len();

        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::NotFound(format!("{}", path.display())),
            _ => Error::InvalidArgument(format!("cannot read {}: {e}", path.display())),
        })?;
        if bytes.len() != expected {
            return Err(Error::InvalidArgument(format!(
                "{} is {} bytes, expected {expected}",
                path.display(),
                bytes.len()
            )));
        }

        let mut buf = bytes.as_slice();
        let mut table = Vec::with_capacity(self.table.len());
        while buf.has_remaining() {
            table.push(buf.get_u32_le());
        }

        self.table = table;
        self.has_data = true;
        info!(
            path = %path.display(),
            width = self.width,
            no_samples = self.no_samples,
            "loaded FPNC data"
        );
        Ok(())
    }

    /// Write the table in the same format [`load`](Self::load) reads.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut buf = BytesMut::with_capacity(self.byte_len());
        for value in &self.table {
            buf.put_u32_le(*value);
        }
        std::fs::write(path, &buf)?;
        debug!(path = %path.display(), bytes = buf.len(), "saved FPNC data");
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn no_samples(&self) -> usize {
        self.no_samples
    }

    /// Whether a table has been loaded (or built from raw values).
    pub fn has_data(&self) -> bool {
        self.has_data
    }

    /// Number of register columns (`width / 2`).
    pub fn register_columns(&self) -> usize {
        self.width / 2
    }

    /// Size of the binary file for this geometry.
    pub fn byte_len(&self) -> usize {
        self.table.len() * 4
    }

    /// All registers in file order.
    pub fn raw(&self) -> &[u32] {
        &self.table
    }

    /// The registers holding physical `column`, or `None` if it is out of range.
    pub fn registers(&self, column: usize) -> Option<&[u32]> {
        if column >= self.width {
            return None;
        }
        let start = (column / 2) * self.no_samples;
        self.table.get(start..start + self.no_samples)
    }

    /// Decoded correction samples of a physical column.
    ///
    /// A column outside `0..width` yields all zeros.
    pub fn correction_column(&self, column: usize) -> Vec<i32> {
        let Some(registers) = self.registers(column) else {
            return vec![0; self.no_samples];
        };
        let (mask, shift) = codec::field_for(column);
        let samples: Vec<i32> = registers
            .iter()
            .map(|raw| codec::correction_value(*raw, mask, shift))
            .collect();
        codec::uncompress(&samples)
    }

    /// Raw calibration values of a physical column.
    ///
    /// A column outside `0..width` yields all zeros. Any value using bits
    /// 24-31 fails the whole column with [`Error::InvalidArgument`].
    pub fn calibration_column(&self, column: usize) -> Result<Vec<u32>> {
        let Some(registers) = self.registers(column) else {
            return Ok(vec![0; self.no_samples]);
        };
        registers.iter().map(|raw| codec::validate(*raw)).collect()
    }

    /// Store uncompressed correction samples for a physical column.
    ///
    /// Samples are compressed with the device's per-index scale (integer
    /// division, so low bits of large-index samples are lost).
    pub fn set_correction_column(&mut self, column: usize, samples: &[i32]) -> Result<()> {
        if column >= self.width {
            return Err(Error::InvalidArgument(format!(
                "column {column} outside sensor width {}",
                self.width
            )));
        }
        if samples.len() != self.no_samples {
            return Err(Error::InvalidArgument(format!(
                "expected {} samples, got {}",
                self.no_samples,
                samples.len()
            )));
        }
        let start = (column / 2) * self.no_samples;
        let mut updated = self.table[start..start + self.no_samples].to_vec();
        for (i, (raw, sample)) in updated.iter_mut().zip(samples).enumerate() {
            *raw = codec::encode_correction(*raw, sample / codec::multiplier(i), column)?;
        }
        self.table[start..start + self.no_samples].copy_from_slice(&updated);
        self.has_data = true;
        Ok(())
    }
}

/// Columns come in pairs sharing one register column, so the width must be even.
fn check_geometry(width: usize, no_samples: usize) -> Result<()> {
    if width < 2 || width % 2 != 0 || no_samples == 0 {
        return Err(Error::InvalidArgument(format!(
            "invalid FPNC geometry {width}x{no_samples}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const WIDTH: usize = 4;
    const SAMPLES: usize = 16;

    fn write_table(values: &[u32]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for v in values {
            file.write_all(&v.to_le_bytes()).unwrap();
        }
        file.flush().unwrap();
        file
    }

    /// Register column 0 holds +1 for column 0 and -1 for column 1 in
    /// every sample; register column 1 holds sample index values.
    fn sample_table() -> Vec<u32> {
        let mut values = vec![0x00FF_F001; SAMPLES];
        values.extend((0..SAMPLES as u32).map(|s| s | (s << 12)));
        values
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    #[test]
    fn load_exact_size() {
        let file = write_table(&sample_table());
        let data = FpncData::load(file.path(), WIDTH, SAMPLES).unwrap();
        assert!(data.has_data());
        assert_eq!(data.raw().len(), 32);
        assert_eq!(data.raw()[SAMPLES], 0);
        assert_eq!(data.raw()[SAMPLES + 1], 0x0000_1001);
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FpncData::load(dir.path().join("absent.bin"), WIDTH, SAMPLES).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.errno(), -2);
    }

    #[test]
    fn load_wrong_size() {
        let mut values = sample_table();
        values.pop();
        let file = write_table(&values);
        let err = FpncData::load(file.path(), WIDTH, SAMPLES).unwrap_err();
        assert_eq!(err.errno(), -22);
    }

    #[test]
    fn failed_reload_keeps_table() {
        let good = write_table(&sample_table());
        let bad = write_table(&[1, 2, 3]);
        let mut data = FpncData::load(good.path(), WIDTH, SAMPLES).unwrap();
        assert!(data.reload(bad.path()).is_err());
        assert!(data.has_data());
        assert_eq!(data.raw(), sample_table().as_slice());
    }

    #[test]
    fn new_table_has_no_data() {
        let data = FpncData::new(WIDTH, SAMPLES).unwrap();
        assert!(!data.has_data());
        assert_eq!(data.byte_len(), 128);
        assert_eq!(data.correction_column(0), vec![0; SAMPLES]);
    }

    #[test]
    fn invalid_geometry() {
        assert!(FpncData::new(0, 16).is_err());
        assert!(FpncData::new(4, 0).is_err());
        assert!(FpncData::from_raw(4, 2, vec![0; 3]).is_err());
    }

    #[test]
    fn odd_width_is_rejected() {
        let err = FpncData::new(5, 4).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(err.errno(), -22);
        assert!(FpncData::from_raw(5, 4, vec![0; 8]).is_err());

        let file = write_table(&[0; 8]);
        assert!(FpncData::load(file.path(), 5, 4).is_err());
    }

    #[test]
    fn save_then_load() {
        let data = FpncData::from_raw(WIDTH, SAMPLES, sample_table()).unwrap();
        let file = NamedTempFile::new().unwrap();
        data.save(file.path()).unwrap();
        assert_eq!(std::fs::metadata(file.path()).unwrap().len(), 128);
        assert_eq!(FpncData::load(file.path(), WIDTH, SAMPLES).unwrap(), data);
    }

    // -----------------------------------------------------------------------
    // Column decoding
    // -----------------------------------------------------------------------

    #[test]
    fn correction_column_even_and_odd() {
        let data = FpncData::from_raw(WIDTH, SAMPLES, sample_table()).unwrap();
        assert_eq!(
            data.correction_column(0),
            vec![1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 4, 4, 8, 8, 16, 16]
        );
        assert_eq!(
            data.correction_column(1),
            vec![-1, -1, -1, -1, -1, -1, -1, -1, -2, -2, -4, -4, -8, -8, -16, -16]
        );
    }

    #[test]
    fn correction_column_second_register() {
        let data = FpncData::from_raw(WIDTH, SAMPLES, sample_table()).unwrap();
        let expected: Vec<i32> = (0..SAMPLES as i32)
            .map(|s| s * crate::codec::multiplier(s as usize))
            .collect();
        assert_eq!(data.correction_column(2), expected);
        assert_eq!(data.correction_column(3), expected);
    }

    #[test]
    fn out_of_range_column_is_zero() {
        let data = FpncData::from_raw(WIDTH, SAMPLES, sample_table()).unwrap();
        assert_eq!(data.correction_column(WIDTH), vec![0; SAMPLES]);
        assert_eq!(data.correction_column(usize::MAX), vec![0; SAMPLES]);
        assert_eq!(data.calibration_column(WIDTH).unwrap(), vec![0; SAMPLES]);
    }

    #[test]
    fn calibration_column_validates() {
        let mut values = sample_table();
        let data = FpncData::from_raw(WIDTH, SAMPLES, values.clone()).unwrap();
        assert_eq!(data.calibration_column(1).unwrap(), vec![0x00FF_F001; SAMPLES]);

        values[SAMPLES + 3] = 0x0100_0000;
        let data = FpncData::from_raw(WIDTH, SAMPLES, values).unwrap();
        assert!(data.calibration_column(0).is_ok());
        assert_eq!(data.calibration_column(2).unwrap_err().errno(), -22);
    }

    #[test]
    fn set_correction_column_round_trips() {
        let mut data = FpncData::new(WIDTH, SAMPLES).unwrap();
        let samples: Vec<i32> = (0..SAMPLES)
            .map(|i| -3 * crate::codec::multiplier(i))
            .collect();
        data.set_correction_column(3, &samples).unwrap();
        assert!(data.has_data());
        assert_eq!(data.correction_column(3), samples);
        assert_eq!(data.correction_column(2), vec![0; SAMPLES]);
    }

    #[test]
    fn set_correction_column_rejects_bad_input() {
        let mut data = FpncData::new(WIDTH, SAMPLES).unwrap();
        assert!(data.set_correction_column(WIDTH, &[0; SAMPLES]).is_err());
        assert!(data.set_correction_column(0, &[0; 3]).is_err());
        assert!(data.set_correction_column(0, &[5000; SAMPLES]).is_err());
        assert!(!data.has_data());
    }
}
