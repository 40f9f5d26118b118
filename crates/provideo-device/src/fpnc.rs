//! Fixed pattern noise correction.
//!
//! FPNC registers are reached through `fpnc_data <page> <column> <offset>`,
//! four registers per exchange. A register column of `no_samples`
//! registers therefore takes `ceil(no_samples / 4)` exchanges; the last
//! page is padded with zeros when written and truncated when read.
//!
//! | page | contents                                  |
//! |------|-------------------------------------------|
//! | 0    | calibration values of the even column     |
//! | 1    | calibration values of the odd column      |
//! | 2    | packed runtime correction samples         |

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use provideo_core::error::{Error, Result};
use provideo_core::types::*;
use provideo_fpnc::{FpncData, codec};
use provideo_protocol::{Channel, narrow};

use crate::commands::fpnc as cmd;
use crate::domains::FpncCommands;

const PAGE: usize = cmd::VALUES_PER_PAGE;

/// [`FpncCommands`] for ProVideo devices.
#[derive(Debug, Clone)]
pub struct ProVideoFpnc {
    channel: Arc<Channel>,
    geometry: FpncGeometry,
    legacy_calibration_pages: bool,
}

impl ProVideoFpnc {
    pub fn new(channel: Arc<Channel>, geometry: FpncGeometry) -> Self {
        ProVideoFpnc {
            channel,
            geometry,
            legacy_calibration_pages: false,
        }
    }

    /// Read both calibration pages into the even column, as older
    /// firmware tools did. The odd column then reads as zeros.
    pub fn with_legacy_calibration_pages(mut self, legacy: bool) -> Self {
        self.legacy_calibration_pages = legacy;
        self
    }

    fn register_columns(&self) -> usize {
        self.geometry.width / 2
    }

    fn check_address(&self, column: u32, offset: u32) -> Result<()> {
        if column as usize >= self.register_columns() {
            return Err(Error::InvalidArgument(format!(
                "register column {column} outside 0..{}",
                self.register_columns()
            )));
        }
        if offset as usize >= self.geometry.no_samples {
            return Err(Error::InvalidArgument(format!(
                "offset {offset} outside 0..{}",
                self.geometry.no_samples
            )));
        }
        Ok(())
    }

    /// All registers of one register column on `page`.
    async fn read_register_column(&self, page: u32, column: u32) -> Result<Vec<u32>> {
        let samples = self.geometry.no_samples;
        let mut registers = Vec::with_capacity(samples.div_ceil(PAGE) * PAGE);
        for offset in (0..samples).step_by(PAGE) {
            let values = self.read_page(page, column, offset as u32).await?;
            registers.extend_from_slice(&values);
        }
        registers.truncate(samples);
        Ok(registers)
    }

    async fn write_register_column(&self, page: u32, column: u32, registers: &[u32]) -> Result<()> {
        for (i, chunk) in registers.chunks(PAGE).enumerate() {
            let mut values = [0u32; PAGE];
            values[..chunk.len()].copy_from_slice(chunk);
            self.write_page(page, column, (i * PAGE) as u32, values)
                .await?;
        }
        Ok(())
    }

    async fn read_calibration(&self, page: u32, column: u32) -> Result<Vec<u32>> {
        let registers = self.read_register_column(page, column).await?;
        registers.into_iter().map(codec::validate).collect()
    }
}

#[async_trait]
impl FpncCommands for ProVideoFpnc {
    fn geometry(&self) -> FpncGeometry {
        self.geometry
    }

    async fn fpnc_enabled(&self) -> Result<bool> {
        self.channel.get_flag(&cmd::FPNC_ENABLE).await
    }

    async fn set_fpnc_enabled(&self, on: bool) -> Result<()> {
        self.channel.set_flag(&cmd::FPNC_ENABLE, on).await
    }

    async fn inversion(&self) -> Result<bool> {
        self.channel.get_flag(&cmd::FPNC_INVERSION).await
    }

    async fn set_inversion(&self, on: bool) -> Result<()> {
        self.channel.set_flag(&cmd::FPNC_INVERSION, on).await
    }

    async fn gains(&self) -> Result<FpncGains> {
        let [even, odd] = self.channel.get_array::<2>(&cmd::FPNC_GAINS).await?;
        Ok(FpncGains {
            even: narrow(even, "fpnc_gains")?,
            odd: narrow(odd, "fpnc_gains")?,
        })
    }

    async fn set_gains(&self, gains: FpncGains) -> Result<()> {
        self.channel
            .set(
                &cmd::FPNC_GAINS,
                &[i64::from(gains.even), i64::from(gains.odd)],
            )
            .await
    }

    async fn read_page(&self, page: u32, column: u32, offset: u32) -> Result<[u32; 4]> {
        self.check_address(column, offset)?;
        let address = [i64::from(page), i64::from(column), i64::from(offset)];
        let values = self.channel.get_at(&cmd::FPNC_DATA, &address).await?;
        if values.len() != PAGE {
            return Err(Error::Malformed(format!(
                "fpnc_data: expected {PAGE} values, got {}",
                values.len()
            )));
        }
        let mut page_values = [0u32; PAGE];
        for (slot, value) in page_values.iter_mut().zip(values) {
            *slot = narrow(value, "fpnc_data")?;
        }
        Ok(page_values)
    }

    async fn write_page(
        &self,
        page: u32,
        column: u32,
        offset: u32,
        values: [u32; 4],
    ) -> Result<()> {
        self.check_address(column, offset)?;
        let address = [i64::from(page), i64::from(column), i64::from(offset)];
        self.channel
            .set_at(&cmd::FPNC_DATA, &address, &values.map(i64::from))
            .await
    }

    async fn correction_column(&self, column: usize) -> Result<Vec<i32>> {
        if column >= self.geometry.width {
            return Ok(vec![0; self.geometry.no_samples]);
        }
        let registers = self
            .read_register_column(cmd::CORRECTION_PAGE, (column / 2) as u32)
            .await?;
        let (mask, shift) = codec::field_for(column);
        let samples: Vec<i32> = registers
            .iter()
            .map(|raw| codec::correction_value(*raw, mask, shift))
            .collect();
        Ok(codec::uncompress(&samples))
    }

    async fn calibration_columns(&self, column: usize) -> Result<(Vec<u32>, Vec<u32>)> {
        let samples = self.geometry.no_samples;
        if column >= self.register_columns() {
            return Ok((vec![0; samples], vec![0; samples]));
        }
        let column = column as u32;

        if self.legacy_calibration_pages {
            // Both pages are read into the even column, so page 1 replaces page 0.
            self.read_calibration(cmd::CALIBRATION_PAGE_EVEN, column)
                .await?;
            let data0 = self
                .read_calibration(cmd::CALIBRATION_PAGE_ODD, column)
                .await?;
            return Ok((data0, vec![0; samples]));
        }

        let data0 = self
            .read_calibration(cmd::CALIBRATION_PAGE_EVEN, column)
            .await?;
        let data1 = self
            .read_calibration(cmd::CALIBRATION_PAGE_ODD, column)
            .await?;
        Ok((data0, data1))
    }

    async fn download(&self) -> Result<FpncData> {
        let FpncGeometry { width, no_samples } = self.geometry;
        debug!(width, no_samples, "downloading FPNC table");
        let mut table = Vec::with_capacity(self.register_columns() * no_samples);
        for column in 0..self.register_columns() {
            let registers = self
                .read_register_column(cmd::CORRECTION_PAGE, column as u32)
                .await?;
            table.extend(registers);
        }
        FpncData::from_raw(width, no_samples, table)
    }

    async fn upload(&self, data: &FpncData) -> Result<()> {
        let FpncGeometry { width, no_samples } = self.geometry;
        if data.width() != width || data.no_samples() != no_samples {
            return Err(Error::InvalidArgument(format!(
                "FPNC table is {}x{}, device expects {width}x{no_samples}",
                data.width(),
                data.no_samples()
            )));
        }
        if !data.has_data() {
            return Err(Error::InvalidArgument("FPNC table holds no data".into()));
        }
        for (column, registers) in data.raw().chunks(no_samples).enumerate() {
            self.write_register_column(cmd::CORRECTION_PAGE, column as u32, registers)
                .await?;
        }
        info!(width, no_samples, "uploaded FPNC table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provideo_core::error::errno;
    use provideo_protocol::EngineConfig;
    use provideo_test_harness::MockTransport;
    use std::time::Duration;

    const SMALL: FpncGeometry = FpncGeometry {
        width: 4,
        no_samples: 6,
    };

    fn make_fpnc(mock: MockTransport, geometry: FpncGeometry) -> ProVideoFpnc {
        let config = EngineConfig {
            command_timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(5),
            ..EngineConfig::default()
        };
        ProVideoFpnc::new(Arc::new(Channel::new(Box::new(mock), config)), geometry)
    }

    fn page_reply(values: [u32; 4]) -> Vec<u8> {
        format!(
            "fpnc_data {:#010x} {:#010x} {:#010x} {:#010x}\nOK\n",
            values[0], values[1], values[2], values[3]
        )
        .into_bytes()
    }

    // ---------------------------------------------------------------
    // Scalars
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn enable_inversion_gains() {
        let mut mock = MockTransport::new();
        mock.expect(b"fpnc_enable 1\n", b"OK\n");
        mock.expect(b"fpnc_inversion\n", b"fpnc_inversion 0\nOK\n");
        mock.expect(b"fpnc_gains\n", b"fpnc_gains 256 260\nOK\n");
        mock.expect(b"fpnc_gains 100 101\n", b"OK\n");
        let fpnc = make_fpnc(mock, SMALL);

        fpnc.set_fpnc_enabled(true).await.unwrap();
        assert!(!fpnc.inversion().await.unwrap());
        assert_eq!(
            fpnc.gains().await.unwrap(),
            FpncGains { even: 256, odd: 260 }
        );
        fpnc.set_gains(FpncGains { even: 100, odd: 101 })
            .await
            .unwrap();
    }

    // ---------------------------------------------------------------
    // Pages
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn read_page_hex() {
        let mut mock = MockTransport::new();
        mock.expect(
            b"fpnc_data 2 1 4\n",
            b"fpnc_data 0x00000001 0x00fff000 0x00000fff 0x00000000\nOK\n",
        );
        let fpnc = make_fpnc(mock, SMALL);

        assert_eq!(
            fpnc.read_page(2, 1, 4).await.unwrap(),
            [1, 0x00FF_F000, 0xFFF, 0]
        );
    }

    #[tokio::test]
    async fn write_page_renders_hex() {
        let mut mock = MockTransport::new();
        mock.expect(
            b"fpnc_data 2 0 0 0x00000001 0x00fff000 0x00000fff 0x00000000\n",
            b"OK\n",
        );
        let fpnc = make_fpnc(mock, SMALL);

        fpnc.write_page(2, 0, 0, [1, 0x00FF_F000, 0xFFF, 0])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn page_address_is_validated() {
        let fpnc = make_fpnc(MockTransport::new(), SMALL);

        let err = fpnc.read_page(2, 2, 0).await.unwrap_err();
        assert_eq!(err.errno(), -errno::EINVAL);
        let err = fpnc.write_page(2, 0, 6, [0; 4]).await.unwrap_err();
        assert_eq!(err.errno(), -errno::EINVAL);
    }

    // ---------------------------------------------------------------
    // Columns
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn correction_column_decodes_odd_field() {
        let geometry = FpncGeometry {
            width: 2,
            no_samples: 16,
        };
        let mut mock = MockTransport::new();
        // Odd sub-field of every register is 1; even sub-field is -1.
        let raw = 0x0000_1FFF;
        for offset in [0, 4, 8, 12] {
            mock.expect(
                format!("fpnc_data 2 0 {offset}\n").as_bytes(),
                &page_reply([raw; 4]),
            );
        }
        let fpnc = make_fpnc(mock, geometry);

        assert_eq!(
            fpnc.correction_column(1).await.unwrap(),
            vec![1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 4, 4, 8, 8, 16, 16]
        );
    }

    #[tokio::test]
    async fn correction_column_out_of_range_is_zero() {
        let fpnc = make_fpnc(MockTransport::new(), SMALL);

        assert_eq!(fpnc.correction_column(4).await.unwrap(), vec![0; 6]);
    }

    #[tokio::test]
    async fn partial_last_page_is_truncated() {
        let mut mock = MockTransport::new();
        mock.expect(b"fpnc_data 2 1 0\n", &page_reply([1, 2, 3, 4]));
        mock.expect(b"fpnc_data 2 1 4\n", &page_reply([5, 6, 0, 0]));
        let fpnc = make_fpnc(mock, SMALL);

        assert_eq!(fpnc.correction_column(2).await.unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn calibration_pages() {
        let mut mock = MockTransport::new();
        mock.expect(b"fpnc_data 0 1 0\n", &page_reply([1, 2, 3, 4]));
        mock.expect(b"fpnc_data 0 1 4\n", &page_reply([5, 6, 0, 0]));
        mock.expect(b"fpnc_data 1 1 0\n", &page_reply([7, 8, 9, 10]));
        mock.expect(b"fpnc_data 1 1 4\n", &page_reply([0x00FF_FFFF, 12, 0, 0]));
        let fpnc = make_fpnc(mock, SMALL);

        let (even, odd) = fpnc.calibration_columns(1).await.unwrap();
        assert_eq!(even, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(odd, vec![7, 8, 9, 10, 0x00FF_FFFF, 12]);
    }

    #[tokio::test]
    async fn legacy_calibration_pages_overwrite_even_column() {
        let mut mock = MockTransport::new();
        mock.expect(b"fpnc_data 0 0 0\n", &page_reply([1, 2, 3, 4]));
        mock.expect(b"fpnc_data 0 0 4\n", &page_reply([5, 6, 0, 0]));
        mock.expect(b"fpnc_data 1 0 0\n", &page_reply([7, 8, 9, 10]));
        mock.expect(b"fpnc_data 1 0 4\n", &page_reply([11, 12, 0, 0]));
        let fpnc = make_fpnc(mock, SMALL).with_legacy_calibration_pages(true);

        let (even, odd) = fpnc.calibration_columns(0).await.unwrap();
        assert_eq!(even, vec![7, 8, 9, 10, 11, 12]);
        assert_eq!(odd, vec![0; 6]);
    }

    #[tokio::test]
    async fn calibration_top_byte_is_rejected() {
        let mut mock = MockTransport::new();
        mock.expect(b"fpnc_data 0 0 0\n", &page_reply([1, 0x0100_0000, 0, 0]));
        mock.expect(b"fpnc_data 0 0 4\n", &page_reply([0; 4]));
        let fpnc = make_fpnc(mock, SMALL);

        let err = fpnc.calibration_columns(0).await.unwrap_err();
        assert_eq!(err.errno(), -errno::EINVAL);
    }

    // ---------------------------------------------------------------
    // Whole table
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn download_reads_every_register_column() {
        let mut mock = MockTransport::new();
        mock.expect(b"fpnc_data 2 0 0\n", &page_reply([1, 2, 3, 4]));
        mock.expect(b"fpnc_data 2 0 4\n", &page_reply([5, 6, 0, 0]));
        mock.expect(b"fpnc_data 2 1 0\n", &page_reply([7, 8, 9, 10]));
        mock.expect(b"fpnc_data 2 1 4\n", &page_reply([11, 12, 0, 0]));
        let fpnc = make_fpnc(mock, SMALL);

        let data = fpnc.download().await.unwrap();
        assert!(data.has_data());
        assert_eq!(data.raw(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[tokio::test]
    async fn upload_pads_last_page() {
        let table: Vec<u32> = (1..=12).collect();
        let data = FpncData::from_raw(4, 6, table).unwrap();
        let mut mock = MockTransport::new();
        for request in [
            "fpnc_data 2 0 0 0x00000001 0x00000002 0x00000003 0x00000004\n",
            "fpnc_data 2 0 4 0x00000005 0x00000006 0x00000000 0x00000000\n",
            "fpnc_data 2 1 0 0x00000007 0x00000008 0x00000009 0x0000000a\n",
            "fpnc_data 2 1 4 0x0000000b 0x0000000c 0x00000000 0x00000000\n",
        ] {
            mock.expect(request.as_bytes(), b"OK\n");
        }
        let fpnc = make_fpnc(mock, SMALL);

        fpnc.upload(&data).await.unwrap();
    }

    #[tokio::test]
    async fn upload_rejects_wrong_geometry() {
        let data = FpncData::from_raw(2, 6, vec![0; 6]).unwrap();
        let fpnc = make_fpnc(MockTransport::new(), SMALL);

        let err = fpnc.upload(&data).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn upload_rejects_empty_table() {
        let data = FpncData::new(4, 6).unwrap();
        let fpnc = make_fpnc(MockTransport::new(), SMALL);

        assert!(matches!(
            fpnc.upload(&data).await,
            Err(Error::InvalidArgument(_))
        ));
    }
}
