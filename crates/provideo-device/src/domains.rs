//! Command domain traits.
//!
//! Each trait is the driver table of one subsystem of a ProVideo device.
//! A device family implements every domain it supports once; a
//! [`ProVideoDevice`](crate::ProVideoDevice) holds one registered table per
//! domain and hands out `&dyn` references to it.
//!
//! All methods are `async` because they talk to the device over the
//! serial line. Values are validated before anything is sent: an
//! out-of-range argument fails with
//! [`Error::InvalidArgument`](provideo_core::Error::InvalidArgument), while
//! a device value outside its type is
//! [`Error::Malformed`](provideo_core::Error::Malformed).

use async_trait::async_trait;

use provideo_core::error::Result;
use provideo_core::types::*;
use provideo_fpnc::FpncData;

/// Identity, housekeeping and persistence of a device.
#[async_trait]
pub trait SystemCommands: Send + Sync {
    /// Device identifier burnt in at the factory.
    async fn device_id(&self) -> Result<u32>;

    /// Operating time in seconds.
    async fn runtime(&self) -> Result<u32>;

    async fn temperatures(&self) -> Result<Temperatures>;

    /// Fan speed in percent.
    async fn fan_speed(&self) -> Result<u32>;

    /// Current operating mode. Switching modes can take many seconds.
    async fn device_mode(&self) -> Result<u32>;
    async fn set_device_mode(&self, mode: u32) -> Result<()>;

    async fn debug_level(&self) -> Result<u32>;
    async fn set_debug_level(&self, level: u32) -> Result<()>;

    /// Persist the current settings.
    async fn save_settings(&self) -> Result<()>;
    /// Restore the persisted settings.
    async fn load_settings(&self) -> Result<()>;
    /// Restore factory settings.
    async fn reset_settings(&self) -> Result<()>;
    async fn reboot(&self) -> Result<()>;

    /// Devices answering on the RS485 chain.
    async fn device_list(&self) -> Result<Vec<DeviceEntry>>;
}

/// Auto exposure and auto white balance.
#[async_trait]
pub trait AutoCommands: Send + Sync {
    async fn aec_enabled(&self) -> Result<bool>;
    async fn set_aec_enabled(&self, on: bool) -> Result<()>;

    async fn aec_setup(&self) -> Result<AecSetup>;
    async fn set_aec_setup(&self, setup: AecSetup) -> Result<()>;

    async fn aec_status(&self) -> Result<AecStatus>;

    /// The metering weight grid, row-major.
    async fn aec_weights(&self) -> Result<Vec<u8>>;
    /// Set the weight of one grid cell (`index` starts at 1).
    async fn set_aec_weight(&self, index: u32, weight: u8) -> Result<()>;

    async fn awb_enabled(&self) -> Result<bool>;
    async fn set_awb_enabled(&self, on: bool) -> Result<()>;

    async fn awb_speed(&self) -> Result<u32>;
    async fn set_awb_speed(&self, speed: u32) -> Result<()>;

    async fn wb_preset(&self) -> Result<u32>;
    async fn set_wb_preset(&self, preset: u32) -> Result<()>;
}

/// Video output chain: mode, genlock, flip and SDI levels.
#[async_trait]
pub trait ChainCommands: Send + Sync {
    async fn video_mode(&self) -> Result<u32>;
    async fn set_video_mode(&self, mode: u32) -> Result<()>;

    async fn genlock_mode(&self) -> Result<GenlockMode>;
    async fn set_genlock_mode(&self, mode: GenlockMode) -> Result<()>;

    async fn genlock_offset(&self) -> Result<GenlockOffset>;
    async fn set_genlock_offset(&self, offset: GenlockOffset) -> Result<()>;

    async fn genlock_termination(&self) -> Result<bool>;
    async fn set_genlock_termination(&self, on: bool) -> Result<()>;

    async fn flip_mode(&self) -> Result<FlipMode>;
    async fn set_flip_mode(&self, mode: FlipMode) -> Result<()>;

    async fn sdi_range(&self) -> Result<SdiRange>;
    async fn set_sdi_range(&self, range: SdiRange) -> Result<()>;

    async fn sdi_black(&self) -> Result<i32>;
    async fn set_sdi_black(&self, level: i32) -> Result<()>;

    async fn sdi_white(&self) -> Result<i32>;
    async fn set_sdi_white(&self, level: i32) -> Result<()>;
}

/// Image signal processing: gains, levels and colour correction.
#[async_trait]
pub trait IspCommands: Send + Sync {
    async fn gain(&self, component: ColorComponent) -> Result<u32>;
    async fn set_gain(&self, component: ColorComponent, gain: u32) -> Result<()>;

    async fn black_level(&self) -> Result<Rgb<i32>>;
    async fn set_black_level(&self, level: Rgb<i32>) -> Result<()>;

    async fn flare(&self) -> Result<Rgb<u32>>;
    async fn set_flare(&self, flare: Rgb<u32>) -> Result<()>;

    async fn color_matrix(&self) -> Result<ColorMatrix>;
    async fn set_color_matrix(&self, matrix: ColorMatrix) -> Result<()>;

    async fn color_offset(&self) -> Result<Rgb<i32>>;
    async fn set_color_offset(&self, offset: Rgb<i32>) -> Result<()>;

    async fn bayer_pattern(&self) -> Result<BayerPattern>;
    async fn set_bayer_pattern(&self, pattern: BayerPattern) -> Result<()>;
}

/// Lookup tables (gamma).
///
/// Samples are written through a write-index register: set the index
/// once, then every write stores a sample and advances the index.
#[async_trait]
pub trait LutCommands: Send + Sync {
    async fn lut_enabled(&self) -> Result<bool>;
    async fn set_lut_enabled(&self, on: bool) -> Result<()>;

    async fn lut_mode(&self) -> Result<u32>;
    async fn set_lut_mode(&self, mode: u32) -> Result<()>;

    async fn lut_preset(&self) -> Result<u32>;
    async fn set_lut_preset(&self, preset: u32) -> Result<()>;

    async fn write_index(&self) -> Result<u32>;
    async fn set_write_index(&self, index: u32) -> Result<()>;

    /// Store one sample at the write index.
    async fn write_sample(&self, component: ColorComponent, value: u16) -> Result<()>;
    /// Store consecutive samples starting at `start`.
    async fn write_table(&self, component: ColorComponent, start: u32, samples: &[u16])
    -> Result<()>;
    async fn read_sample(&self, component: ColorComponent, index: u32) -> Result<u16>;

    /// Restore the default tables.
    async fn reset(&self) -> Result<()>;

    /// Fixed gamma in hundredths (220 = 2.2).
    async fn fixed_gamma(&self) -> Result<u32>;
    async fn set_fixed_gamma(&self, gamma: u32) -> Result<()>;
}

/// Recording and playback of the frame buffer.
#[async_trait]
pub trait PlaybackCommands: Send + Sync {
    async fn play(&self) -> Result<()>;
    async fn stop(&self) -> Result<()>;
    async fn record(&self) -> Result<()>;
    async fn pause(&self) -> Result<()>;

    async fn buffer_info(&self) -> Result<BufferInfo>;

    async fn buffer(&self) -> Result<u32>;
    async fn select_buffer(&self, buffer: u32) -> Result<()>;

    async fn play_mode(&self) -> Result<PlayMode>;
    async fn set_play_mode(&self, mode: PlayMode) -> Result<()>;

    /// Current frame within the selected buffer.
    async fn position(&self) -> Result<u32>;
    async fn set_position(&self, frame: u32) -> Result<()>;

    /// Frames recorded so far in the running recording.
    async fn record_status(&self) -> Result<u32>;
}

/// Fixed pattern noise correction.
#[async_trait]
pub trait FpncCommands: Send + Sync {
    fn geometry(&self) -> FpncGeometry;

    async fn fpnc_enabled(&self) -> Result<bool>;
    async fn set_fpnc_enabled(&self, on: bool) -> Result<()>;

    async fn inversion(&self) -> Result<bool>;
    async fn set_inversion(&self, on: bool) -> Result<()>;

    async fn gains(&self) -> Result<FpncGains>;
    async fn set_gains(&self, gains: FpncGains) -> Result<()>;

    /// Four registers at `offset` of register column `column` on `page`.
    async fn read_page(&self, page: u32, column: u32, offset: u32) -> Result<[u32; 4]>;
    async fn write_page(&self, page: u32, column: u32, offset: u32, values: [u32; 4])
    -> Result<()>;

    /// Decoded correction samples of a physical column, read from the device.
    async fn correction_column(&self, column: usize) -> Result<Vec<i32>>;

    /// Calibration values of the two physical columns sharing register
    /// column `column` (even column first).
    async fn calibration_columns(&self, column: usize) -> Result<(Vec<u32>, Vec<u32>)>;

    /// Read the whole correction table.
    async fn download(&self) -> Result<FpncData>;

    /// Write a correction table to the device.
    async fn upload(&self, data: &FpncData) -> Result<()>;
}
