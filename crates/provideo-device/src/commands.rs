//! ProVideo command tables.
//!
//! Every command the device drivers issue is declared here as a `const`
//! [`CommandDescriptor`] or [`ListDescriptor`], grouped by domain. The
//! driver modules only compose these with the engine; no command string
//! appears anywhere else.
//!
//! # Wire format
//!
//! A query is the bare command (`gain_red\n`) and is answered by a value
//! line that repeats the command followed by its fields, then a status line:
//!
//! ```text
//! gain_red 512
//! OK
//! ```
//!
//! A write appends the fields to the command (`gain_red 600\n`) and is
//! answered by `OK` or `FAILED <reason>`. Addressed reads append the
//! address to the request (`lut_read_red 17\n`, `fpnc_data 0 12 8\n`); the
//! value line still repeats only the command.

use std::time::Duration;

use provideo_protocol::{CommandDescriptor, ListDescriptor};

/// Timeout for commands that switch the video pipeline.
const MODE_SWITCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for commands that touch the settings flash.
const FLASH_TIMEOUT: Duration = Duration::from_secs(5);

/// Retries for status values that are briefly unavailable while the
/// device updates them.
const JITTER_RETRIES: u32 = 10;

// ---------------------------------------------------------------
// System
// ---------------------------------------------------------------

pub mod system {
    use super::*;

    pub const DEVICE_ID: CommandDescriptor =
        CommandDescriptor::new("device_id", "device_id ", 1).hex();
    pub const RUNTIME: CommandDescriptor = CommandDescriptor::new("runtime", "runtime ", 1);
    /// Board and sensor temperature.
    pub const TEMP: CommandDescriptor = CommandDescriptor::new("temp", "temp ", 2);
    pub const FAN_SPEED: CommandDescriptor = CommandDescriptor::new("fan_speed", "fan_speed ", 1);
    pub const DEVICE_MODE: CommandDescriptor =
        CommandDescriptor::new("device_mode", "device_mode ", 1).with_timeout(MODE_SWITCH_TIMEOUT);
    pub const DEBUG_LEVEL: CommandDescriptor =
        CommandDescriptor::new("debug_level", "debug_level ", 1);

    pub const SAVE_SETTINGS: CommandDescriptor =
        CommandDescriptor::action("save_settings").with_timeout(FLASH_TIMEOUT);
    pub const LOAD_SETTINGS: CommandDescriptor =
        CommandDescriptor::action("load_settings").with_timeout(FLASH_TIMEOUT);
    pub const RESET_SETTINGS: CommandDescriptor =
        CommandDescriptor::action("reset_settings").with_timeout(FLASH_TIMEOUT);
    pub const REBOOT: CommandDescriptor =
        CommandDescriptor::action("reboot").with_timeout(FLASH_TIMEOUT);

    /// Upper bound on devices on one RS485 chain.
    pub const MAX_DEVICES: usize = 32;

    /// Discovery roster: `id: <index> <address> <type> <serial>`.
    ///
    /// Devices answer in turn and the roster has no terminator, so the list
    /// ends once the bus has been quiet for a while.
    pub const DEVICE_LIST: ListDescriptor =
        ListDescriptor::open_ended("get_device_list", "id: ", 4, MAX_DEVICES)
            .with_inactivity(Duration::from_secs(3));
}

// ---------------------------------------------------------------
// Auto exposure / white balance
// ---------------------------------------------------------------

pub mod auto {
    use super::*;

    pub const AEC_ENABLE: CommandDescriptor =
        CommandDescriptor::new("aec_enable", "aec_enable ", 1);
    /// `setpoint speed tolerance max_integration`.
    pub const AEC_SETUP: CommandDescriptor = CommandDescriptor::new("aec_setup", "aec_setup ", 4);
    /// `gain integration exposure`, refreshed by the control loop.
    pub const AEC_STATUS: CommandDescriptor =
        CommandDescriptor::new("aec_status", "aec_status ", 3).with_retries(JITTER_RETRIES);

    /// Cells of the 5×5 metering grid.
    pub const WEIGHT_CELLS: usize = 25;
    /// Largest weight of one cell.
    pub const MAX_WEIGHT: u8 = 15;

    /// Metering grid: `weight: <index> <weight>`.
    pub const AEC_WEIGHTS: ListDescriptor =
        ListDescriptor::fixed("aec_weights", "weight: ", 2, WEIGHT_CELLS);
    /// `aec_weight <index> <weight>`.
    pub const AEC_WEIGHT: CommandDescriptor =
        CommandDescriptor::new("aec_weight", "aec_weight ", 2);

    pub const AWB_ENABLE: CommandDescriptor =
        CommandDescriptor::new("awb_enable", "awb_enable ", 1);
    pub const AWB_SPEED: CommandDescriptor = CommandDescriptor::new("awb_speed", "awb_speed ", 1);
    pub const WB_PRESET: CommandDescriptor = CommandDescriptor::new("wb_preset", "wb_preset ", 1);
}

// ---------------------------------------------------------------
// Video chain
// ---------------------------------------------------------------

pub mod chain {
    use super::*;

    pub const VIDEO_MODE: CommandDescriptor =
        CommandDescriptor::new("video_mode", "video_mode ", 1).with_timeout(MODE_SWITCH_TIMEOUT);
    pub const GENLOCK_MODE: CommandDescriptor =
        CommandDescriptor::new("genlock_mode", "genlock_mode ", 1);
    /// `vertical horizontal`.
    pub const GENLOCK_OFFSET: CommandDescriptor =
        CommandDescriptor::new("genlock_offset", "genlock_offset ", 2);
    pub const GENLOCK_TERMINATION: CommandDescriptor =
        CommandDescriptor::new("genlock_termination", "genlock_termination ", 1);
    pub const FLIP_MODE: CommandDescriptor = CommandDescriptor::new("flip_mode", "flip_mode ", 1);
    pub const SDI_RANGE: CommandDescriptor = CommandDescriptor::new("sdi_range", "sdi_range ", 1);
    pub const SDI_BLACK: CommandDescriptor = CommandDescriptor::new("sdi_black", "sdi_black ", 1);
    pub const SDI_WHITE: CommandDescriptor = CommandDescriptor::new("sdi_white", "sdi_white ", 1);
}

// ---------------------------------------------------------------
// ISP
// ---------------------------------------------------------------

pub mod isp {
    use super::*;

    use provideo_core::types::ColorComponent;

    pub const GAIN_RED: CommandDescriptor = CommandDescriptor::new("gain_red", "gain_red ", 1);
    pub const GAIN_GREEN: CommandDescriptor =
        CommandDescriptor::new("gain_green", "gain_green ", 1);
    pub const GAIN_BLUE: CommandDescriptor = CommandDescriptor::new("gain_blue", "gain_blue ", 1);

    /// The gain command of a colour component.
    pub fn gain(component: ColorComponent) -> &'static CommandDescriptor {
        match component {
            ColorComponent::Red => &GAIN_RED,
            ColorComponent::Green => &GAIN_GREEN,
            ColorComponent::Blue => &GAIN_BLUE,
        }
    }

    pub const BLACK_LEVEL: CommandDescriptor =
        CommandDescriptor::new("black_level", "black_level ", 3);
    pub const FLARE: CommandDescriptor = CommandDescriptor::new("flare", "flare ", 3);
    /// Nine coefficients, row-major.
    pub const CC_MATRIX: CommandDescriptor = CommandDescriptor::new("cc_matrix", "cc_matrix ", 9);
    pub const CC_OFFSET: CommandDescriptor = CommandDescriptor::new("cc_offset", "cc_offset ", 3);
    pub const BAYER_PATTERN: CommandDescriptor =
        CommandDescriptor::new("bayer_pattern", "bayer_pattern ", 1);
}

// ---------------------------------------------------------------
// LUT
// ---------------------------------------------------------------

pub mod lut {
    use super::*;

    use provideo_core::types::ColorComponent;

    /// Largest LUT sample (12 bit).
    pub const MAX_SAMPLE: u16 = 4095;

    pub const LUT_ENABLE: CommandDescriptor =
        CommandDescriptor::new("lut_enable", "lut_enable ", 1);
    pub const LUT_MODE: CommandDescriptor = CommandDescriptor::new("lut_mode", "lut_mode ", 1);
    pub const LUT_PRESET: CommandDescriptor =
        CommandDescriptor::new("lut_preset", "lut_preset ", 1);
    pub const LUT_WRITE_INDEX: CommandDescriptor =
        CommandDescriptor::new("lut_write_index", "lut_write_index ", 1);

    pub const LUT_WRITE_RED: CommandDescriptor =
        CommandDescriptor::new("lut_write_red", "lut_write_red ", 1);
    pub const LUT_WRITE_GREEN: CommandDescriptor =
        CommandDescriptor::new("lut_write_green", "lut_write_green ", 1);
    pub const LUT_WRITE_BLUE: CommandDescriptor =
        CommandDescriptor::new("lut_write_blue", "lut_write_blue ", 1);

    pub const LUT_READ_RED: CommandDescriptor =
        CommandDescriptor::new("lut_read_red", "lut_read_red ", 1);
    pub const LUT_READ_GREEN: CommandDescriptor =
        CommandDescriptor::new("lut_read_green", "lut_read_green ", 1);
    pub const LUT_READ_BLUE: CommandDescriptor =
        CommandDescriptor::new("lut_read_blue", "lut_read_blue ", 1);

    pub fn write(component: ColorComponent) -> &'static CommandDescriptor {
        match component {
            ColorComponent::Red => &LUT_WRITE_RED,
            ColorComponent::Green => &LUT_WRITE_GREEN,
            ColorComponent::Blue => &LUT_WRITE_BLUE,
        }
    }

    pub fn read(component: ColorComponent) -> &'static CommandDescriptor {
        match component {
            ColorComponent::Red => &LUT_READ_RED,
            ColorComponent::Green => &LUT_READ_GREEN,
            ColorComponent::Blue => &LUT_READ_BLUE,
        }
    }

    pub const LUT_RESET: CommandDescriptor = CommandDescriptor::action("lut_reset");
    pub const LUT_FIXED_GAMMA: CommandDescriptor =
        CommandDescriptor::new("lut_fixed_gamma", "lut_fixed_gamma ", 1);
}

// ---------------------------------------------------------------
// Playback
// ---------------------------------------------------------------

pub mod playback {
    use super::*;

    pub const PLAY: CommandDescriptor = CommandDescriptor::action("play");
    pub const STOP: CommandDescriptor = CommandDescriptor::action("stop");
    pub const RECORD: CommandDescriptor = CommandDescriptor::action("record");
    pub const PAUSE: CommandDescriptor = CommandDescriptor::action("pause");

    /// `buffers frames_per_buffer`.
    pub const BUFFER_INFO: CommandDescriptor =
        CommandDescriptor::new("buffer_info", "buffer_info ", 2);
    pub const BUFFER_SELECT: CommandDescriptor =
        CommandDescriptor::new("buffer_select", "buffer_select ", 1);
    pub const PLAY_MODE: CommandDescriptor = CommandDescriptor::new("play_mode", "play_mode ", 1);
    pub const PLAY_POSITION: CommandDescriptor =
        CommandDescriptor::new("play_position", "play_position ", 1);
    pub const RECORD_STATUS: CommandDescriptor =
        CommandDescriptor::new("record_status", "record_status ", 1).with_retries(JITTER_RETRIES);
}

// ---------------------------------------------------------------
// FPNC
// ---------------------------------------------------------------

pub mod fpnc {
    use super::*;

    /// Registers transferred per `fpnc_data` exchange.
    pub const VALUES_PER_PAGE: usize = 4;

    /// Page holding the packed correction samples.
    pub const CORRECTION_PAGE: u32 = 2;
    /// Page holding the calibration values of even columns.
    pub const CALIBRATION_PAGE_EVEN: u32 = 0;
    /// Page holding the calibration values of odd columns.
    pub const CALIBRATION_PAGE_ODD: u32 = 1;

    pub const FPNC_ENABLE: CommandDescriptor =
        CommandDescriptor::new("fpnc_enable", "fpnc_enable ", 1);
    pub const FPNC_INVERSION: CommandDescriptor =
        CommandDescriptor::new("fpnc_inversion", "fpnc_inversion ", 1);
    /// `even odd`.
    pub const FPNC_GAINS: CommandDescriptor =
        CommandDescriptor::new("fpnc_gains", "fpnc_gains ", 2);

    /// `fpnc_data <page> <column> <offset> [v0 v1 v2 v3]`, values in hex.
    pub const FPNC_DATA: CommandDescriptor =
        CommandDescriptor::new("fpnc_data", "fpnc_data ", VALUES_PER_PAGE).hex();
}
