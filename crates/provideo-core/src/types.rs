//! Core types used throughout provideo.
//!
//! These are the typed values the command domains exchange with callers.
//! The wire protocol only carries integers; the conversions between those
//! integers and the types here live next to each type (`code()` and
//! `TryFrom<i64>`), so every domain table decodes a device value the same
//! way.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A red/green/blue triple (gains, black levels, flare, offsets).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb<T> {
    pub red: T,
    pub green: T,
    pub blue: T,
}

impl<T: Copy> Rgb<T> {
    /// Create a triple from its three components.
    pub fn new(red: T, green: T, blue: T) -> Self {
        Rgb { red, green, blue }
    }

    /// Components in wire order (red, green, blue).
    pub fn to_array(&self) -> [T; 3] {
        [self.red, self.green, self.blue]
    }

    /// Build a triple from components in wire order.
    pub fn from_array(values: [T; 3]) -> Self {
        Rgb::new(values[0], values[1], values[2])
    }
}

impl<T: fmt::Display> fmt::Display for Rgb<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R={} G={} B={}", self.red, self.green, self.blue)
    }
}

/// A 3×3 colour conversion matrix in the device's fixed-point format,
/// row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorMatrix(pub [i32; 9]);

impl ColorMatrix {
    /// Coefficient at `row`, `col` (both `0..3`).
    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.0[row * 3 + col]
    }
}

impl fmt::Display for ColorMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.0.chunks(3).enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{} {} {}", row[0], row[1], row[2])?;
        }
        Ok(())
    }
}

/// Defines a fieldless enum that travels over the wire as an integer code.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $code:literal => $text:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Integer code used on the wire.
            pub fn code(&self) -> i64 {
                match self {
                    $( $name::$variant => $code, )+
                }
            }

            /// All variants, in code order.
            pub fn all() -> &'static [$name] {
                &[ $( $name::$variant, )+ ]
            }
        }

        impl TryFrom<i64> for $name {
            type Error = Error;

            fn try_from(code: i64) -> Result<Self, Error> {
                match code {
                    $( $code => Ok($name::$variant), )+
                    other => Err(Error::Malformed(format!(
                        concat!("unknown ", $what, " code {}"),
                        other
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let s = match self {
                    $( $name::$variant => $text, )+
                };
                write!(f, "{s}")
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Error> {
                $(
                    if s.eq_ignore_ascii_case($text) {
                        return Ok($name::$variant);
                    }
                )+
                Err(Error::InvalidArgument(format!(
                    concat!("unknown ", $what, ": {}"),
                    s
                )))
            }
        }
    };
}

wire_enum! {
    /// Colour component addressed by per-channel commands (gains, LUTs).
    ColorComponent, "colour component" {
        Red = 0 => "red",
        Green = 1 => "green",
        Blue = 2 => "blue",
    }
}

impl ColorComponent {
    /// Component name as used in command names (`gain_red`, `lut_read_red`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            ColorComponent::Red => "red",
            ColorComponent::Green => "green",
            ColorComponent::Blue => "blue",
        }
    }
}

wire_enum! {
    /// Genlock synchronisation mode.
    GenlockMode, "genlock mode" {
        /// Free-running, genlock input ignored.
        Disabled = 0 => "disabled",
        /// Lock to the reference when present, free-run otherwise.
        SlaveAuto = 1 => "slave-auto",
        /// Always lock to the reference.
        SlaveForce = 2 => "slave-force",
        /// Drive the reference for other devices in the chain.
        Master = 3 => "master",
    }
}

wire_enum! {
    /// SDI output signal range.
    SdiRange, "SDI range" {
        Legal = 0 => "legal",
        Extended = 1 => "extended",
    }
}

wire_enum! {
    /// Image flip applied by the video chain.
    FlipMode, "flip mode" {
        Off = 0 => "off",
        Vertical = 1 => "vertical",
        Horizontal = 2 => "horizontal",
        Rotated = 3 => "rotated",
    }
}

wire_enum! {
    /// How the playback engine walks through a recorded buffer.
    PlayMode, "play mode" {
        Once = 0 => "once",
        Loop = 1 => "loop",
        PingPong = 2 => "ping-pong",
    }
}

wire_enum! {
    /// Sensor colour filter arrangement reported by the ISP.
    BayerPattern, "bayer pattern" {
        Rggb = 0 => "rggb",
        Grbg = 1 => "grbg",
        Gbrg = 2 => "gbrg",
        Bggr = 3 => "bggr",
    }
}

/// Auto-exposure control parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AecSetup {
    /// Target mean luminance.
    pub setpoint: u32,
    /// Control loop speed.
    pub speed: u32,
    /// Tolerance band around the setpoint before the loop reacts.
    pub tolerance: u32,
    /// Upper bound for the integration time in microseconds.
    pub max_integration_us: u32,
}

/// Snapshot of the auto-exposure loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AecStatus {
    pub gain: u32,
    pub integration_us: u32,
    pub exposure: u32,
}

/// Genlock phase offset, in lines and pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenlockOffset {
    pub vertical: i32,
    pub horizontal: i32,
}

/// Recording buffer layout of the playback engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferInfo {
    pub buffers: u32,
    pub frames_per_buffer: u32,
}

/// Board and sensor temperature in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Temperatures {
    pub board: i32,
    pub sensor: i32,
}

/// One entry of the device roster returned by discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceEntry {
    /// Position in the roster, starting at 1.
    pub index: u32,
    /// Bus address of the device on the RS485 chain.
    pub address: u32,
    /// Device type identifier.
    pub device_type: u32,
    pub serial: u32,
}

impl fmt::Display for DeviceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} addr={} type={:#06x} serial={}",
            self.index, self.address, self.device_type, self.serial
        )
    }
}

/// FPNC correction gains for even and odd columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FpncGains {
    pub even: u32,
    pub odd: u32,
}

/// Geometry of the FPNC correction data held by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FpncGeometry {
    /// Sensor width in physical columns.
    pub width: usize,
    /// Correction samples per column.
    pub no_samples: usize,
}

/// Capability description for a device family.
///
/// Each flag decides whether the matching command domain is registered
/// when a device is built. Domains that are not registered answer every
/// call with [`Error::NoDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub has_auto: bool,
    pub has_chain: bool,
    pub has_isp: bool,
    pub has_lut: bool,
    pub has_playback: bool,
    /// FPNC geometry, or `None` if the device has no FPNC block.
    pub fpnc: Option<FpncGeometry>,
    /// Whether the device sits on an RS485 chain and answers discovery.
    pub has_discovery: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities {
            has_auto: true,
            has_chain: true,
            has_isp: true,
            has_lut: true,
            has_playback: false,
            fpnc: None,
            has_discovery: false,
        }
    }
}

/// Static information about a connected device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Human-readable family name (e.g. "xbow").
    pub model_name: String,
    /// Serial port the device was opened on, if any.
    pub port: Option<String>,
}
