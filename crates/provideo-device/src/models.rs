//! ProVideo model definitions.
//!
//! Each device family is described by a [`ProVideoModel`] that captures
//! its default baud rate and which command domains it implements. All
//! families speak the same command language; they differ in which
//! subsystems are present and in the geometry of the FPNC block.
//!
//! Models are defined as factory functions (e.g. [`xbow()`]) that return a
//! fully populated [`ProVideoModel`]. The following families are known:
//!
//! | Model    | Baud   | AEC/AWB | Playback | FPNC      | RS485 chain |
//! |----------|--------|---------|----------|-----------|-------------|
//! | xbow     | 115200 | Yes     | No       | 1920 × 16 | Yes         |
//! | condor4k | 115200 | Yes     | No       | 4096 × 16 | Yes         |
//! | cooper   | 115200 | No      | Yes      | --        | No          |

use provideo_core::types::{Capabilities, FpncGeometry};

/// Static model definition for a ProVideo device family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProVideoModel {
    /// Human-readable family name (e.g. "xbow").
    pub name: &'static str,
    /// Machine-readable identifier, as reported in `device_id` listings.
    pub model_id: &'static str,
    /// Factory default of the device's serial port.
    pub default_baud_rate: u32,
    /// Which command domains the family implements.
    pub capabilities: Capabilities,
}

/// Camera head with a 1920-column sensor.
pub fn xbow() -> ProVideoModel {
    ProVideoModel {
        name: "xbow",
        model_id: "xbow",
        default_baud_rate: 115_200,
        capabilities: Capabilities {
            fpnc: Some(FpncGeometry {
                width: 1920,
                no_samples: 16,
            }),
            has_discovery: true,
            ..Capabilities::default()
        },
    }
}

/// Camera head with a 4096-column sensor.
pub fn condor4k() -> ProVideoModel {
    ProVideoModel {
        name: "condor4k",
        model_id: "condor4k",
        default_baud_rate: 115_200,
        capabilities: Capabilities {
            fpnc: Some(FpncGeometry {
                width: 4096,
                no_samples: 16,
            }),
            has_discovery: true,
            ..Capabilities::default()
        },
    }
}

/// Processing box with a frame store. Has no sensor, so no exposure
/// control and no FPNC.
pub fn cooper() -> ProVideoModel {
    ProVideoModel {
        name: "cooper",
        model_id: "cooper",
        default_baud_rate: 115_200,
        capabilities: Capabilities {
            has_auto: false,
            has_playback: true,
            ..Capabilities::default()
        },
    }
}

/// Return every known model.
pub fn all_models() -> Vec<ProVideoModel> {
    vec![xbow(), condor4k(), cooper()]
}

/// Look up a model by name, ignoring case.
pub fn by_name(name: &str) -> Option<ProVideoModel> {
    all_models()
        .into_iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
}
