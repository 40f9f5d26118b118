//! ProVideoDevice -- one connected device and its command domains.
//!
//! A device owns the [`Channel`] to the hardware and one
//! [`DriverSlot`] per command domain. The builder fills the slots that
//! the model's capabilities call for with the ProVideo driver tables;
//! callers may replace or clear any of them afterwards (for instance to
//! wrap a domain with a simulation layer). Every slot belongs to this
//! instance; two devices never share registrations.

use std::sync::Arc;

use provideo_core::error::Result;
use provideo_core::types::{Capabilities, DeviceInfo};
use provideo_protocol::{Channel, DriverSlot};

use crate::auto::ProVideoAuto;
use crate::chain::ProVideoChain;
use crate::domains::*;
use crate::fpnc::ProVideoFpnc;
use crate::isp::ProVideoIsp;
use crate::lut::ProVideoLut;
use crate::models::ProVideoModel;
use crate::playback::ProVideoPlayback;
use crate::system::ProVideoSystem;

/// Generates the accessor, register and unregister methods of one domain.
macro_rules! domain_slot {
    ($field:ident, $trait:ident, $register:ident, $unregister:ident) => {
        #[doc = concat!("The registered [`", stringify!($trait), "`] table.")]
        ///
        /// Fails with [`Error::NoDriver`](provideo_core::Error::NoDriver)
        /// if the domain has no table.
        pub fn $field(&self) -> Result<&dyn $trait> {
            self.$field.get()
        }

        #[doc = concat!("Install a [`", stringify!($trait), "`] table, replacing the current one.")]
        pub fn $register(&mut self, table: Box<dyn $trait>) -> Option<Box<dyn $trait>> {
            self.$field.register(table)
        }

        #[doc = concat!("Remove the [`", stringify!($trait), "`] table.")]
        pub fn $unregister(&mut self) -> Option<Box<dyn $trait>> {
            self.$field.unregister()
        }
    };
}

/// A connected ProVideo device.
///
/// Constructed via [`ProVideoBuilder`](crate::builder::ProVideoBuilder).
pub struct ProVideoDevice {
    channel: Arc<Channel>,
    model: ProVideoModel,
    info: DeviceInfo,
    system: DriverSlot<dyn SystemCommands>,
    auto: DriverSlot<dyn AutoCommands>,
    chain: DriverSlot<dyn ChainCommands>,
    isp: DriverSlot<dyn IspCommands>,
    lut: DriverSlot<dyn LutCommands>,
    playback: DriverSlot<dyn PlaybackCommands>,
    fpnc: DriverSlot<dyn FpncCommands>,
}

impl ProVideoDevice {
    /// Create a device with every slot empty.
    ///
    /// This is called by [`ProVideoBuilder`](crate::builder::ProVideoBuilder);
    /// callers should use the builder API instead.
    pub(crate) fn new(channel: Channel, model: ProVideoModel, port: Option<String>) -> Self {
        let info = DeviceInfo {
            model_name: model.name.to_string(),
            port,
        };
        ProVideoDevice {
            channel: Arc::new(channel),
            model,
            info,
            system: DriverSlot::new("system"),
            auto: DriverSlot::new("auto"),
            chain: DriverSlot::new("chain"),
            isp: DriverSlot::new("isp"),
            lut: DriverSlot::new("lut"),
            playback: DriverSlot::new("playback"),
            fpnc: DriverSlot::new("fpnc"),
        }
    }

    /// Register the ProVideo driver table of every domain the model supports.
    pub(crate) fn register_defaults(&mut self, legacy_calibration_pages: bool) {
        let ch = &self.channel;
        let caps = self.model.capabilities.clone();

        self.system.register(Box::new(ProVideoSystem::new(
            ch.clone(),
            caps.has_discovery,
        )));
        if caps.has_auto {
            self.auto.register(Box::new(ProVideoAuto::new(ch.clone())));
        }
        if caps.has_chain {
            self.chain.register(Box::new(ProVideoChain::new(ch.clone())));
        }
        if caps.has_isp {
            self.isp.register(Box::new(ProVideoIsp::new(ch.clone())));
        }
        if caps.has_lut {
            self.lut.register(Box::new(ProVideoLut::new(ch.clone())));
        }
        if caps.has_playback {
            self.playback
                .register(Box::new(ProVideoPlayback::new(ch.clone())));
        }
        if let Some(geometry) = caps.fpnc {
            self.fpnc.register(Box::new(
                ProVideoFpnc::new(ch.clone(), geometry)
                    .with_legacy_calibration_pages(legacy_calibration_pages),
            ));
        }
    }

    domain_slot!(system, SystemCommands, register_system, unregister_system);
    domain_slot!(auto, AutoCommands, register_auto, unregister_auto);
    domain_slot!(chain, ChainCommands, register_chain, unregister_chain);
    domain_slot!(isp, IspCommands, register_isp, unregister_isp);
    domain_slot!(lut, LutCommands, register_lut, unregister_lut);
    domain_slot!(playback, PlaybackCommands, register_playback, unregister_playback);
    domain_slot!(fpnc, FpncCommands, register_fpnc, unregister_fpnc);

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn model(&self) -> &ProVideoModel {
        &self.model
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.model.capabilities
    }

    /// The shared channel, for building custom driver tables.
    pub fn channel(&self) -> Arc<Channel> {
        self.channel.clone()
    }

    /// Close the connection. Every later command fails with
    /// [`Error::NotConnected`](provideo_core::Error::NotConnected) or the
    /// transport's equivalent.
    pub async fn close(&self) -> Result<()> {
        self.channel.close().await
    }
}

impl std::fmt::Debug for ProVideoDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProVideoDevice")
            .field("model", &self.model.name)
            .field("port", &self.info.port)
            .field("system", &self.system)
            .field("auto", &self.auto)
            .field("chain", &self.chain)
            .field("isp", &self.isp)
            .field("lut", &self.lut)
            .field("playback", &self.playback)
            .field("fpnc", &self.fpnc)
            .finish()
    }
}
