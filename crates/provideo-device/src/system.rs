//! System domain: identity, housekeeping, settings and discovery.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use provideo_core::error::{Error, Result};
use provideo_core::types::*;
use provideo_protocol::{Channel, narrow};

use crate::commands::system as cmd;
use crate::domains::SystemCommands;

/// [`SystemCommands`] for ProVideo devices.
#[derive(Debug, Clone)]
pub struct ProVideoSystem {
    channel: Arc<Channel>,
    discovery: bool,
}

impl ProVideoSystem {
    /// `discovery` tells whether the device answers `get_device_list`.
    pub fn new(channel: Arc<Channel>, discovery: bool) -> Self {
        ProVideoSystem { channel, discovery }
    }

    async fn get_u32(&self, desc: &provideo_protocol::CommandDescriptor) -> Result<u32> {
        narrow(self.channel.get_scalar(desc).await?, desc.command)
    }
}

#[async_trait]
impl SystemCommands for ProVideoSystem {
    async fn device_id(&self) -> Result<u32> {
        self.get_u32(&cmd::DEVICE_ID).await
    }

    async fn runtime(&self) -> Result<u32> {
        self.get_u32(&cmd::RUNTIME).await
    }

    async fn temperatures(&self) -> Result<Temperatures> {
        let [board, sensor] = self.channel.get_array::<2>(&cmd::TEMP).await?;
        Ok(Temperatures {
            board: narrow(board, "temp")?,
            sensor: narrow(sensor, "temp")?,
        })
    }

    async fn fan_speed(&self) -> Result<u32> {
        let speed = self.get_u32(&cmd::FAN_SPEED).await?;
        if speed > 100 {
            return Err(Error::Malformed(format!("fan_speed: {speed}%")));
        }
        Ok(speed)
    }

    async fn device_mode(&self) -> Result<u32> {
        self.get_u32(&cmd::DEVICE_MODE).await
    }

    async fn set_device_mode(&self, mode: u32) -> Result<()> {
        debug!(mode, "switching device mode");
        self.channel
            .set_scalar(&cmd::DEVICE_MODE, i64::from(mode))
            .await
    }

    async fn debug_level(&self) -> Result<u32> {
        self.get_u32(&cmd::DEBUG_LEVEL).await
    }

    async fn set_debug_level(&self, level: u32) -> Result<()> {
        self.channel
            .set_scalar(&cmd::DEBUG_LEVEL, i64::from(level))
            .await
    }

    async fn save_settings(&self) -> Result<()> {
        self.channel.run(&cmd::SAVE_SETTINGS).await
    }

    async fn load_settings(&self) -> Result<()> {
        self.channel.run(&cmd::LOAD_SETTINGS).await
    }

    async fn reset_settings(&self) -> Result<()> {
        self.channel.run(&cmd::RESET_SETTINGS).await
    }

    async fn reboot(&self) -> Result<()> {
        self.channel.run(&cmd::REBOOT).await
    }

    async fn device_list(&self) -> Result<Vec<DeviceEntry>> {
        if !self.discovery {
            return Err(Error::Unsupported(
                "device has no RS485 discovery".into(),
            ));
        }
        let records = self.channel.get_list(&cmd::DEVICE_LIST).await?;
        records
            .into_iter()
            .map(|r| match r.values.as_slice() {
                [address, device_type, serial] => Ok(DeviceEntry {
                    index: r.index,
                    address: narrow(*address, "device address")?,
                    device_type: narrow(*device_type, "device type")?,
                    serial: narrow(*serial, "device serial")?,
                }),
                other => Err(Error::Malformed(format!(
                    "device list record {} has {} fields",
                    r.index,
                    other.len()
                ))),
            })
            .collect()
    }
}
