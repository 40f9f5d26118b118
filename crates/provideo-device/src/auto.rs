//! Auto exposure and white balance.

use std::sync::Arc;

use async_trait::async_trait;

use provideo_core::error::{Error, Result};
use provideo_core::types::*;
use provideo_protocol::{Channel, CommandDescriptor, narrow};

use crate::commands::auto as cmd;
use crate::domains::AutoCommands;

/// [`AutoCommands`] for ProVideo devices.
#[derive(Debug, Clone)]
pub struct ProVideoAuto {
    channel: Arc<Channel>,
}

impl ProVideoAuto {
    pub fn new(channel: Arc<Channel>) -> Self {
        ProVideoAuto { channel }
    }

    async fn get_u32(&self, desc: &CommandDescriptor) -> Result<u32> {
        narrow(self.channel.get_scalar(desc).await?, desc.command)
    }
}

#[async_trait]
impl AutoCommands for ProVideoAuto {
    async fn aec_enabled(&self) -> Result<bool> {
        self.channel.get_flag(&cmd::AEC_ENABLE).await
    }

    async fn set_aec_enabled(&self, on: bool) -> Result<()> {
        self.channel.set_flag(&cmd::AEC_ENABLE, on).await
    }

    async fn aec_setup(&self) -> Result<AecSetup> {
        let [setpoint, speed, tolerance, max_integration] =
            self.channel.get_array::<4>(&cmd::AEC_SETUP).await?;
        Ok(AecSetup {
            setpoint: narrow(setpoint, "aec_setup")?,
            speed: narrow(speed, "aec_setup")?,
            tolerance: narrow(tolerance, "aec_setup")?,
            max_integration_us: narrow(max_integration, "aec_setup")?,
        })
    }

    async fn set_aec_setup(&self, setup: AecSetup) -> Result<()> {
        let values = [
            setup.setpoint,
            setup.speed,
            setup.tolerance,
            setup.max_integration_us,
        ]
        .map(i64::from);
        self.channel.set(&cmd::AEC_SETUP, &values).await
    }

    async fn aec_status(&self) -> Result<AecStatus> {
        let [gain, integration, exposure] = self.channel.get_array::<3>(&cmd::AEC_STATUS).await?;
        Ok(AecStatus {
            gain: narrow(gain, "aec_status")?,
            integration_us: narrow(integration, "aec_status")?,
            exposure: narrow(exposure, "aec_status")?,
        })
    }

    async fn aec_weights(&self) -> Result<Vec<u8>> {
        let records = self.channel.get_list(&cmd::AEC_WEIGHTS).await?;
        records
            .iter()
            .map(|r| {
                let weight: u8 = narrow(r.values[0], "aec weight")?;
                if weight > cmd::MAX_WEIGHT {
                    return Err(Error::Malformed(format!(
                        "aec weight {} of cell {}",
                        weight, r.index
                    )));
                }
                Ok(weight)
            })
            .collect()
    }

    async fn set_aec_weight(&self, index: u32, weight: u8) -> Result<()> {
        if index == 0 || index as usize > cmd::WEIGHT_CELLS {
            return Err(Error::InvalidArgument(format!(
                "weight cell {index} outside 1..={}",
                cmd::WEIGHT_CELLS
            )));
        }
        if weight > cmd::MAX_WEIGHT {
            return Err(Error::InvalidArgument(format!(
                "weight {weight} above {}",
                cmd::MAX_WEIGHT
            )));
        }
        self.channel
            .set(&cmd::AEC_WEIGHT, &[i64::from(index), i64::from(weight)])
            .await
    }

    async fn awb_enabled(&self) -> Result<bool> {
        self.channel.get_flag(&cmd::AWB_ENABLE).await
    }

    async fn set_awb_enabled(&self, on: bool) -> Result<()> {
        self.channel.set_flag(&cmd::AWB_ENABLE, on).await
    }

    async fn awb_speed(&self) -> Result<u32> {
        self.get_u32(&cmd::AWB_SPEED).await
    }

    async fn set_awb_speed(&self, speed: u32) -> Result<()> {
        self.channel
            .set_scalar(&cmd::AWB_SPEED, i64::from(speed))
            .await
    }

    async fn wb_preset(&self) -> Result<u32> {
        self.get_u32(&cmd::WB_PRESET).await
    }

    async fn set_wb_preset(&self, preset: u32) -> Result<()> {
        self.channel
            .set_scalar(&cmd::WB_PRESET, i64::from(preset))
            .await
    }
}
