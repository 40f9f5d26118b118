//! Lookup tables (gamma).
//!
//! Tables are written through the write-index register: `lut_write_index`
//! positions the pointer, then each `lut_write_<colour>` stores one sample
//! and advances it. Reads are addressed directly.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use provideo_core::error::{Error, Result};
use provideo_core::types::ColorComponent;
use provideo_protocol::{Channel, CommandDescriptor, narrow};

use crate::commands::lut as cmd;
use crate::domains::LutCommands;

/// [`LutCommands`] for ProVideo devices.
#[derive(Debug, Clone)]
pub struct ProVideoLut {
    channel: Arc<Channel>,
}

impl ProVideoLut {
    pub fn new(channel: Arc<Channel>) -> Self {
        ProVideoLut { channel }
    }

    async fn get_u32(&self, desc: &CommandDescriptor) -> Result<u32> {
        narrow(self.channel.get_scalar(desc).await?, desc.command)
    }

    async fn set_u32(&self, desc: &CommandDescriptor, value: u32) -> Result<()> {
        self.channel.set_scalar(desc, i64::from(value)).await
    }
}

fn check_sample(value: u16) -> Result<()> {
    if value > cmd::MAX_SAMPLE {
        return Err(Error::InvalidArgument(format!(
            "LUT sample {value} above {}",
            cmd::MAX_SAMPLE
        )));
    }
    Ok(())
}

#[async_trait]
impl LutCommands for ProVideoLut {
    async fn lut_enabled(&self) -> Result<bool> {
        self.channel.get_flag(&cmd::LUT_ENABLE).await
    }

    async fn set_lut_enabled(&self, on: bool) -> Result<()> {
        self.channel.set_flag(&cmd::LUT_ENABLE, on).await
    }

    async fn lut_mode(&self) -> Result<u32> {
        self.get_u32(&cmd::LUT_MODE).await
    }

    async fn set_lut_mode(&self, mode: u32) -> Result<()> {
        self.set_u32(&cmd::LUT_MODE, mode).await
    }

    async fn lut_preset(&self) -> Result<u32> {
        self.get_u32(&cmd::LUT_PRESET).await
    }

    async fn set_lut_preset(&self, preset: u32) -> Result<()> {
        self.set_u32(&cmd::LUT_PRESET, preset).await
    }

    async fn write_index(&self) -> Result<u32> {
        self.get_u32(&cmd::LUT_WRITE_INDEX).await
    }

    async fn set_write_index(&self, index: u32) -> Result<()> {
        self.set_u32(&cmd::LUT_WRITE_INDEX, index).await
    }

    async fn write_sample(&self, component: ColorComponent, value: u16) -> Result<()> {
        check_sample(value)?;
        self.channel
            .set_scalar(cmd::write(component), i64::from(value))
            .await
    }

    async fn write_table(
        &self,
        component: ColorComponent,
        start: u32,
        samples: &[u16],
    ) -> Result<()> {
        for value in samples {
            check_sample(*value)?;
        }
        debug!(
            component = component.name(),
            start,
            count = samples.len(),
            "writing LUT samples"
        );
        self.set_write_index(start).await?;
        let desc = cmd::write(component);
        for value in samples {
            self.channel.set_scalar(desc, i64::from(*value)).await?;
        }
        Ok(())
    }

    async fn read_sample(&self, component: ColorComponent, index: u32) -> Result<u16> {
        let desc = cmd::read(component);
        let values = self.channel.get_at(desc, &[i64::from(index)]).await?;
        let sample: u16 = match values.as_slice() {
            [value] => narrow(*value, desc.command)?,
            _ => {
                return Err(Error::Malformed(format!(
                    "{}: expected one value",
                    desc.command
                )));
            }
        };
        if sample > cmd::MAX_SAMPLE {
            return Err(Error::Malformed(format!(
                "{}: sample {sample} at {index}",
                desc.command
            )));
        }
        Ok(sample)
    }

    async fn reset(&self) -> Result<()> {
        self.channel.run(&cmd::LUT_RESET).await
    }

    async fn fixed_gamma(&self) -> Result<u32> {
        self.get_u32(&cmd::LUT_FIXED_GAMMA).await
    }

    async fn set_fixed_gamma(&self, gamma: u32) -> Result<()> {
        self.set_u32(&cmd::LUT_FIXED_GAMMA, gamma).await
    }
}
