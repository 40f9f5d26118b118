//! Image signal processing: colour gains, black level, flare and colour
//! correction.

use std::sync::Arc;

use async_trait::async_trait;

use provideo_core::error::Result;
use provideo_core::types::*;
use provideo_protocol::{Channel, CommandDescriptor, narrow};

use crate::commands::isp as cmd;
use crate::domains::IspCommands;

/// [`IspCommands`] for ProVideo devices.
#[derive(Debug, Clone)]
pub struct ProVideoIsp {
    channel: Arc<Channel>,
}

impl ProVideoIsp {
    pub fn new(channel: Arc<Channel>) -> Self {
        ProVideoIsp { channel }
    }

    async fn get_rgb<T: TryFrom<i64>>(&self, desc: &CommandDescriptor) -> Result<Rgb<T>> {
        let [r, g, b] = self.channel.get_array::<3>(desc).await?;
        Ok(Rgb {
            red: narrow(r, desc.command)?,
            green: narrow(g, desc.command)?,
            blue: narrow(b, desc.command)?,
        })
    }

    async fn set_rgb<T: Copy + Into<i64>>(&self, desc: &CommandDescriptor, rgb: Rgb<T>) -> Result<()> {
        let values: [i64; 3] = rgb.to_array().map(Into::into);
        self.channel.set(desc, &values).await
    }
}

#[async_trait]
impl IspCommands for ProVideoIsp {
    async fn gain(&self, component: ColorComponent) -> Result<u32> {
        let desc = cmd::gain(component);
        narrow(self.channel.get_scalar(desc).await?, desc.command)
    }

    async fn set_gain(&self, component: ColorComponent, gain: u32) -> Result<()> {
        self.channel
            .set_scalar(cmd::gain(component), i64::from(gain))
            .await
    }

    async fn black_level(&self) -> Result<Rgb<i32>> {
        self.get_rgb(&cmd::BLACK_LEVEL).await
    }

    async fn set_black_level(&self, level: Rgb<i32>) -> Result<()> {
        self.set_rgb(&cmd::BLACK_LEVEL, level).await
    }

    async fn flare(&self) -> Result<Rgb<u32>> {
        self.get_rgb(&cmd::FLARE).await
    }

    async fn set_flare(&self, flare: Rgb<u32>) -> Result<()> {
        self.set_rgb(&cmd::FLARE, flare).await
    }

    async fn color_matrix(&self) -> Result<ColorMatrix> {
        let values = self.channel.get_array::<9>(&cmd::CC_MATRIX).await?;
        let mut matrix = [0i32; 9];
        for (slot, value) in matrix.iter_mut().zip(values) {
            *slot = narrow(value, "cc_matrix")?;
        }
        Ok(ColorMatrix(matrix))
    }

    async fn set_color_matrix(&self, matrix: ColorMatrix) -> Result<()> {
        self.channel
            .set(&cmd::CC_MATRIX, &matrix.0.map(i64::from))
            .await
    }

    async fn color_offset(&self) -> Result<Rgb<i32>> {
        self.get_rgb(&cmd::CC_OFFSET).await
    }

    async fn set_color_offset(&self, offset: Rgb<i32>) -> Result<()> {
        self.set_rgb(&cmd::CC_OFFSET, offset).await
    }

    async fn bayer_pattern(&self) -> Result<BayerPattern> {
        BayerPattern::try_from(self.channel.get_scalar(&cmd::BAYER_PATTERN).await?)
    }

    async fn set_bayer_pattern(&self, pattern: BayerPattern) -> Result<()> {
        self.channel
            .set_scalar(&cmd::BAYER_PATTERN, pattern.code())
            .await
    }
}
