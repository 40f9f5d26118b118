//! Video chain: video mode, genlock, flip and SDI output levels.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use provideo_core::error::{Error, Result};
use provideo_core::types::*;
use provideo_protocol::{Channel, CommandDescriptor, narrow};

use crate::commands::chain as cmd;
use crate::domains::ChainCommands;

/// Legal SDI black/white level range (10-bit code values).
const SDI_LEVEL_MAX: i32 = 1023;

/// [`ChainCommands`] for ProVideo devices.
#[derive(Debug, Clone)]
pub struct ProVideoChain {
    channel: Arc<Channel>,
}

impl ProVideoChain {
    pub fn new(channel: Arc<Channel>) -> Self {
        ProVideoChain { channel }
    }

    async fn get_code<T: TryFrom<i64, Error = Error>>(&self, desc: &CommandDescriptor) -> Result<T> {
        T::try_from(self.channel.get_scalar(desc).await?)
    }

    async fn get_level(&self, desc: &CommandDescriptor) -> Result<i32> {
        narrow(self.channel.get_scalar(desc).await?, desc.command)
    }

    async fn set_level(&self, desc: &CommandDescriptor, level: i32) -> Result<()> {
        if !(0..=SDI_LEVEL_MAX).contains(&level) {
            return Err(Error::InvalidArgument(format!(
                "{}: level {level} outside 0..={SDI_LEVEL_MAX}",
                desc.command
            )));
        }
        self.channel.set_scalar(desc, i64::from(level)).await
    }
}

#[async_trait]
impl ChainCommands for ProVideoChain {
    async fn video_mode(&self) -> Result<u32> {
        narrow(self.channel.get_scalar(&cmd::VIDEO_MODE).await?, "video_mode")
    }

    async fn set_video_mode(&self, mode: u32) -> Result<()> {
        debug!(mode, "switching video mode");
        self.channel
            .set_scalar(&cmd::VIDEO_MODE, i64::from(mode))
            .await
    }

    async fn genlock_mode(&self) -> Result<GenlockMode> {
        self.get_code(&cmd::GENLOCK_MODE).await
    }

    async fn set_genlock_mode(&self, mode: GenlockMode) -> Result<()> {
        self.channel.set_scalar(&cmd::GENLOCK_MODE, mode.code()).await
    }

    async fn genlock_offset(&self) -> Result<GenlockOffset> {
        let [vertical, horizontal] = self.channel.get_array::<2>(&cmd::GENLOCK_OFFSET).await?;
        Ok(GenlockOffset {
            vertical: narrow(vertical, "genlock_offset")?,
            horizontal: narrow(horizontal, "genlock_offset")?,
        })
    }

    async fn set_genlock_offset(&self, offset: GenlockOffset) -> Result<()> {
        self.channel
            .set(
                &cmd::GENLOCK_OFFSET,
                &[i64::from(offset.vertical), i64::from(offset.horizontal)],
            )
            .await
    }

    async fn genlock_termination(&self) -> Result<bool> {
        self.channel.get_flag(&cmd::GENLOCK_TERMINATION).await
    }

    async fn set_genlock_termination(&self, on: bool) -> Result<()> {
        self.channel.set_flag(&cmd::GENLOCK_TERMINATION, on).await
    }

    async fn flip_mode(&self) -> Result<FlipMode> {
        self.get_code(&cmd::FLIP_MODE).await
    }

    async fn set_flip_mode(&self, mode: FlipMode) -> Result<()> {
        self.channel.set_scalar(&cmd::FLIP_MODE, mode.code()).await
    }

    async fn sdi_range(&self) -> Result<SdiRange> {
        self.get_code(&cmd::SDI_RANGE).await
    }

    async fn set_sdi_range(&self, range: SdiRange) -> Result<()> {
        self.channel.set_scalar(&cmd::SDI_RANGE, range.code()).await
    }

    async fn sdi_black(&self) -> Result<i32> {
        self.get_level(&cmd::SDI_BLACK).await
    }

    async fn set_sdi_black(&self, level: i32) -> Result<()> {
        self.set_level(&cmd::SDI_BLACK, level).await
    }

    async fn sdi_white(&self) -> Result<i32> {
        self.get_level(&cmd::SDI_WHITE).await
    }

    async fn set_sdi_white(&self, level: i32) -> Result<()> {
        self.set_level(&cmd::SDI_WHITE, level).await
    }
}
