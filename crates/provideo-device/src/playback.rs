//! Recording and playback.

use std::sync::Arc;

use async_trait::async_trait;

use provideo_core::error::Result;
use provideo_core::types::*;
use provideo_protocol::{Channel, CommandDescriptor, narrow};

use crate::commands::playback as cmd;
use crate::domains::PlaybackCommands;

/// [`PlaybackCommands`] for ProVideo devices.
#[derive(Debug, Clone)]
pub struct ProVideoPlayback {
    channel: Arc<Channel>,
}

impl ProVideoPlayback {
    pub fn new(channel: Arc<Channel>) -> Self {
        ProVideoPlayback { channel }
    }

    async fn get_u32(&self, desc: &CommandDescriptor) -> Result<u32> {
        narrow(self.channel.get_scalar(desc).await?, desc.command)
    }
}

#[async_trait]
impl PlaybackCommands for ProVideoPlayback {
    async fn play(&self) -> Result<()> {
        self.channel.run(&cmd::PLAY).await
    }

    async fn stop(&self) -> Result<()> {
        self.channel.run(&cmd::STOP).await
    }

    async fn record(&self) -> Result<()> {
        self.channel.run(&cmd::RECORD).await
    }

    async fn pause(&self) -> Result<()> {
        self.channel.run(&cmd::PAUSE).await
    }

    async fn buffer_info(&self) -> Result<BufferInfo> {
        let [buffers, frames] = self.channel.get_array::<2>(&cmd::BUFFER_INFO).await?;
        Ok(BufferInfo {
            buffers: narrow(buffers, "buffer_info")?,
            frames_per_buffer: narrow(frames, "buffer_info")?,
        })
    }

    async fn buffer(&self) -> Result<u32> {
        self.get_u32(&cmd::BUFFER_SELECT).await
    }

    async fn select_buffer(&self, buffer: u32) -> Result<()> {
        self.channel
            .set_scalar(&cmd::BUFFER_SELECT, i64::from(buffer))
            .await
    }

    async fn play_mode(&self) -> Result<PlayMode> {
        PlayMode::try_from(self.channel.get_scalar(&cmd::PLAY_MODE).await?)
    }

    async fn set_play_mode(&self, mode: PlayMode) -> Result<()> {
        self.channel.set_scalar(&cmd::PLAY_MODE, mode.code()).await
    }

    async fn position(&self) -> Result<u32> {
        self.get_u32(&cmd::PLAY_POSITION).await
    }

    async fn set_position(&self, frame: u32) -> Result<()> {
        self.channel
            .set_scalar(&cmd::PLAY_POSITION, i64::from(frame))
            .await
    }

    async fn record_status(&self) -> Result<u32> {
        self.get_u32(&cmd::RECORD_STATUS).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provideo_core::error::{Error, errno};
    use provideo_protocol::EngineConfig;
    use provideo_test_harness::MockTransport;
    use std::time::Duration;

    fn make_playback(mock: MockTransport) -> ProVideoPlayback {
        let config = EngineConfig {
            command_timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(5),
            ..EngineConfig::default()
        };
        ProVideoPlayback::new(Arc::new(Channel::new(Box::new(mock), config)))
    }

    #[tokio::test]
    async fn transport_controls() {
        let mut mock = MockTransport::new();
        mock.expect(b"record\n", b"OK\n");
        mock.expect(b"stop\n", b"OK\n");
        mock.expect(b"play\n", b"OK\n");
        mock.expect(b"pause\n", b"FAILED 16\n");
        let pb = make_playback(mock);

        pb.record().await.unwrap();
        pb.stop().await.unwrap();
        pb.play().await.unwrap();
        let err = pb.pause().await.unwrap_err();
        assert_eq!(err.errno(), -16);
    }

    #[tokio::test]
    async fn buffer_info() {
        let mut mock = MockTransport::new();
        mock.expect(b"buffer_info\n", b"buffer_info 4 250\nOK\n");
        let pb = make_playback(mock);

        assert_eq!(
            pb.buffer_info().await.unwrap(),
            BufferInfo {
                buffers: 4,
                frames_per_buffer: 250,
            }
        );
    }

    #[tokio::test]
    async fn buffer_and_position() {
        let mut mock = MockTransport::new();
        mock.expect(b"buffer_select 2\n", b"OK\n");
        mock.expect(b"play_position\n", b"play_position 120\nOK\n");
        mock.expect(b"play_position 0\n", b"OK\n");
        let pb = make_playback(mock);

        pb.select_buffer(2).await.unwrap();
        assert_eq!(pb.position().await.unwrap(), 120);
        pb.set_position(0).await.unwrap();
    }

    #[tokio::test]
    async fn play_mode() {
        let mut mock = MockTransport::new();
        mock.expect(b"play_mode\n", b"play_mode 2\nOK\n");
        mock.expect(b"play_mode 1\n", b"OK\n");
        let pb = make_playback(mock);

        assert_eq!(pb.play_mode().await.unwrap(), PlayMode::PingPong);
        pb.set_play_mode(PlayMode::Loop).await.unwrap();
    }

    #[tokio::test]
    async fn record_status_tolerates_jitter() {
        let mut mock = MockTransport::new();
        mock.expect_silence(b"record_status\n");
        mock.expect_silence(b"record_status\n");
        mock.expect(b"record_status\n", b"record_status 37\nOK\n");
        let pb = make_playback(mock);

        assert_eq!(pb.record_status().await.unwrap(), 37);
    }

    #[tokio::test]
    async fn record_status_exhausted_retries() {
        let mut mock = MockTransport::new();
        for _ in 0..11 {
            mock.expect_silence(b"record_status\n");
        }
        let pb = make_playback(mock);

        let err = pb.record_status().await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
        assert_eq!(err.errno(), -errno::ETIMEDOUT);
    }
}
