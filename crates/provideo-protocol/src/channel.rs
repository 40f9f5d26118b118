//! A shared command channel to one device.

use tokio::sync::Mutex;

use provideo_core::error::{Error, Result};
use provideo_core::transport::Transport;

use crate::accumulator::{self, Record};
use crate::descriptor::{CommandDescriptor, ListDescriptor};
use crate::engine::{self, EngineConfig};

/// Owns the transport to one device and serialises exchanges on it.
///
/// Every domain table of a device holds an `Arc<Channel>`. The transport
/// is locked for the whole of an exchange (including retries and list
/// accumulation), so requests never interleave on the wire.
pub struct Channel {
    transport: Mutex<Box<dyn Transport>>,
    config: EngineConfig,
}

impl Channel {
    pub fn new(transport: Box<dyn Transport>, config: EngineConfig) -> Self {
        Channel {
            transport: Mutex::new(transport),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a value-less command.
    pub async fn run(&self, desc: &CommandDescriptor) -> Result<()> {
        let mut transport = self.transport.lock().await;
        engine::run(transport.as_mut(), &self.config, desc).await
    }

    /// Read all fields of a command.
    pub async fn get(&self, desc: &CommandDescriptor) -> Result<Vec<i64>> {
        self.get_at(desc, &[]).await
    }

    /// Read all fields of an addressed command (`lut_read_red <i>`).
    pub async fn get_at(&self, desc: &CommandDescriptor, address: &[i64]) -> Result<Vec<i64>> {
        let mut transport = self.transport.lock().await;
        engine::get(transport.as_mut(), &self.config, desc, address).await
    }

    /// Write all fields of a command.
    pub async fn set(&self, desc: &CommandDescriptor, values: &[i64]) -> Result<()> {
        self.set_at(desc, &[], values).await
    }

    /// Write all fields of an addressed command.
    pub async fn set_at(
        &self,
        desc: &CommandDescriptor,
        address: &[i64],
        values: &[i64],
    ) -> Result<()> {
        let mut transport = self.transport.lock().await;
        engine::set(transport.as_mut(), &self.config, desc, address, values).await
    }

    /// Read a single-field command.
    pub async fn get_scalar(&self, desc: &CommandDescriptor) -> Result<i64> {
        let [value] = self.get_array::<1>(desc).await?;
        Ok(value)
    }

    /// Read a command with exactly `N` fields.
    pub async fn get_array<const N: usize>(&self, desc: &CommandDescriptor) -> Result<[i64; N]> {
        let values = self.get(desc).await?;
        <[i64; N]>::try_from(values).map_err(|v| {
            Error::Malformed(format!(
                "{}: expected {N} fields, got {}",
                desc.command,
                v.len()
            ))
        })
    }

    /// Write a single-field command.
    pub async fn set_scalar(&self, desc: &CommandDescriptor, value: i64) -> Result<()> {
        self.set(desc, &[value]).await
    }

    /// Read a 0/1 flag.
    pub async fn get_flag(&self, desc: &CommandDescriptor) -> Result<bool> {
        match self.get_scalar(desc).await? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::Malformed(format!(
                "{}: flag value {other}",
                desc.command
            ))),
        }
    }

    /// Write a 0/1 flag.
    pub async fn set_flag(&self, desc: &CommandDescriptor, on: bool) -> Result<()> {
        self.set_scalar(desc, i64::from(on)).await
    }

    /// Request a list and collect its records.
    pub async fn get_list(&self, desc: &ListDescriptor) -> Result<Vec<Record>> {
        let mut transport = self.transport.lock().await;
        accumulator::collect(transport.as_mut(), &self.config, desc, &[]).await
    }

    /// Close the underlying transport.
    pub async fn close(&self) -> Result<()> {
        self.transport.lock().await.close().await
    }

    pub async fn is_connected(&self) -> bool {
        self.transport.lock().await.is_connected()
    }

    /// Give up the channel and recover the transport.
    pub fn into_transport(self) -> Box<dyn Transport> {
        self.transport.into_inner()
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Narrow a wire value to a typed field, treating a value outside the
/// type's range as a malformed reply.
pub fn narrow<T: TryFrom<i64>>(value: i64, what: &str) -> Result<T> {
    T::try_from(value).map_err(|_| Error::Malformed(format!("{what}: value {value} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use provideo_core::error::errno;
    use provideo_test_harness::MockTransport;
    use std::sync::Arc;
    use std::time::Duration;

    const AEC_ENABLE: CommandDescriptor = CommandDescriptor::new("aec_enable", "aec_enable ", 1);
    const TEMP: CommandDescriptor = CommandDescriptor::new("temp", "temp ", 2);

    fn channel(mock: MockTransport) -> Channel {
        Channel::new(
            Box::new(mock),
            EngineConfig {
                command_timeout: Duration::from_millis(100),
                poll_interval: Duration::from_millis(5),
                ..EngineConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn flags_round_trip() {
        let mut mock = MockTransport::new();
        mock.expect(b"aec_enable\n", b"aec_enable 1\nOK\n");
        mock.expect(b"aec_enable 0\n", b"OK\n");
        let ch = channel(mock);

        assert!(ch.get_flag(&AEC_ENABLE).await.unwrap());
        ch.set_flag(&AEC_ENABLE, false).await.unwrap();
    }

    #[tokio::test]
    async fn flag_out_of_range_is_malformed() {
        let mut mock = MockTransport::new();
        mock.expect(b"aec_enable\n", b"aec_enable 2\nOK\n");
        let ch = channel(mock);

        let err = ch.get_flag(&AEC_ENABLE).await.unwrap_err();
        assert_eq!(err.errno(), -errno::EFAULT);
    }

    #[tokio::test]
    async fn array_get() {
        let mut mock = MockTransport::new();
        mock.expect(b"temp\n", b"temp 41 -5\nOK\n");
        let ch = channel(mock);

        assert_eq!(ch.get_array::<2>(&TEMP).await.unwrap(), [41, -5]);
    }

    #[tokio::test]
    async fn shared_channel_serialises_exchanges() {
        let mut mock = MockTransport::new();
        mock.expect(b"temp\n", b"temp 1 2\nOK\n");
        mock.expect(b"aec_enable\n", b"aec_enable 0\nOK\n");
        let ch = Arc::new(channel(mock));

        let (a, b) = tokio::join!(ch.get_array::<2>(&TEMP), ch.get_flag(&AEC_ENABLE));
        assert_eq!(a.unwrap(), [1, 2]);
        assert!(!b.unwrap());
    }

    #[tokio::test]
    async fn close_disconnects() {
        let ch = channel(MockTransport::new());
        assert!(ch.is_connected().await);
        ch.close().await.unwrap();
        assert!(!ch.is_connected().await);
        assert!(!ch.into_transport().is_connected());
    }

    #[test]
    fn narrow_checks_range() {
        assert_eq!(narrow::<u8>(200, "x").unwrap(), 200);
        assert!(matches!(narrow::<u8>(256, "x"), Err(Error::Malformed(_))));
        assert!(matches!(narrow::<u32>(-1, "x"), Err(Error::Malformed(_))));
    }
}
