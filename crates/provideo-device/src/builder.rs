//! ProVideoBuilder -- fluent builder for constructing [`ProVideoDevice`] instances.
//!
//! Separates configuration from construction so that callers can set up
//! serial port parameters, retry policies, and timeout values before
//! establishing the transport connection.
//!
//! # Example
//!
//! ```no_run
//! use provideo_device::builder::ProVideoBuilder;
//! use provideo_device::models::xbow;
//! use std::time::Duration;
//!
//! # async fn example() -> provideo_core::Result<()> {
//! let device = ProVideoBuilder::new(xbow())
//!     .serial_port("/dev/ttyUSB0")
//!     .command_timeout(Duration::from_millis(500))
//!     .retries(2)
//!     .build()
//!     .await?;
//!
//! let gain = device
//!     .isp()?
//!     .gain(provideo_core::ColorComponent::Red)
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tracing::info;

use provideo_core::error::{Error, Result};
use provideo_core::transport::Transport;
use provideo_protocol::{Channel, EngineConfig};

use crate::device::ProVideoDevice;
use crate::models::ProVideoModel;

/// Smallest response buffer that still holds a full list record plus
/// its status line.
const MIN_CAPACITY: usize = 256;

/// Fluent builder for [`ProVideoDevice`].
///
/// Everything not set explicitly falls back to the [`ProVideoModel`] and
/// [`EngineConfig::default`], so the simplest usage is:
///
/// ```ignore
/// let device = ProVideoBuilder::new(xbow())
///     .serial_port("/dev/ttyUSB0")
///     .build()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProVideoBuilder {
    model: ProVideoModel,
    serial_port: Option<String>,
    baud_rate: Option<u32>,
    config: EngineConfig,
    legacy_calibration_pages: bool,
}

impl ProVideoBuilder {
    /// Create a new builder for the given model.
    pub fn new(model: ProVideoModel) -> Self {
        ProVideoBuilder {
            model,
            serial_port: None,
            baud_rate: None,
            config: EngineConfig::default(),
            legacy_calibration_pages: false,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the default baud rate for this model.
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = Some(baud);
        self
    }

    /// Set the timeout of a single command attempt (default: 1s).
    ///
    /// Commands that declare their own timeout (mode switches, flash
    /// access) keep it.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    /// Set how often a timed-out command is repeated (default: 0).
    pub fn retries(mut self, n: u32) -> Self {
        self.config.retries = n;
        self
    }

    /// Set how long one poll of the serial line waits for data (default: 10ms).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the response buffer capacity in bytes (default: 4096).
    pub fn response_capacity(mut self, bytes: usize) -> Self {
        self.config.capacity = bytes;
        self
    }

    /// Read both FPNC calibration pages into the even column, matching
    /// older tooling (default: off).
    pub fn legacy_calibration_pages(mut self, enabled: bool) -> Self {
        self.legacy_calibration_pages = enabled;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.config.command_timeout.is_zero() {
            return Err(Error::InvalidArgument(
                "command_timeout must be non-zero".into(),
            ));
        }
        if self.config.poll_interval.is_zero() {
            return Err(Error::InvalidArgument(
                "poll_interval must be non-zero".into(),
            ));
        }
        if self.config.capacity < MIN_CAPACITY {
            return Err(Error::InvalidArgument(format!(
                "response_capacity must be at least {MIN_CAPACITY} bytes"
            )));
        }
        if self.baud_rate == Some(0) {
            return Err(Error::InvalidArgument("baud_rate must be non-zero".into()));
        }
        if let Some(geometry) = self.model.capabilities.fpnc {
            if geometry.width < 2 || geometry.width % 2 != 0 || geometry.no_samples == 0 {
                return Err(Error::InvalidArgument(format!(
                    "invalid FPNC geometry {}x{} for {}",
                    geometry.width, geometry.no_samples, self.model.name
                )));
            }
        }
        Ok(())
    }

    /// Build a [`ProVideoDevice`] with a caller-provided transport.
    ///
    /// This is the primary entry point for testing (pass a
    /// `MockTransport` from `provideo-test-harness`) and for
    /// advanced use cases where the caller manages the transport
    /// lifecycle directly.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<ProVideoDevice> {
        self.validate()?;
        let channel = Channel::new(transport, self.config);
        let mut device = ProVideoDevice::new(channel, self.model, self.serial_port);
        device.register_defaults(self.legacy_calibration_pages);
        Ok(device)
    }

    /// Build a [`ProVideoDevice`] using a serial transport.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    /// The baud rate defaults to the model's default if not overridden.
    pub async fn build(self) -> Result<ProVideoDevice> {
        self.validate()?;
        let port = self
            .serial_port
            .as_ref()
            .ok_or_else(|| Error::InvalidArgument("serial_port is required for build()".into()))?;
        let baud = self.baud_rate.unwrap_or(self.model.default_baud_rate);

        let transport = provideo_transport::SerialTransport::open(port, baud).await?;
        info!(port = %port, baud, model = self.model.name, "opened ProVideo device");
        self.build_with_transport(Box::new(transport)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{condor4k, cooper, xbow};
    use provideo_test_harness::MockTransport;

    #[tokio::test]
    async fn builder_defaults() {
        let device = ProVideoBuilder::new(xbow())
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();

        assert_eq!(device.info().model_name, "xbow");
        assert_eq!(*device.channel().config(), EngineConfig::default());
    }

    #[tokio::test]
    async fn builder_custom_settings() {
        let device = ProVideoBuilder::new(condor4k())
            .serial_port("/dev/ttyUSB0")
            .baud_rate(57_600)
            .command_timeout(Duration::from_millis(200))
            .retries(3)
            .poll_interval(Duration::from_millis(2))
            .response_capacity(8192)
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();

        let channel = device.channel();
        let config = channel.config();
        assert_eq!(config.command_timeout, Duration::from_millis(200));
        assert_eq!(config.retries, 3);
        assert_eq!(config.poll_interval, Duration::from_millis(2));
        assert_eq!(config.capacity, 8192);
        assert_eq!(device.info().port.as_deref(), Some("/dev/ttyUSB0"));
    }

    #[tokio::test]
    async fn builder_serial_port_required_for_build() {
        let result = ProVideoBuilder::new(xbow()).build().await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn builder_rejects_bad_settings() {
        let zero_timeout = ProVideoBuilder::new(cooper())
            .command_timeout(Duration::ZERO)
            .build_with_transport(Box::new(MockTransport::new()))
            .await;
        assert!(matches!(zero_timeout, Err(Error::InvalidArgument(_))));

        let tiny_buffer = ProVideoBuilder::new(cooper())
            .response_capacity(16)
            .build_with_transport(Box::new(MockTransport::new()))
            .await;
        assert!(matches!(tiny_buffer, Err(Error::InvalidArgument(_))));

        let zero_baud = ProVideoBuilder::new(cooper())
            .serial_port("/dev/ttyUSB0")
            .baud_rate(0)
            .build()
            .await;
        assert!(matches!(zero_baud, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn builder_rejects_odd_fpnc_width() {
        let mut model = xbow();
        model.capabilities.fpnc = Some(provideo_core::types::FpncGeometry {
            width: 5,
            no_samples: 4,
        });
        let result = ProVideoBuilder::new(model)
            .build_with_transport(Box::new(MockTransport::new()))
            .await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn legacy_flag_reaches_fpnc_driver() {
        use crate::domains::FpncCommands;

        let mut mock = MockTransport::new();
        for page in [0, 1] {
            for offset in [0, 4, 8, 12] {
                mock.expect(
                    format!("fpnc_data {page} 0 {offset}\n").as_bytes(),
                    format!("fpnc_data {page} {page} {page} {page}\nOK\n").as_bytes(),
                );
            }
        }
        let device = ProVideoBuilder::new(xbow())
            .command_timeout(Duration::from_millis(100))
            .poll_interval(Duration::from_millis(5))
            .legacy_calibration_pages(true)
            .build_with_transport(Box::new(mock))
            .await
            .unwrap();

        let (even, odd) = device.fpnc().unwrap().calibration_columns(0).await.unwrap();
        assert_eq!(even, vec![1; 16]);
        assert_eq!(odd, vec![0; 16]);
    }
}
