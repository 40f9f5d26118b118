//! The parameter engine: request/response exchanges with retry.
//!
//! One exchange is: discard stale input, send the request line, poll the
//! transport and re-evaluate the accumulated reply after every read until
//! it is complete or the deadline passes. Timeouts and transport failures
//! are retried up to the command's retry count; device failures and
//! malformed replies are not.
//!
//! These functions borrow the transport for the whole exchange, so at most
//! one request is in flight per channel. [`Channel`](crate::Channel) wraps
//! them behind a mutex for shared use.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace, warn};

use provideo_core::error::{Error, Result, errno};
use provideo_core::transport::Transport;

use crate::buffer::ResponseBuffer;
use crate::descriptor::CommandDescriptor;
use crate::evaluator::{self, Evaluation};
use crate::protocol::{self, FieldKind};

/// Size of a single transport read.
pub(crate) const READ_CHUNK: usize = 256;

/// Upper bound on stale reads discarded before a request.
const MAX_STALE_READS: usize = 64;

/// Engine settings shared by every exchange on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Timeout of one attempt, unless the command overrides it.
    pub command_timeout: Duration,
    /// Retries after the first attempt, unless the command overrides it.
    pub retries: u32,
    /// How long a single poll of the transport waits for data.
    pub poll_interval: Duration,
    /// Capacity of the response buffer of one exchange.
    pub capacity: usize,
    /// Error number reported for a `FAILED` line without a usable reason.
    pub failure_code: i32,
    /// Hard limit on the duration of a list exchange.
    pub list_deadline: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            command_timeout: Duration::from_secs(1),
            retries: 0,
            poll_interval: Duration::from_millis(10),
            capacity: 4096,
            failure_code: -errno::EIO,
            list_deadline: Duration::from_secs(60),
        }
    }
}

impl EngineConfig {
    fn timeout_for(&self, desc: &CommandDescriptor) -> Duration {
        desc.timeout.unwrap_or(self.command_timeout)
    }

    fn retries_for(&self, desc: &CommandDescriptor) -> u32 {
        desc.retries.unwrap_or(self.retries)
    }
}

/// Run a command that takes no values and completes on `OK`.
pub async fn run(
    transport: &mut dyn Transport,
    config: &EngineConfig,
    desc: &CommandDescriptor,
) -> Result<()> {
    let request = protocol::encode_request(desc.command, &[], &[], desc.kind);
    exchange(transport, config, desc, &request, |buf| {
        evaluator::evaluate_status(buf, config.failure_code)
    })
    .await
}

/// Read the values of a command.
///
/// `address` arguments (table index, page/column/offset) are appended to
/// the request line in decimal. Returns exactly `desc.fields` values.
pub async fn get(
    transport: &mut dyn Transport,
    config: &EngineConfig,
    desc: &CommandDescriptor,
    address: &[i64],
) -> Result<Vec<i64>> {
    let request = protocol::encode_request(desc.command, address, &[], desc.kind);
    exchange(transport, config, desc, &request, |buf| {
        evaluator::evaluate_value(buf, desc, config.failure_code)
    })
    .await
}

/// Write the values of a command and wait for `OK`.
///
/// `values` must hold exactly `desc.fields` entries; otherwise the call
/// fails with [`Error::InvalidArgument`] before anything is sent.
pub async fn set(
    transport: &mut dyn Transport,
    config: &EngineConfig,
    desc: &CommandDescriptor,
    address: &[i64],
    values: &[i64],
) -> Result<()> {
    check_values(desc, values)?;
    let request = protocol::encode_request(desc.command, address, values, desc.kind);
    exchange(transport, config, desc, &request, |buf| {
        evaluator::evaluate_status(buf, config.failure_code)
    })
    .await
}

/// Validate outgoing values against the descriptor.
fn check_values(desc: &CommandDescriptor, values: &[i64]) -> Result<()> {
    if values.len() != desc.fields {
        return Err(Error::InvalidArgument(format!(
            "{} takes {} values, got {}",
            desc.command,
            desc.fields,
            values.len()
        )));
    }
    if desc.kind == FieldKind::Hex {
        if let Some(v) = values.iter().find(|v| !(0..=i64::from(u32::MAX)).contains(*v)) {
            return Err(Error::InvalidArgument(format!(
                "{}: {v} does not fit a 32-bit hex field",
                desc.command
            )));
        }
    }
    Ok(())
}

/// Drive one request to completion, retrying retryable failures.
async fn exchange<T>(
    transport: &mut dyn Transport,
    config: &EngineConfig,
    desc: &CommandDescriptor,
    request: &[u8],
    mut evaluate: impl FnMut(&[u8]) -> Evaluation<T>,
) -> Result<T> {
    let retries = config.retries_for(desc);
    let timeout = config.timeout_for(desc);

    let mut attempt = 0;
    loop {
        debug!(command = desc.command, attempt, "sending request");
        match attempt_once(transport, config, request, timeout, &mut evaluate).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < retries => {
                attempt += 1;
                warn!(command = desc.command, attempt, retries, error = %e, "retrying command");
            }
            Err(e) => {
                debug!(command = desc.command, attempt, error = %e, "command failed");
                return Err(e);
            }
        }
    }
}

/// One send/poll/evaluate cycle bounded by `timeout`.
async fn attempt_once<T>(
    transport: &mut dyn Transport,
    config: &EngineConfig,
    request: &[u8],
    timeout: Duration,
    evaluate: &mut impl FnMut(&[u8]) -> Evaluation<T>,
) -> Result<T> {
    discard_stale(transport, config).await?;
    transport.send(request).await?;

    let deadline = Instant::now() + timeout;
    let mut buffer = ResponseBuffer::new(config.capacity);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = transport.poll(&mut chunk, config.poll_interval).await?;
        if n > 0 {
            buffer.extend(&chunk[..n])?;
            match evaluate(buffer.as_bytes()) {
                Evaluation::Incomplete => {}
                Evaluation::Complete(value) => return Ok(value),
                Evaluation::Failed(e) => return Err(e),
            }
        }
        if Instant::now() >= deadline {
            trace!(
                pending = %String::from_utf8_lossy(buffer.as_bytes()).escape_debug(),
                "no complete reply before deadline"
            );
            return Err(Error::Timeout);
        }
    }
}

/// Throw away bytes left on the channel by an earlier exchange.
pub(crate) async fn discard_stale(
    transport: &mut dyn Transport,
    config: &EngineConfig,
) -> Result<()> {
    let mut chunk = [0u8; READ_CHUNK];
    for _ in 0..MAX_STALE_READS {
        let n = transport.poll(&mut chunk, Duration::ZERO).await?;
        if n == 0 {
            return Ok(());
        }
        trace!(
            bytes = n,
            data = %String::from_utf8_lossy(&chunk[..n]).escape_debug(),
            "discarding stale input"
        );
    }
    warn!(
        limit = MAX_STALE_READS * READ_CHUNK,
        poll_interval = ?config.poll_interval,
        "channel keeps producing data, sending anyway"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use provideo_test_harness::MockTransport;

    const GAIN_RED: CommandDescriptor = CommandDescriptor::new("gain_red", "gain_red ", 1);
    const CC_OFFSET: CommandDescriptor = CommandDescriptor::new("cc_offset", "cc_offset ", 3);
    const FPNC_DATA: CommandDescriptor =
        CommandDescriptor::new("fpnc_data", "fpnc_data ", 4).hex();
    const SAVE: CommandDescriptor = CommandDescriptor::action("save_settings");

    fn test_config() -> EngineConfig {
        EngineConfig {
            command_timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(5),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.command_timeout, Duration::from_secs(1));
        assert_eq!(config.retries, 0);
        assert_eq!(config.poll_interval, Duration::from_millis(10));
        assert_eq!(config.capacity, 4096);
    }

    #[test]
    fn descriptor_overrides_config() {
        let config = EngineConfig::default();
        let slow = GAIN_RED.with_timeout(Duration::from_secs(30)).with_retries(10);
        assert_eq!(config.timeout_for(&slow), Duration::from_secs(30));
        assert_eq!(config.retries_for(&slow), 10);
        assert_eq!(config.timeout_for(&GAIN_RED), Duration::from_secs(1));
    }

    // -----------------------------------------------------------------------
    // get
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn get_single_value() {
        let mut mock = MockTransport::new();
        mock.expect(b"gain_red\n", b"gain_red 512\nOK\n");

        let values = get(&mut mock, &test_config(), &GAIN_RED, &[]).await.unwrap();
        assert_eq!(values, vec![512]);
    }

    #[tokio::test]
    async fn get_reply_split_over_reads() {
        let mut mock = MockTransport::new();
        mock.expect_chunks(b"cc_offset\n", &[b"cc_off", b"set -3 0 ", b"12\nOK\n"]);

        let values = get(&mut mock, &test_config(), &CC_OFFSET, &[]).await.unwrap();
        assert_eq!(values, vec![-3, 0, 12]);
    }

    #[tokio::test]
    async fn get_with_address_and_hex_values() {
        let mut mock = MockTransport::new();
        mock.expect(
            b"fpnc_data 0 6 4\n",
            b"fpnc_data 0x00001001 0x00002002 0x00003003 0x00004004\nOK\n",
        );

        let values = get(&mut mock, &test_config(), &FPNC_DATA, &[0, 6, 4])
            .await
            .unwrap();
        assert_eq!(values, vec![0x1001, 0x2002, 0x3003, 0x4004]);
    }

    #[tokio::test]
    async fn get_addressed_read_skips_request_echo() {
        const LUT_READ_RED: CommandDescriptor =
            CommandDescriptor::new("lut_read_red", "lut_read_red ", 1);
        let mut mock = MockTransport::new();
        mock.expect(b"lut_read_red 17\n", b"lut_read_red 17\nlut_read_red 1023\nOK\n");
        mock.expect(
            b"fpnc_data 2 1 4\n",
            b"fpnc_data 2 1 4\r\nfpnc_data 0x00000010 0x00000020 0x00000030 0x00000040\r\nOK\r\n",
        );

        let values = get(&mut mock, &test_config(), &LUT_READ_RED, &[17])
            .await
            .unwrap();
        assert_eq!(values, vec![1023]);

        let values = get(&mut mock, &test_config(), &FPNC_DATA, &[2, 1, 4])
            .await
            .unwrap();
        assert_eq!(values, vec![0x10, 0x20, 0x30, 0x40]);
    }

    #[tokio::test]
    async fn get_device_failure_is_not_retried() {
        let mut mock = MockTransport::new();
        mock.expect(b"gain_red\n", b"gain_red\nFAILED invalid range\n");

        let config = EngineConfig {
            retries: 3,
            ..test_config()
        };
        let err = get(&mut mock, &config, &GAIN_RED, &[]).await.unwrap_err();
        assert_eq!(err.errno(), -errno::EINVAL);
        assert_eq!(mock.remaining_expectations(), 0);
        assert_eq!(mock.sent_data().len(), 1);
    }

    #[tokio::test]
    async fn get_malformed_is_not_retried() {
        let mut mock = MockTransport::new();
        mock.expect(b"cc_offset\n", b"cc_offset 1 2\nOK\n");

        let config = EngineConfig {
            retries: 2,
            ..test_config()
        };
        let err = get(&mut mock, &config, &CC_OFFSET, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
        assert_eq!(mock.sent_data().len(), 1);
    }

    #[tokio::test]
    async fn get_timeout_without_retries() {
        let mut mock = MockTransport::new();
        mock.expect_silence(b"gain_red\n");

        let err = get(&mut mock, &test_config(), &GAIN_RED, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }

    #[tokio::test]
    async fn get_retries_after_timeout() {
        let mut mock = MockTransport::new();
        mock.expect_silence(b"gain_red\n");
        mock.expect(b"gain_red\n", b"gain_red 256\nOK\n");

        let desc = GAIN_RED.with_retries(1);
        let values = get(&mut mock, &test_config(), &desc, &[]).await.unwrap();
        assert_eq!(values, vec![256]);
        assert_eq!(mock.sent_lines(), vec!["gain_red\n", "gain_red\n"]);
    }

    #[tokio::test]
    async fn get_retries_after_transport_error() {
        let mut mock = MockTransport::new();
        mock.expect(b"gain_red\n", b"gain_red 1\nOK\n");
        mock.inject_receive_error(Error::Transport("framing error".into()));

        let config = EngineConfig {
            retries: 1,
            ..test_config()
        };
        let values = get(&mut mock, &config, &GAIN_RED, &[]).await.unwrap();
        assert_eq!(values, vec![1]);
        assert_eq!(mock.sent_data().len(), 1);
    }

    #[tokio::test]
    async fn get_transport_error_without_retries() {
        let mut mock = MockTransport::new();
        mock.inject_receive_error(Error::Transport("framing error".into()));

        let err = get(&mut mock, &test_config(), &GAIN_RED, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(mock.sent_data().is_empty());
    }

    #[tokio::test]
    async fn get_exhausted_retries_report_timeout() {
        let mut mock = MockTransport::new();
        mock.expect_silence(b"gain_red\n");
        mock.expect_silence(b"gain_red\n");
        mock.expect_silence(b"gain_red\n");

        let desc = GAIN_RED.with_retries(2);
        let err = get(&mut mock, &test_config(), &desc, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn stale_input_is_discarded() {
        let mut mock = MockTransport::new();
        mock.push_unsolicited(b"gain_red 999\nOK\n");
        mock.expect(b"gain_red\n", b"gain_red 1\nOK\n");

        let values = get(&mut mock, &test_config(), &GAIN_RED, &[]).await.unwrap();
        assert_eq!(values, vec![1]);
    }

    #[tokio::test]
    async fn oversized_reply_overflows() {
        let mut mock = MockTransport::new();
        let noise = vec![b'A'; 300];
        mock.expect(b"gain_red\n", &noise);

        let config = EngineConfig {
            capacity: 128,
            ..test_config()
        };
        let err = get(&mut mock, &config, &GAIN_RED, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Overflow(_)));
    }

    // -----------------------------------------------------------------------
    // set / run
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn set_waits_for_ok() {
        let mut mock = MockTransport::new();
        mock.expect_chunks(b"cc_offset 1 -2 3\n", &[b"cc_offset 1 -2 3\n", b"OK\n"]);

        set(&mut mock, &test_config(), &CC_OFFSET, &[], &[1, -2, 3])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn set_wrong_count_fails_before_io() {
        let mut mock = MockTransport::new();
        let err = set(&mut mock, &test_config(), &CC_OFFSET, &[], &[1, 2])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(mock.sent_data().is_empty());
    }

    #[tokio::test]
    async fn set_hex_rejects_negative() {
        let mut mock = MockTransport::new();
        let err = set(&mut mock, &test_config(), &FPNC_DATA, &[0, 0, 0], &[0, 1, -1, 2])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(mock.sent_data().is_empty());
    }

    #[tokio::test]
    async fn set_hex_renders_padded() {
        let mut mock = MockTransport::new();
        mock.expect(
            b"fpnc_data 1 2 0 0x00000001 0x00fff000 0x00000000 0x00abcdef\n",
            b"OK\n",
        );
        set(
            &mut mock,
            &test_config(),
            &FPNC_DATA,
            &[1, 2, 0],
            &[1, 0x00FF_F000, 0, 0x00AB_CDEF],
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn set_failure_reports_device_code() {
        let mut mock = MockTransport::new();
        mock.expect(b"gain_red 9999\n", b"FAILED -34\n");

        let err = set(&mut mock, &test_config(), &GAIN_RED, &[], &[9999])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Device { code: -34, .. }));
    }

    #[tokio::test]
    async fn run_completes_on_ok() {
        let mut mock = MockTransport::new();
        mock.expect(b"save_settings\n", b"save_settings\nOK\n");
        run(&mut mock, &test_config(), &SAVE).await.unwrap();
    }

    #[tokio::test]
    async fn disconnected_transport_is_not_retried() {
        let mut mock = MockTransport::new();
        mock.set_connected(false);
        let config = EngineConfig {
            retries: 5,
            ..test_config()
        };
        let err = run(&mut mock, &config, &SAVE).await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }
}
