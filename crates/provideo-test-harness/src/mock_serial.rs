//! Mock transport for deterministic testing of the protocol engine.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs. This lets you test request rendering, reply
//! evaluation, list accumulation and retry behaviour without a device.
//!
//! # Example
//!
//! ```
//! use provideo_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // When the engine sends this request, return this reply.
//! mock.expect(b"gain_red\n", b"gain_red 512\nOK\n");
//! // Replies can also arrive split over several reads.
//! mock.expect_chunks(b"aec_weights\n", &[b"weight: 1 3\nwei", b"ght: 2 4\nOK\n"]);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use provideo_core::error::{Error, Result};
use provideo_core::transport::Transport;

/// A pre-loaded request/response pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// The reply, one element per `receive()` call. Empty means the device
    /// stays silent.
    chunks: Vec<Vec<u8>>,
}

/// A mock [`Transport`] for testing protocol engines without hardware.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// data is recorded and matched against the next expectation; its reply
/// chunks are then returned by subsequent `receive()` calls, one chunk (or
/// as much of it as fits the caller's buffer) per call.
///
/// When nothing is pending, `receive()` waits for the caller's timeout and
/// returns [`Error::Timeout`], like a quiet serial line.
#[derive(Debug)]
pub struct MockTransport {
    /// Ordered queue of expected request/response pairs.
    expectations: VecDeque<Expectation>,
    /// Reply chunks pending for the next `receive()` calls.
    pending: VecDeque<Vec<u8>>,
    /// Error to return from the next `receive()` call.
    injected_error: Option<Error>,
    /// Whether the transport is "connected".
    connected: bool,
    /// Log of all bytes sent through this transport.
    sent_log: Vec<Vec<u8>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            expectations: VecDeque::new(),
            pending: VecDeque::new(),
            injected_error: None,
            connected: true,
            sent_log: Vec::new(),
        }
    }

    /// Add an expected request/response pair.
    ///
    /// When `send()` is called with data matching `request`, the
    /// subsequent `receive()` call returns `response`.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expect_chunks(request, &[response]);
    }

    /// Add an expected request whose reply arrives over several reads.
    pub fn expect_chunks(&mut self, request: &[u8], chunks: &[&[u8]]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            chunks: chunks.iter().map(|c| c.to_vec()).collect(),
        });
    }

    /// Add an expected request the device never answers.
    pub fn expect_silence(&mut self, request: &[u8]) {
        self.expect_chunks(request, &[]);
    }

    /// Queue bytes that arrive without being asked for (stale replies,
    /// line noise).
    pub fn push_unsolicited(&mut self, data: &[u8]) {
        self.pending.push_back(data.to_vec());
    }

    /// Make the next `receive()` call fail with `error`.
    pub fn inject_receive_error(&mut self, error: Error) {
        self.injected_error = Some(error);
    }

    /// Return a reference to all data that has been sent through this transport.
    ///
    /// Each element is the byte slice from one `send()` call.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Sent data decoded as text, one entry per `send()` call.
    pub fn sent_lines(&self) -> Vec<String> {
        self.sent_log
            .iter()
            .map(|d| String::from_utf8_lossy(d).into_owned())
            .collect()
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent `send()` and `receive()` calls will
    /// return [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        self.sent_log.push(data.to_vec());

        if let Some(expectation) = self.expectations.pop_front() {
            if data != expectation.request.as_slice() {
                return Err(Error::Protocol(format!(
                    "unexpected send data: expected {:?}, got {:?}",
                    String::from_utf8_lossy(&expectation.request),
                    String::from_utf8_lossy(data)
                )));
            }
            self.pending.extend(expectation.chunks);
            Ok(())
        } else {
            Err(Error::Protocol(format!(
                "no more expectations in mock transport (sent {:?})",
                String::from_utf8_lossy(data)
            )))
        }
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        if let Some(error) = self.injected_error.take() {
            return Err(error);
        }

        match self.pending.pop_front() {
            Some(mut chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    // Leave the rest for the next read.
                    chunk.drain(..n);
                    self.pending.push_front(chunk);
                }
                Ok(n)
            }
            None => {
                tokio::time::sleep(timeout).await;
                Err(Error::Timeout)
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.pending.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
