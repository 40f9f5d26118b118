//! Streaming list accumulator.
//!
//! Some commands answer with a list of records spread over many reads:
//!
//! ```text
//! weight: 1 3\n
//! weight: 2 4\n
//! ...
//! weight: 25 1\n
//! OK\n
//! ```
//!
//! [`Accumulator`] is the state machine that turns such a byte stream into
//! [`Record`]s. It performs no I/O: the caller feeds it whatever a read
//! returned and tells it how long the line has been quiet. [`collect`]
//! wires it to a transport.
//!
//! Records must arrive in order with indices 1, 2, 3, ...; a gap or a
//! repeat is fatal. A record is only accepted once its whole line has
//! arrived and parsed to the declared field count.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace, warn};

use provideo_core::error::{Error, Result};
use provideo_core::transport::Transport;

use crate::buffer::ResponseBuffer;
use crate::descriptor::{ListDescriptor, Termination};
use crate::engine::{self, EngineConfig, READ_CHUNK};
use crate::protocol::{self, LINE_END, StatusLine};

/// State of a list exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    /// Nothing sent yet.
    Idle,
    /// Request sent, records arriving.
    Accumulating,
    /// The list ended normally.
    Complete,
    /// The buffer or the record set exceeded its capacity.
    Overflow,
    /// A record or the terminator was invalid.
    Malformed,
    /// The line went quiet before the list was complete.
    TimedOut,
}

impl ListState {
    /// Whether the state is final.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ListState::Idle | ListState::Accumulating)
    }
}

/// One parsed list record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Position in the list, starting at 1.
    pub index: u32,
    /// The fields after the index.
    pub values: Vec<i64>,
}

/// Reassembles the records of one list reply.
#[derive(Debug)]
pub struct Accumulator<'a> {
    desc: &'a ListDescriptor,
    buffer: ResponseBuffer,
    records: Vec<Record>,
    state: ListState,
}

impl<'a> Accumulator<'a> {
    pub fn new(desc: &'a ListDescriptor, capacity: usize) -> Self {
        Accumulator {
            desc,
            buffer: ResponseBuffer::new(capacity),
            records: Vec::new(),
            state: ListState::Idle,
        }
    }

    /// Mark the request as sent.
    pub fn start(&mut self) {
        self.state = ListState::Accumulating;
    }

    pub fn state(&self) -> ListState {
        self.state
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Take the accepted records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Append freshly read bytes and extract every complete record.
    ///
    /// Returns the state after the scan. A fatal condition is returned as
    /// the matching error and also recorded in [`state`](Self::state).
    pub fn feed(&mut self, data: &[u8]) -> Result<ListState> {
        if self.state != ListState::Accumulating {
            return Ok(self.state);
        }
        if let Err(e) = self.buffer.extend(data) {
            self.state = ListState::Overflow;
            return Err(e);
        }
        if let Err(e) = self.scan() {
            self.state = match e {
                Error::Overflow(_) => ListState::Overflow,
                _ => ListState::Malformed,
            };
            return Err(e);
        }
        Ok(self.state)
    }

    /// Judge the list after the line has been quiet for `quiet`.
    ///
    /// Within the inactivity window nothing changes. Past it, the list is
    /// complete if it could have ended here, otherwise it timed out.
    pub fn idle(&mut self, quiet: Duration) -> Result<ListState> {
        if self.state != ListState::Accumulating || quiet < self.desc.inactivity {
            return Ok(self.state);
        }
        match self.desc.termination {
            Termination::Quiet => {
                self.state = ListState::Complete;
                Ok(self.state)
            }
            Termination::Marker { records } if self.records.len() == records => {
                self.state = ListState::Complete;
                Ok(self.state)
            }
            Termination::Marker { records } => {
                debug!(
                    command = self.desc.command,
                    received = self.records.len(),
                    expected = records,
                    "list went quiet before completion"
                );
                self.state = ListState::TimedOut;
                Err(Error::Timeout)
            }
        }
    }

    /// Extract records and status lines from the front of the buffer.
    fn scan(&mut self) -> Result<()> {
        let marker = self.desc.sync.as_bytes();
        loop {
            let buf = self.buffer.as_bytes();
            let record_at = protocol::find_marker(buf, marker);
            let status = protocol::find_status(buf);

            if let Some((pos, _, line)) = status {
                if record_at.is_none_or(|r| pos < r) {
                    return self.finish(line);
                }
            }

            let Some(start) = record_at else {
                // Only noise (echo, blank lines) so far. Keep the trailing
                // partial line, it may still become a record or status.
                if let Some(last) = buf.iter().rposition(|&b| b == LINE_END) {
                    self.buffer.consume(last + 1);
                }
                return Ok(());
            };

            let fields_at = start + marker.len();
            let Some(end) = protocol::line_end(buf, fields_at) else {
                self.buffer.consume(start);
                return Ok(());
            };

            let line = &buf[fields_at..end];
            let scan = protocol::scan_fields(line, self.desc.kind, self.desc.fields);
            let at_newline = protocol::skip_blanks(line, scan.end) == line.len();
            if scan.values.len() != self.desc.fields || !at_newline {
                return Err(Error::Malformed(format!(
                    "{}: bad record {:?}",
                    self.desc.command,
                    String::from_utf8_lossy(line).trim_end()
                )));
            }

            self.accept(scan.values)?;
            self.buffer.consume(end + 1);
        }
    }

    fn accept(&mut self, fields: Vec<i64>) -> Result<()> {
        let expected = self.records.len() + 1;
        let Some((&index, values)) = fields.split_first() else {
            return Err(Error::Malformed(format!(
                "{}: record without an index",
                self.desc.command
            )));
        };
        if index != expected as i64 {
            return Err(Error::Malformed(format!(
                "{}: record index {index}, expected {expected}",
                self.desc.command
            )));
        }
        if expected > self.desc.max_records {
            warn!(
                command = self.desc.command,
                max = self.desc.max_records,
                "too many list records"
            );
            return Err(Error::Overflow(format!(
                "{}: more than {} records",
                self.desc.command, self.desc.max_records
            )));
        }
        trace!(command = self.desc.command, index, ?values, "record");
        self.records.push(Record {
            index: expected as u32,
            values: values.to_vec(),
        });
        Ok(())
    }

    fn finish(&mut self, line: StatusLine) -> Result<()> {
        match line {
            StatusLine::Failed(reason) => Err(Error::Malformed(format!(
                "{}: list failed: {reason}",
                self.desc.command
            ))),
            StatusLine::Ok => match self.desc.termination {
                Termination::Marker { records } if self.records.len() != records => {
                    Err(Error::AmbiguousTermination(format!(
                        "{}: OK after {} of {records} records",
                        self.desc.command,
                        self.records.len()
                    )))
                }
                _ => {
                    self.state = ListState::Complete;
                    Ok(())
                }
            },
        }
    }
}

/// Send a list request and accumulate its records.
///
/// Polls the transport until the accumulator reaches a final state. The
/// exchange is bounded by the descriptor's inactivity window and, overall,
/// by [`EngineConfig::list_deadline`].
pub async fn collect(
    transport: &mut dyn Transport,
    config: &EngineConfig,
    desc: &ListDescriptor,
    address: &[i64],
) -> Result<Vec<Record>> {
    engine::discard_stale(transport, config).await?;

    let request = protocol::encode_request(desc.command, address, &[], desc.kind);
    debug!(command = desc.command, "requesting list");
    transport.send(&request).await?;

    let mut acc = Accumulator::new(desc, config.capacity);
    acc.start();

    let started = Instant::now();
    let mut last_data = started;
    let mut chunk = [0u8; READ_CHUNK];

    while !acc.state().is_terminal() {
        let n = transport.poll(&mut chunk, config.poll_interval).await?;
        let now = Instant::now();
        if n > 0 {
            last_data = now;
            acc.feed(&chunk[..n])?;
        } else {
            acc.idle(now - last_data)?;
        }
        if !acc.state().is_terminal() && now - started >= config.list_deadline {
            warn!(command = desc.command, "list exceeded its overall deadline");
            return Err(Error::Timeout);
        }
    }

    debug!(command = desc.command, records = acc.records().len(), "list complete");
    Ok(acc.into_records())
}

#[cfg(test)]
mod tests {
    use super::*;
    use provideo_core::error::errno;
    use provideo_test_harness::MockTransport;

    const FIVE: ListDescriptor = ListDescriptor::fixed("items", "item: ", 2, 5);
    const WEIGHTS: ListDescriptor = ListDescriptor::fixed("aec_weights", "weight: ", 2, 25);
    const DEVICES: ListDescriptor =
        ListDescriptor::open_ended("get_device_list", "id: ", 4, 8)
            .with_inactivity(Duration::from_millis(40));

    fn started(desc: &ListDescriptor) -> Accumulator<'_> {
        let mut acc = Accumulator::new(desc, 4096);
        acc.start();
        acc
    }

    fn indices(acc: &Accumulator<'_>) -> Vec<u32> {
        acc.records().iter().map(|r| r.index).collect()
    }

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    #[test]
    fn idle_until_started() {
        let mut acc = Accumulator::new(&FIVE, 64);
        assert_eq!(acc.state(), ListState::Idle);
        assert_eq!(acc.feed(b"item: 1 0\n").unwrap(), ListState::Idle);
        assert!(acc.records().is_empty());
    }

    #[test]
    fn in_order_records_then_ok() {
        let mut acc = started(&FIVE);
        let state = acc
            .feed(b"item: 1 10\nitem: 2 20\nitem: 3 30\nitem: 4 40\nitem: 5 50\nOK\n")
            .unwrap();
        assert_eq!(state, ListState::Complete);
        assert_eq!(indices(&acc), vec![1, 2, 3, 4, 5]);
        assert_eq!(acc.records()[4].values, vec![50]);
    }

    #[test]
    fn records_split_across_reads() {
        let mut acc = started(&FIVE);
        assert_eq!(acc.feed(b"items\nitem: 1 1").unwrap(), ListState::Accumulating);
        assert!(acc.records().is_empty());
        acc.feed(b"0\nitem: 2 20\nit").unwrap();
        assert_eq!(indices(&acc), vec![1, 2]);
        assert_eq!(acc.records()[0].values, vec![10]);
        acc.feed(b"em: 3 30\r\nitem: 4 40\nitem: 5 50\nO").unwrap();
        assert_eq!(acc.state(), ListState::Accumulating);
        assert_eq!(acc.feed(b"K\n").unwrap(), ListState::Complete);
        assert_eq!(indices(&acc), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn index_gap_is_malformed() {
        let mut acc = started(&FIVE);
        let err = acc.feed(b"item: 1 10\nitem: 3 30\n").unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
        assert_eq!(err.errno(), -errno::EFAULT);
        assert_eq!(acc.state(), ListState::Malformed);
        assert_eq!(indices(&acc), vec![1]);
    }

    #[test]
    fn record_without_index_is_malformed() {
        const BARE: ListDescriptor = ListDescriptor::fixed("bare", "bare: ", 0, 1);
        let mut acc = started(&BARE);
        let err = acc.feed(b"bare: \n").unwrap_err();
        assert_eq!(err.errno(), -errno::EFAULT);
        assert_eq!(acc.state(), ListState::Malformed);
        assert!(acc.records().is_empty());
    }

    #[test]
    fn duplicate_index_is_malformed() {
        let mut acc = started(&FIVE);
        assert!(acc.feed(b"item: 1 10\nitem: 1 10\n").is_err());
        assert_eq!(acc.state(), ListState::Malformed);
    }

    #[test]
    fn first_index_must_be_one() {
        let mut acc = started(&FIVE);
        assert!(acc.feed(b"item: 0 10\n").is_err());
    }

    #[test]
    fn short_record_line_is_malformed() {
        let mut acc = started(&FIVE);
        assert!(matches!(acc.feed(b"item: 1\n"), Err(Error::Malformed(_))));
    }

    #[test]
    fn trailing_garbage_rejects_record() {
        let mut acc = started(&FIVE);
        assert!(matches!(acc.feed(b"item: 1 10 junk\n"), Err(Error::Malformed(_))));
    }

    #[test]
    fn failed_forces_malformed() {
        let mut acc = started(&FIVE);
        acc.feed(b"item: 1 10\n").unwrap();
        assert!(matches!(acc.feed(b"FAILED busy\n"), Err(Error::Malformed(_))));
        assert_eq!(acc.state(), ListState::Malformed);
    }

    #[test]
    fn ok_with_wrong_count_is_ambiguous() {
        let mut acc = started(&FIVE);
        let err = acc.feed(b"item: 1 10\nitem: 2 20\nOK\n").unwrap_err();
        assert!(matches!(err, Error::AmbiguousTermination(_)));
        assert_eq!(err.errno(), -errno::EILSEQ);
    }

    #[test]
    fn too_many_records_overflow() {
        let desc = ListDescriptor::fixed("items", "item: ", 2, 2);
        let mut acc = started(&desc);
        let err = acc.feed(b"item: 1 1\nitem: 2 2\nitem: 3 3\n").unwrap_err();
        assert!(matches!(err, Error::Overflow(_)));
        assert_eq!(acc.state(), ListState::Overflow);
        assert_eq!(acc.records().len(), 2);
    }

    #[test]
    fn buffer_overflow() {
        let mut acc = Accumulator::new(&FIVE, 16);
        acc.start();
        let err = acc.feed(b"item: 1 10 and a very long tail").unwrap_err();
        assert_eq!(err.errno(), -errno::ENOMEM);
        assert_eq!(acc.state(), ListState::Overflow);
    }

    #[test]
    fn noise_lines_are_dropped() {
        let mut acc = Accumulator::new(&FIVE, 32);
        acc.start();
        for _ in 0..10 {
            acc.feed(b"# status line\n").unwrap();
        }
        acc.feed(b"item: 1 10\n").unwrap();
        assert_eq!(indices(&acc), vec![1]);
    }

    #[test]
    fn inactivity_before_full_count_times_out() {
        let mut acc = started(&FIVE);
        acc.feed(b"item: 1 10\nitem: 2 20\n").unwrap();
        assert_eq!(
            acc.idle(Duration::from_millis(500)).unwrap(),
            ListState::Accumulating
        );
        assert!(matches!(acc.idle(Duration::from_secs(2)), Err(Error::Timeout)));
        assert_eq!(acc.state(), ListState::TimedOut);
    }

    #[test]
    fn inactivity_after_full_count_completes() {
        let mut acc = started(&FIVE);
        acc.feed(b"item: 1 1\nitem: 2 2\nitem: 3 3\nitem: 4 4\nitem: 5 5\n")
            .unwrap();
        assert_eq!(acc.idle(Duration::from_secs(2)).unwrap(), ListState::Complete);
    }

    #[test]
    fn quiet_list_completes_on_inactivity() {
        let mut acc = started(&DEVICES);
        acc.feed(b"id: 1 3 18 4711\n").unwrap();
        assert_eq!(acc.idle(Duration::from_secs(1)).unwrap(), ListState::Complete);
        assert_eq!(acc.records()[0].values, vec![3, 18, 4711]);
    }

    #[test]
    fn quiet_list_accepts_ok() {
        let mut acc = started(&DEVICES);
        assert_eq!(
            acc.feed(b"id: 1 3 18 4711\nOK\n").unwrap(),
            ListState::Complete
        );
    }

    // -----------------------------------------------------------------------
    // collect over a transport
    // -----------------------------------------------------------------------

    fn test_config() -> EngineConfig {
        EngineConfig {
            poll_interval: Duration::from_millis(5),
            ..EngineConfig::default()
        }
    }

    fn weights_reply() -> Vec<Vec<u8>> {
        let mut lines: Vec<Vec<u8>> = (1..=25)
            .map(|i| format!("weight: {i} {}\n", i % 7).into_bytes())
            .collect();
        lines.push(b"OK\n".to_vec());
        lines
    }

    #[tokio::test]
    async fn collect_weights() {
        let reply = weights_reply();
        let chunks: Vec<&[u8]> = reply.iter().map(|c| c.as_slice()).collect();
        let mut mock = MockTransport::new();
        mock.expect_chunks(b"aec_weights\n", &chunks);

        let records = collect(&mut mock, &test_config(), &WEIGHTS, &[]).await.unwrap();
        assert_eq!(records.len(), 25);
        assert_eq!(records[0].index, 1);
        assert_eq!(records[24].index, 25);
        assert_eq!(records[6].values, vec![0]);
    }

    #[tokio::test]
    async fn collect_device_list_ends_when_quiet() {
        let mut mock = MockTransport::new();
        mock.expect_chunks(
            b"get_device_list\n",
            &[b"id: 1 1 18 1001\n", b"id: 2 2 18 1002\n"],
        );

        let records = collect(&mut mock, &test_config(), &DEVICES, &[]).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].values, vec![2, 18, 1002]);
    }

    #[tokio::test]
    async fn collect_silent_device_list_is_empty() {
        let mut mock = MockTransport::new();
        mock.expect_silence(b"get_device_list\n");

        let records = collect(&mut mock, &test_config(), &DEVICES, &[]).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn collect_short_list_times_out() {
        let desc = FIVE.with_inactivity(Duration::from_millis(40));
        let mut mock = MockTransport::new();
        mock.expect(b"items\n", b"item: 1 10\nitem: 2 20\n");

        let err = collect(&mut mock, &test_config(), &desc, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }

    #[tokio::test]
    async fn collect_out_of_order_fails() {
        let mut mock = MockTransport::new();
        mock.expect(b"items\n", b"item: 1 10\nitem: 3 30\n");

        let err = collect(&mut mock, &test_config(), &FIVE, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
    }

    #[tokio::test]
    async fn collect_respects_overall_deadline() {
        let desc = ListDescriptor::open_ended("stream", "x: ", 1, 1000)
            .with_inactivity(Duration::from_secs(10));
        let config = EngineConfig {
            list_deadline: Duration::from_millis(30),
            ..test_config()
        };
        let mut mock = MockTransport::new();
        mock.expect_silence(b"stream\n");

        let err = collect(&mut mock, &config, &desc, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }
}
