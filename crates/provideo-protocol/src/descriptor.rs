//! Declarative command descriptors.
//!
//! Every command a domain table issues is described by a `const`
//! descriptor: the command name, the marker that locates its value line in
//! the reply, the field format and count, and optional timeout and retry
//! overrides. Descriptors are plain data; the engine interprets them.

use std::time::Duration;

use crate::protocol::FieldKind;

/// Description of a single-shot command (one request, at most one value line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Command name sent on the wire.
    pub command: &'static str,
    /// Marker that starts the value line of the reply. Empty for commands
    /// that return no value.
    pub sync: &'static str,
    /// Format of the value fields.
    pub kind: FieldKind,
    /// Number of value fields the command reads and writes.
    pub fields: usize,
    /// Per-command timeout, overriding the engine default.
    pub timeout: Option<Duration>,
    /// Per-command retry count, overriding the engine default.
    pub retries: Option<u32>,
}

impl CommandDescriptor {
    /// A decimal command whose value line is `"<sync><fields...>"`.
    pub const fn new(command: &'static str, sync: &'static str, fields: usize) -> Self {
        CommandDescriptor {
            command,
            sync,
            kind: FieldKind::Decimal,
            fields,
            timeout: None,
            retries: None,
        }
    }

    /// A command that takes and returns no values (`save_settings`, `play`).
    pub const fn action(command: &'static str) -> Self {
        Self::new(command, "", 0)
    }

    /// Switch the value fields to hex.
    pub const fn hex(mut self) -> Self {
        self.kind = FieldKind::Hex;
        self
    }

    /// Override the exchange timeout.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the retry count.
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }
}

/// How a list reply ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A fixed number of records followed by the success token. Going
    /// quiet after the full count also completes the list.
    Marker { records: usize },
    /// Unknown length; the list is complete once the line stays quiet for
    /// the inactivity window (or the success token arrives).
    Quiet,
}

/// Description of a command answered by a stream of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListDescriptor {
    /// Command name sent on the wire.
    pub command: &'static str,
    /// Marker that starts every record line.
    pub sync: &'static str,
    /// Format of the record fields.
    pub kind: FieldKind,
    /// Fields per record, including the leading record index.
    pub fields: usize,
    /// Upper bound on accepted records.
    pub max_records: usize,
    /// How the list ends.
    pub termination: Termination,
    /// How long the line may stay silent before the list is judged.
    pub inactivity: Duration,
}

impl ListDescriptor {
    /// A list of exactly `records` entries, terminated by the success token.
    pub const fn fixed(
        command: &'static str,
        sync: &'static str,
        fields: usize,
        records: usize,
    ) -> Self {
        ListDescriptor {
            command,
            sync,
            kind: FieldKind::Decimal,
            fields,
            max_records: records,
            termination: Termination::Marker { records },
            inactivity: Duration::from_secs(1),
        }
    }

    /// A list of up to `max_records` entries that ends when the line goes quiet.
    pub const fn open_ended(
        command: &'static str,
        sync: &'static str,
        fields: usize,
        max_records: usize,
    ) -> Self {
        ListDescriptor {
            command,
            sync,
            kind: FieldKind::Decimal,
            fields,
            max_records,
            termination: Termination::Quiet,
            inactivity: Duration::from_secs(1),
        }
    }

    /// Override the inactivity window.
    pub const fn with_inactivity(mut self, inactivity: Duration) -> Self {
        self.inactivity = inactivity;
        self
    }

    /// Switch the record fields to hex.
    pub const fn hex(mut self) -> Self {
        self.kind = FieldKind::Hex;
        self
    }
}
