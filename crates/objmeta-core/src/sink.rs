//! Output sinks: where terminal outcomes go as they arrive.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::batch::FetchOutcome;

/// Consumer of terminal outcomes, called on the aggregating thread in arrival order.
pub trait OutcomeSink {
    fn record(&mut self, outcome: &FetchOutcome) -> io::Result<()>;

    /// Called once after the last outcome.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Collects outcomes in memory.
impl OutcomeSink for Vec<FetchOutcome> {
    fn record(&mut self, outcome: &FetchOutcome) -> io::Result<()> {
        self.push(outcome.clone());
        Ok(())
    }
}

/// Discards outcomes; the returned `BatchResult` still has them.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutcomeSink for NullSink {
    fn record(&mut self, _outcome: &FetchOutcome) -> io::Result<()> {
        Ok(())
    }
}

/// Which attribute a text line reports for successful keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportField {
    #[default]
    Size,
    Encryption,
}

/// One human-readable line per key:
/// `Key: <key> - Size: <n>`, `Key: <key> - Encryption: <sse>` or `Key: <key> - Error: <cause>`.
pub struct LineSink<W: Write> {
    out: W,
    field: ReportField,
}

impl<W: Write> LineSink<W> {
    pub fn new(out: W, field: ReportField) -> Self {
        Self { out, field }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> OutcomeSink for LineSink<W> {
    fn record(&mut self, outcome: &FetchOutcome) -> io::Result<()> {
        match (outcome, self.field) {
            (FetchOutcome::Success { key, size, .. }, ReportField::Size) => {
                writeln!(self.out, "Key: {} - Size: {}", key, size)
            }
            (FetchOutcome::Success { key, encoding, .. }, ReportField::Encryption) => writeln!(
                self.out,
                "Key: {} - Encryption: {}",
                key,
                encoding.as_deref().unwrap_or("none")
            ),
            (FetchOutcome::Failure { key, cause, .. }, _) => {
                writeln!(self.out, "Key: {} - Error: {}", key, cause)
            }
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// One JSON object per line (see `FetchOutcome`'s serde shape).
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> OutcomeSink for JsonLinesSink<W> {
    fn record(&mut self, outcome: &FetchOutcome) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, outcome)?;
        self.out.write_all(b"\n")
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
