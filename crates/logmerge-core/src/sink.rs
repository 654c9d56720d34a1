// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Output side of a merge.
//!
//! Sinks receive entries in non-decreasing timestamp order and one completion
//! signal after the last entry. Mergers hand an entry to [`Sink::print`] before
//! removing it from the frontier, so a failed write never loses it.

use std::error::Error as StdError;
use std::io::{self, BufWriter, Write};

use thiserror::Error;

use crate::entry::Entry;

/// A sink write or completion failed.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SinkError {
    message: String,
    #[source]
    cause: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl SinkError {
    /// Failure described only by a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Failure wrapping an underlying error.
    pub fn new(cause: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        let cause = cause.into();
        Self {
            message: cause.to_string(),
            cause: Some(cause),
        }
    }
}

impl From<io::Error> for SinkError {
    fn from(err: io::Error) -> Self {
        Self::new(err)
    }
}

/// Consumer of merged entries.
pub trait Sink {
    /// Writes one entry. Order-sensitive.
    fn print(&mut self, entry: &Entry) -> Result<(), SinkError>;

    /// Signals that no further entries follow. Called exactly once per run.
    fn done(&mut self) -> Result<(), SinkError>;
}

impl<K: Sink + ?Sized> Sink for &mut K {
    fn print(&mut self, entry: &Entry) -> Result<(), SinkError> {
        (**self).print(entry)
    }

    fn done(&mut self) -> Result<(), SinkError> {
        (**self).done()
    }
}

/// Collects entries in memory.
impl Sink for Vec<Entry> {
    fn print(&mut self, entry: &Entry) -> Result<(), SinkError> {
        self.push(entry.clone());
        Ok(())
    }

    fn done(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Writes one `"<timestamp> <payload>"` line per entry through a buffer and
/// flushes on completion.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    out: BufWriter<W>,
    written: u64,
}

impl<W: Write> WriterSink<W> {
    /// Wraps `out` in a buffered writer.
    pub fn new(out: W) -> Self {
        Self {
            out: BufWriter::new(out),
            written: 0,
        }
    }

    /// Lines written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, SinkError> {
        self.out
            .into_inner()
            .map_err(|err| SinkError::new(err.into_error()))
    }
}

impl<W: Write> Sink for WriterSink<W> {
    fn print(&mut self, entry: &Entry) -> Result<(), SinkError> {
        writeln!(self.out, "{entry}")?;
        self.written += 1;
        Ok(())
    }

    fn done(&mut self) -> Result<(), SinkError> {
        self.out.flush()?;
        Ok(())
    }
}
