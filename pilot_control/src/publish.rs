//! Actuator publisher seam.
//!
//! The core hands each tick's [`ActuatorCommand`] by value to an
//! [`ActuatorSink`] and keeps no reference to it afterwards. Wire encoding
//! belongs to whatever sits behind the sink.

use std::io::Write;

use pilot_common::controls::command::ActuatorCommand;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("actuator sink I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("actuator command encoding: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Consumer of the per-tick actuator command.
pub trait ActuatorSink {
    fn publish(&mut self, tick: u64, command: ActuatorCommand) -> Result<(), PublishError>;

    /// Push buffered output downstream.
    fn flush(&mut self) -> Result<(), PublishError> {
        Ok(())
    }
}

/// One published record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PublishedCommand {
    pub tick: u64,
    pub command: ActuatorCommand,
}

/// Writes one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ActuatorSink for JsonLinesSink<W> {
    fn publish(&mut self, tick: u64, command: ActuatorCommand) -> Result<(), PublishError> {
        serde_json::to_writer(&mut self.writer, &PublishedCommand { tick, command })?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), PublishError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps every published command in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub published: Vec<PublishedCommand>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&PublishedCommand> {
        self.published.last()
    }
}

impl ActuatorSink for MemorySink {
    fn publish(&mut self, tick: u64, command: ActuatorCommand) -> Result<(), PublishError> {
        self.published.push(PublishedCommand { tick, command });
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
