//! State snapshot ingest seam.
//!
//! A [`TickSource`] yields one [`TickInputs`] per tick, or `None` when the
//! stream ends. The core never holds on to a snapshot past its tick.
//!
//! The replay format is JSON lines: one `TickInputs` object per line. Blank
//! lines and lines starting with `#` are skipped.
//!
//! ```text
//! {"vehicle":{"v_ego":12.0},"events":["buttonEnable"]}
//! {"vehicle":{"v_ego":12.1},"lat_plan":{"curvature":0.002}}
//! ```

use std::io::BufRead;

use pilot_common::controls::snapshot::TickInputs;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("tick source I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Producer of per-tick inputs.
pub trait TickSource {
    fn next_tick(&mut self) -> Result<Option<TickInputs>, IngestError>;
}

/// Replays a JSON-lines recording.
#[derive(Debug)]
pub struct JsonLinesSource<R: BufRead> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Number of lines consumed so far.
    pub fn line(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> TickSource for JsonLinesSource<R> {
    fn next_tick(&mut self) -> Result<Option<TickInputs>, IngestError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            let text = self.buf.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            return serde_json::from_str(text)
                .map(Some)
                .map_err(|source| IngestError::Parse {
                    line: self.line,
                    source,
                });
        }
    }
}

/// Adapts any iterator of inputs, mostly for tests and benchmarks.
#[derive(Debug, Clone)]
pub struct IterSource<I>(pub I);

impl<I: Iterator<Item = TickInputs>> TickSource for IterSource<I> {
    fn next_tick(&mut self) -> Result<Option<TickInputs>, IngestError> {
        Ok(self.0.next())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
