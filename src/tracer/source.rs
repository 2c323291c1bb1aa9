//! Event sources feeding the dispatcher.
//!
//! The dispatcher pulls one batch at a time and calls [`EventSource::resume`]
//! only after the whole batch has been processed.

use super::event::{EventBatch, TraceEvent};
use super::subscriptions::Subscriptions;
use crate::utils::error::SourceError;
use log::{debug, warn};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Ordered producer of event batches
pub trait EventSource {
    /// Next batch, or `Ok(None)` at the end of the stream
    ///
    /// # Errors
    /// * `SourceError::Disconnected` - the link to the traced program is gone
    fn next_batch(&mut self) -> Result<Option<EventBatch>, SourceError>;

    /// Let the traced program continue after a batch was processed
    fn resume(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    /// The dispatcher's live requests changed
    fn update_subscriptions(&mut self, _subscriptions: &Subscriptions) {}
}

/// Replays a JSON-lines recording
///
/// Each non-empty line is one batch: an array of events or a single event.
/// Lines starting with `#` are comments. Malformed lines are skipped.
pub struct RecordedEventSource<R> {
    reader: R,
    line_number: usize,
    skipped_lines: usize,
}

impl RecordedEventSource<BufReader<File>> {
    /// Open a recording on disk
    ///
    /// # Errors
    /// * `SourceError::Io` - file cannot be opened
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        debug!("Opening event recording {}", path.display());
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> RecordedEventSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            skipped_lines: 0,
        }
    }

    /// Malformed lines skipped so far
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// Decode one line; bytes that are not UTF-8 fail like any other bad JSON
    fn parse_line(&mut self, line: &[u8]) -> Option<EventBatch> {
        let parsed = if line.starts_with(b"[") {
            serde_json::from_slice::<EventBatch>(line)
        } else {
            serde_json::from_slice::<TraceEvent>(line).map(|event| vec![event])
        };

        match parsed {
            Ok(batch) => Some(batch),
            Err(e) => {
                warn!("Skipping malformed event line {}: {}", self.line_number, e);
                self.skipped_lines += 1;
                None
            }
        }
    }
}

impl<R: BufRead> EventSource for RecordedEventSource<R> {
    fn next_batch(&mut self) -> Result<Option<EventBatch>, SourceError> {
        let mut line = Vec::new();
        loop {
            line.clear();
            if self.reader.read_until(b'\n', &mut line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let trimmed = line.trim_ascii();
            if trimmed.is_empty() || trimmed.starts_with(b"#") {
                continue;
            }
            let trimmed = trimmed.to_vec();
            if let Some(batch) = self.parse_line(&trimmed) {
                return Ok(Some(batch));
            }
        }
    }
}

/// In-memory batches, mostly for tests
#[derive(Debug, Default)]
pub struct MemoryEventSource {
    batches: VecDeque<EventBatch>,
    disconnect_after: Option<usize>,
    delivered: usize,
    resumes: usize,
    subscription_updates: Vec<Subscriptions>,
}

impl MemoryEventSource {
    pub fn new(batches: Vec<EventBatch>) -> Self {
        Self {
            batches: batches.into(),
            ..Self::default()
        }
    }

    /// Fail with `Disconnected` once, after `batches` batches were delivered
    pub fn disconnect_after(mut self, batches: usize) -> Self {
        self.disconnect_after = Some(batches);
        self
    }

    pub fn resumes(&self) -> usize {
        self.resumes
    }

    /// Every subscription change the dispatcher announced, in order
    pub fn subscription_updates(&self) -> &[Subscriptions] {
        &self.subscription_updates
    }
}

impl EventSource for MemoryEventSource {
    fn next_batch(&mut self) -> Result<Option<EventBatch>, SourceError> {
        if self.disconnect_after == Some(self.delivered) {
            self.disconnect_after = None;
            return Err(SourceError::Disconnected);
        }
        let batch = self.batches.pop_front();
        if batch.is_some() {
            self.delivered += 1;
        }
        Ok(batch)
    }

    fn resume(&mut self) -> Result<(), SourceError> {
        self.resumes += 1;
        Ok(())
    }

    fn update_subscriptions(&mut self, subscriptions: &Subscriptions) {
        self.subscription_updates.push(subscriptions.clone());
    }
}
