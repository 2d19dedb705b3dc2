//! Hit stream reader.
//!
//! A hit stream holds one JSON-encoded event per line:
//!
//! ```text
//! {"event_id":0,"weight":1.0,"collections":{"LXeCollection":[{"position":{"x":0.0,"y":0.0,"z":0.0},"time":1.5,"energy_deposit":32.0,"process_type":"phot"}]}}
//! ```
//!
//! Missing fields take their defaults. Blank lines are skipped.

use crate::{Error, Result};
use log::{debug, info};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use xamsim_algorithms::EventHits;

/// Reads events from a JSON-lines hit stream.
pub struct HitStreamReader<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl HitStreamReader<BufReader<File>> {
    /// Opens a hit stream file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        info!("reading hit stream {}", path.as_ref().display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> HitStreamReader<R> {
    /// Wraps any buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Number of lines consumed so far.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line
    }

    /// Reads every remaining event.
    ///
    /// # Errors
    /// Returns the first read or parse error.
    pub fn read_all(self) -> Result<Vec<EventHits>> {
        let events = self.collect::<Result<Vec<_>>>()?;
        debug!("read {} events", events.len());
        Ok(events)
    }

    fn next_event(&mut self) -> Option<Result<EventHits>> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.line += 1;

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }
            return Some(
                serde_json::from_str(text).map_err(|source| Error::InvalidEvent {
                    line: self.line,
                    source,
                }),
            );
        }
    }
}

impl<R: BufRead> Iterator for HitStreamReader<R> {
    type Item = Result<EventHits>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}

/// Reads every event in a hit stream file.
///
/// # Errors
/// Returns an error if the file cannot be read or a line fails to parse.
pub fn read_hit_stream<P: AsRef<Path>>(path: P) -> Result<Vec<EventHits>> {
    HitStreamReader::open(path)?.read_all()
}
