//! Cluster output writers.

use crate::Result;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use xamsim_algorithms::{ClusterRow, EventRecord};

/// Size of one binary cluster record in bytes.
pub const CLUSTER_RECORD_SIZE: usize = 52;

/// CSV header for cluster rows.
pub const CLUSTER_CSV_HEADER: &str = "event,eh,xh,yh,zh,id,wh";

/// CSV header for per-collection summaries.
pub const SUMMARY_CSV_HEADER: &str = "event,id,name,edet,ndet,nphot,ncomp,nclusters";

/// CSV header for per-event rows.
pub const EVENT_CSV_HEADER: &str = "ev,w,type,xp,yp,zp";

/// Quotes a text field if it holds a separator, quote, or line break.
fn csv_field(text: &str) -> Cow<'_, str> {
    if text.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", text.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(text)
    }
}

/// Output layout for cluster rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowFormat {
    /// Comma-separated text with a header line.
    #[default]
    Csv,
    /// Fixed-size little-endian records.
    Binary,
}

impl RowFormat {
    /// Picks a format from a file extension (`.bin` is binary).
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("bin") => Self::Binary,
            _ => Self::Csv,
        }
    }
}

/// Writes one row per cluster with energy.
pub struct ClusterRowWriter<W: Write> {
    writer: BufWriter<W>,
    format: RowFormat,
    rows: usize,
}

impl ClusterRowWriter<File> {
    /// Creates a writer for a file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, format: RowFormat) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(file, format)
    }
}

impl<W: Write> ClusterRowWriter<W> {
    /// Wraps a writer; CSV output starts with the header line.
    ///
    /// # Errors
    /// Returns an error if the header cannot be written.
    pub fn new(inner: W, format: RowFormat) -> Result<Self> {
        let mut writer = BufWriter::new(inner);
        if format == RowFormat::Csv {
            writeln!(writer, "{CLUSTER_CSV_HEADER}")?;
        }
        Ok(Self {
            writer,
            format,
            rows: 0,
        })
    }

    /// Writes rows.
    ///
    /// Binary layout per row: u64 (event) + f64 (energy) + 3 x f64 (x, y, z)
    /// + i32 (collection id) + f64 (weight), 52 bytes total.
    ///
    /// # Errors
    /// Returns an error on write failure.
    pub fn write_rows(&mut self, rows: &[ClusterRow]) -> Result<()> {
        for row in rows {
            match self.format {
                RowFormat::Csv => writeln!(
                    self.writer,
                    "{},{},{},{},{},{},{}",
                    row.event_id, row.energy_kev, row.x, row.y, row.z, row.collection_id, row.weight
                )?,
                RowFormat::Binary => {
                    self.writer.write_all(&row.event_id.to_le_bytes())?;
                    self.writer.write_all(&row.energy_kev.to_le_bytes())?;
                    self.writer.write_all(&row.x.to_le_bytes())?;
                    self.writer.write_all(&row.y.to_le_bytes())?;
                    self.writer.write_all(&row.z.to_le_bytes())?;
                    self.writer.write_all(&row.collection_id.to_le_bytes())?;
                    self.writer.write_all(&row.weight.to_le_bytes())?;
                }
            }
        }
        self.rows += rows.len();
        Ok(())
    }

    /// Writes the rows of one event.
    ///
    /// # Errors
    /// Returns an error on write failure.
    pub fn write_record(&mut self, record: &EventRecord) -> Result<()> {
        self.write_rows(&record.rows)
    }

    /// Rows written so far.
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error if the flush fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes one CSV line per event and collection.
pub struct SummaryWriter<W: Write> {
    writer: BufWriter<W>,
}

impl SummaryWriter<File> {
    /// Creates a summary file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(File::create(path)?)
    }
}

impl<W: Write> SummaryWriter<W> {
    /// Wraps a writer and writes the header line.
    ///
    /// # Errors
    /// Returns an error if the header cannot be written.
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = BufWriter::new(inner);
        writeln!(writer, "{SUMMARY_CSV_HEADER}")?;
        Ok(Self { writer })
    }

    /// Writes the summaries of one event.
    ///
    /// # Errors
    /// Returns an error on write failure.
    pub fn write_record(&mut self, record: &EventRecord) -> Result<()> {
        for s in &record.summaries {
            writeln!(
                self.writer,
                "{},{},{},{},{},{},{},{}",
                record.event_id,
                s.collection_id,
                csv_field(&s.name),
                s.edet_kev,
                s.ndet,
                s.nphot,
                s.ncomp,
                s.nclusters
            )?;
        }
        Ok(())
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error if the flush fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes one CSV line per event: weight, class, and primary vertex.
///
/// Events without a known vertex are written at the origin.
pub struct EventWriter<W: Write> {
    writer: BufWriter<W>,
}

impl EventWriter<File> {
    /// Creates an event file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(File::create(path)?)
    }
}

impl<W: Write> EventWriter<W> {
    /// Wraps a writer and writes the header line.
    ///
    /// # Errors
    /// Returns an error if the header cannot be written.
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = BufWriter::new(inner);
        writeln!(writer, "{EVENT_CSV_HEADER}")?;
        Ok(Self { writer })
    }

    /// Writes the event line of one record.
    ///
    /// # Errors
    /// Returns an error on write failure.
    pub fn write_record(&mut self, record: &EventRecord) -> Result<()> {
        let vertex = record.primary_vertex.unwrap_or_default();
        writeln!(
            self.writer,
            "{},{},{},{},{},{}",
            record.event_id, record.weight, record.event_type, vertex.x, vertex.y, vertex.z
        )?;
        Ok(())
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error if the flush fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::NamedTempFile;
    use xamsim_algorithms::CollectionSummary;
    use xamsim_core::hit::Position;

    fn sample_rows() -> Vec<ClusterRow> {
        vec![
            ClusterRow {
                event_id: 3,
                energy_kev: 32.5,
                x: 1.0,
                y: -2.0,
                z: 0.25,
                collection_id: 0,
                weight: 1.0,
            },
            ClusterRow {
                event_id: 3,
                energy_kev: 661.7,
                x: 10.0,
                y: 0.0,
                z: -5.0,
                collection_id: 1,
                weight: 1.0,
            },
        ]
    }

    #[test]
    fn test_write_rows_csv() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = ClusterRowWriter::create(file.path(), RowFormat::Csv).unwrap();
        writer.write_rows(&sample_rows()).unwrap();
        assert_eq!(writer.rows_written(), 2);
        writer.flush().unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CLUSTER_CSV_HEADER);
        assert_eq!(lines[1], "3,32.5,1,-2,0.25,0,1");
        assert_eq!(lines[2], "3,661.7,10,0,-5,1,1");
    }

    #[test]
    fn test_write_rows_binary() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = ClusterRowWriter::create(file.path(), RowFormat::Binary).unwrap();
        writer.write_rows(&sample_rows()).unwrap();
        writer.flush().unwrap();

        let bytes = std::fs::read(file.path()).unwrap();
        assert_eq!(bytes.len(), 2 * CLUSTER_RECORD_SIZE);

        let second = &bytes[CLUSTER_RECORD_SIZE..];
        assert_eq!(u64::from_le_bytes(second[0..8].try_into().unwrap()), 3);
        assert_relative_eq!(f64::from_le_bytes(second[8..16].try_into().unwrap()), 661.7);
        assert_relative_eq!(f64::from_le_bytes(second[32..40].try_into().unwrap()), -5.0);
        assert_eq!(i32::from_le_bytes(second[40..44].try_into().unwrap()), 1);
        assert_relative_eq!(f64::from_le_bytes(second[44..52].try_into().unwrap()), 1.0);
    }

    #[test]
    fn test_write_summary() {
        let record = EventRecord {
            event_id: 9,
            summaries: vec![
                CollectionSummary {
                    collection_id: 0,
                    name: "LXeCollection".to_string(),
                    nhits: 12,
                    edet_kev: 100.5,
                    ndet: 2,
                    nphot: 1,
                    ncomp: 1,
                    nclusters: 3,
                },
                CollectionSummary {
                    collection_id: 1,
                    name: "GXeCollection".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let mut buf = Vec::new();
        {
            let mut writer = SummaryWriter::new(&mut buf).unwrap();
            writer.write_record(&record).unwrap();
            writer.flush().unwrap();
        }
        let content = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], SUMMARY_CSV_HEADER);
        assert_eq!(lines[1], "9,0,LXeCollection,100.5,2,1,1,3");
        assert_eq!(lines[2], "9,1,GXeCollection,0,0,0,0,0");
    }

    #[test]
    fn test_summary_quotes_awkward_names() {
        let record = EventRecord {
            event_id: 1,
            summaries: vec![CollectionSummary {
                name: "PMT,top \"A\"Collection".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut buf = Vec::new();
        {
            let mut writer = SummaryWriter::new(&mut buf).unwrap();
            writer.write_record(&record).unwrap();
            writer.flush().unwrap();
        }
        let content = String::from_utf8(buf).unwrap();
        assert_eq!(
            content.lines().nth(1),
            Some("1,0,\"PMT,top \"\"A\"\"Collection\",0,0,0,0,0")
        );
        assert_eq!(csv_field("LXeCollection"), "LXeCollection");
    }

    #[test]
    fn test_write_events() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = EventWriter::create(file.path()).unwrap();
        writer
            .write_record(&EventRecord {
                event_id: 4,
                weight: 0.5,
                event_type: 2,
                primary_vertex: Some(Position::new(1.5, -3.0, 12.0)),
                ..Default::default()
            })
            .unwrap();
        writer
            .write_record(&EventRecord {
                event_id: 5,
                weight: 1.0,
                ..Default::default()
            })
            .unwrap();
        writer.flush().unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec![EVENT_CSV_HEADER, "4,0.5,2,1.5,-3,12", "5,1,0,0,0,0"]);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(RowFormat::from_path("out.bin"), RowFormat::Binary);
        assert_eq!(RowFormat::from_path("out.csv"), RowFormat::Csv);
        assert_eq!(RowFormat::from_path("out"), RowFormat::Csv);
    }
}
