//! CSV sink for the per-reading control log.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use toaster_core::{CycleRecord, RECORD_HEADER, RecordSink, ToasterError};

pub struct CsvRecordSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvRecordSink<File> {
    /// Create (truncate) `path` and write the header row.
    pub fn create(path: &Path) -> eyre::Result<Self> {
        let io = |e: &dyn std::fmt::Display| {
            ToasterError::Io(format!("record file {}: {e}", path.display()))
        };
        let file = File::create(path).map_err(|e| io(&e))?;
        Ok(Self::new(file).map_err(|e| io(&e))?)
    }
}

impl<W: Write> CsvRecordSink<W> {
    pub fn new(inner: W) -> csv::Result<Self> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(inner);
        writer.write_record(RECORD_HEADER)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> Option<W> {
        self.writer.into_inner().ok()
    }
}

impl<W: Write> RecordSink for CsvRecordSink<W> {
    fn write(
        &mut self,
        record: &CycleRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.writer.write_record(record.fields())?;
        // One row per second; flushing keeps the file useful if the run dies.
        self.writer.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toaster_core::{Action, CountingStatus, Phase, PhaseEstimate, PowerLevel};

    #[test]
    fn header_then_quoted_rows() {
        let mut sink = CsvRecordSink::new(Vec::new()).unwrap();
        let rec = CycleRecord {
            elapsed_s: 1.0,
            power: PowerLevel::Baseline,
            phase: Phase::Goldening,
            r: 150,
            g: 120,
            b: 90,
            expected: 150.4,
            difference: -0.4,
            action: Action::OnTrack,
            effective_s: 1.0,
            valid: true,
            estimate: PhaseEstimate::default(),
            counting: CountingStatus::Disabled,
        };
        sink.write(&rec).unwrap();
        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("TimeElapsed,PowerLevel,Phase,R,G,B,ExpectedR,Difference,Action,EffectiveTime")
        );
        assert_eq!(
            lines.next(),
            Some("1,80,goldening,150,120,90,150.4,-0.4,\"On track, maintaining 80% power\",1")
        );
    }
}
