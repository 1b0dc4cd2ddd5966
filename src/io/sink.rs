//! Result sinks: where finalized reports go once a session is done.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::scoring::DomainReport;

/// Receiver of finalized domain reports
pub trait ResultSink {
    fn store(&mut self, report: &DomainReport) -> io::Result<()>;
}

/// Writes one pretty-printed `<domain>.json` file per report
///
/// A later report for the same domain overwrites the earlier file.
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    /// Create the sink, creating `dir` if needed
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, report: &DomainReport) -> PathBuf {
        self.dir.join(format!("{}.json", report.domain))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ResultSink for JsonFileSink {
    fn store(&mut self, report: &DomainReport) -> io::Result<()> {
        let path = self.path_for(report);
        let json = serde_json::to_string_pretty(report)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        fs::write(&path, json)?;
        log::info!("[JsonFileSink] Stored {} report at {}", report.domain, path.display());
        Ok(())
    }
}

/// In-memory sink, mostly for tests and embedding hosts
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Vec<DomainReport>,
}

impl MemorySink {
    pub fn reports(&self) -> &[DomainReport] {
        &self.reports
    }
}

impl ResultSink for MemorySink {
    fn store(&mut self, report: &DomainReport) -> io::Result<()> {
        self.reports.push(report.clone());
        Ok(())
    }
}

/// Load a report previously written by [`JsonFileSink`]
pub fn load_report(path: &Path) -> io::Result<DomainReport> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}
