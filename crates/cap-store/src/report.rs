use anyhow::{bail, Context, Result};
use cap_reconcile::ReportRow;
use cap_schemas::RecordKind;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Append sink for audit rows, keyed by record kind.
pub trait ReportSink: Send {
    /// Append rows of one kind. Returns the number of rows written.
    fn append(&mut self, kind: RecordKind, rows: &[ReportRow]) -> Result<usize>;
}

pub fn report_file_name(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Cluster => "Clusters.csv",
        RecordKind::ClusterHost => "ClusterHosts.csv",
        RecordKind::Datastore => "Datastores.csv",
        RecordKind::Vm => "Instances.csv",
    }
}

/// One CSV per kind under `dir`. The header is written when the file is new
/// (or empty); after that, rows are only ever appended.
pub struct CsvReportSink {
    dir: PathBuf,
}

impl CsvReportSink {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).with_context(|| format!("create_dir_all {:?}", dir))?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, kind: RecordKind) -> PathBuf {
        self.dir.join(report_file_name(kind))
    }
}

impl ReportSink for CsvReportSink {
    fn append(&mut self, kind: RecordKind, rows: &[ReportRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        if let Some(stray) = rows.iter().find(|r| r.kind() != kind) {
            bail!(
                "{} row passed to the {} report",
                stray.kind().as_str(),
                kind.as_str()
            );
        }

        let path = self.path_for(kind);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open report {:?}", path))?;
        let is_new = file
            .metadata()
            .with_context(|| format!("stat report {:?}", path))?
            .len()
            == 0;

        let mut w = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_new {
            let mut header: Vec<&str> = ReportRow::header(kind).to_vec();
            header.push("Timestamp");
            w.write_record(&header).context("write report header")?;
        }

        let ts = Utc::now().to_rfc3339();
        for row in rows {
            let mut cells = row.cells();
            cells.push(ts.clone());
            w.write_record(&cells).context("write report row")?;
        }
        w.flush().with_context(|| format!("flush report {:?}", path))?;

        Ok(rows.len())
    }
}
