use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::error::ScrapeError;
use crate::records::{JobDetailRecord, JobLinkRecord};

pub const LINKS_FILE: &str = "LinkedIn_Job_Links.csv";
pub const JOBS_FILE: &str = "LinkedIn_Jobs.csv";
pub const REPORT_FILE: &str = "LinkedIn_Run_Report.json";

const LINK_COLUMNS: [&str; 3] = ["DateTimeReadUTC", "job_id", "job_link"];
const DETAIL_COLUMNS: [&str; 10] = [
    "Date",
    "job_id",
    "Company",
    "Title",
    "Location",
    "Description",
    "WorkMethods",
    "WorkTimes",
    "Link",
    "ReadDateTimeUTC",
];

/// The link table is comma separated, the detail table semicolon separated.
const LINK_DELIMITER: u8 = b',';
const DETAIL_DELIMITER: u8 = b';';

/// The two persisted tables plus the run report, all in one directory.
#[derive(Debug, Clone)]
pub struct TableStore {
    dir: PathBuf,
}

impl TableStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn links_path(&self) -> PathBuf {
        self.dir.join(LINKS_FILE)
    }

    pub fn jobs_path(&self) -> PathBuf {
        self.dir.join(JOBS_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.dir.join(REPORT_FILE)
    }

    /// Empty when the file does not exist yet.
    pub fn load_links(&self) -> Result<Vec<JobLinkRecord>, ScrapeError> {
        read_table(&self.links_path(), LINK_DELIMITER)
    }

    pub fn save_links(&self, rows: &[JobLinkRecord]) -> Result<(), ScrapeError> {
        write_table(&self.links_path(), LINK_DELIMITER, &LINK_COLUMNS, rows)
    }

    /// Empty when the file does not exist yet.
    pub fn load_details(&self) -> Result<Vec<JobDetailRecord>, ScrapeError> {
        read_table(&self.jobs_path(), DETAIL_DELIMITER)
    }

    pub fn save_details(&self, rows: &[JobDetailRecord]) -> Result<(), ScrapeError> {
        write_table(&self.jobs_path(), DETAIL_DELIMITER, &DETAIL_COLUMNS, rows)
    }

    pub fn save_report<T: Serialize>(&self, report: &T) -> Result<(), ScrapeError> {
        let path = self.report_path();
        let tmp = tmp_path(&path);
        let written = (|| -> Result<(), ScrapeError> {
            let mut writer = BufWriter::new(fs::File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, report)?;
            writer.flush()?;
            Ok(())
        })();
        replace_with_tmp(&tmp, &path, written)
    }
}

fn csv_error(path: &Path, source: csv::Error) -> ScrapeError {
    ScrapeError::Csv {
        path: path.display().to_string(),
        source,
    }
}

fn read_table<T: DeserializeOwned>(path: &Path, delimiter: u8) -> Result<Vec<T>, ScrapeError> {
    if !path.exists() {
        debug!(path = %path.display(), "no saved table, starting empty");
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let rows = reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| csv_error(path, e))?;

    debug!(path = %path.display(), rows = rows.len(), "loaded table");
    Ok(rows)
}

// Full overwrite through a sibling temp file, so a crash mid-write keeps the old table.
fn write_table<T: Serialize>(
    path: &Path,
    delimiter: u8,
    columns: &[&str],
    rows: &[T],
) -> Result<(), ScrapeError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = tmp_path(path);
    let written = (|| -> Result<(), ScrapeError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .from_path(&tmp)
            .map_err(|e| csv_error(&tmp, e))?;

        //Header goes out even for an empty table
        writer.write_record(columns).map_err(|e| csv_error(&tmp, e))?;
        for row in rows {
            writer.serialize(row).map_err(|e| csv_error(&tmp, e))?;
        }
        writer.flush()?;
        Ok(())
    })();

    replace_with_tmp(&tmp, path, written)?;
    debug!(path = %path.display(), rows = rows.len(), "saved table");
    Ok(())
}

/// Moves a fully written temp file over `path`, or deletes it when writing failed.
fn replace_with_tmp(tmp: &Path, path: &Path, written: Result<(), ScrapeError>) -> Result<(), ScrapeError> {
    if let Err(e) = written.and_then(|()| fs::rename(tmp, path).map_err(ScrapeError::from)) {
        if let Err(cleanup) = fs::remove_file(tmp) {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %tmp.display(), error = %cleanup, "failed to remove temp file");
            }
        }
        return Err(e);
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
