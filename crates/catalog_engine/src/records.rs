use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use catalog_core::{Company, ExcludeSet};

pub const CONTACT_HEADER: [&str; 4] = ["name", "email", "group", "url"];

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// One output row; a company yields one per email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRow {
    pub name: String,
    pub email: String,
    pub group: String,
    pub url: String,
}

pub fn contact_rows(company: &Company) -> Vec<ContactRow> {
    company
        .emails()
        .iter()
        .map(|email| ContactRow {
            name: company.name().to_string(),
            email: email.clone(),
            group: company.section_name().to_string(),
            url: company.contact_url().to_string(),
        })
        .collect()
}

pub trait CompanySink {
    /// Writes the company's rows and returns how many were written.
    fn write_company(&mut self, company: &Company) -> Result<usize, RecordError>;
}

pub struct CsvCompanySink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvCompanySink<W> {
    pub fn new(inner: W, write_header: bool) -> Result<Self, RecordError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        if write_header {
            writer.write_record(CONTACT_HEADER)?;
            writer.flush()?;
        }
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> Result<W, RecordError> {
        self.writer
            .into_inner()
            .map_err(|err| RecordError::Io(err.into_error()))
    }
}

impl CsvCompanySink<File> {
    /// Opens the output file. The header goes out when overwriting or when the
    /// file is new or empty.
    pub fn open(path: &Path, append: bool) -> Result<Self, RecordError> {
        let has_content = path.metadata().map(|meta| meta.len() > 0).unwrap_or(false);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)?;
        Self::new(file, !append || !has_content)
    }
}

impl<W: Write> CompanySink for CsvCompanySink<W> {
    fn write_company(&mut self, company: &Company) -> Result<usize, RecordError> {
        let rows = contact_rows(company);
        for row in &rows {
            self.writer.serialize(row)?;
        }
        // Flushed per company so an aborted run keeps what it collected.
        self.writer.flush()?;
        Ok(rows.len())
    }
}

#[derive(Debug, Deserialize)]
struct ExcludeRecord {
    url: String,
}

/// Reads the `url` column of a CSV with a header row, usually an earlier output.
pub fn read_exclude_set<R: io::Read>(reader: R) -> Result<ExcludeSet, RecordError> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut urls = Vec::new();
    for record in reader.deserialize::<ExcludeRecord>() {
        urls.push(record?.url);
    }
    Ok(urls.into_iter().collect())
}

pub fn load_exclude_set(path: &Path) -> Result<ExcludeSet, RecordError> {
    read_exclude_set(File::open(path)?)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSizeRow {
    pub group: String,
    pub num_companies: u64,
}

pub fn write_section_sizes<W: Write>(inner: W, rows: &[SectionSizeRow]) -> Result<(), RecordError> {
    let mut writer = csv::Writer::from_writer(inner);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
