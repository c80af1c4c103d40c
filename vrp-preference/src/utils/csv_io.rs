//! Helpers to read and write flat delimited files used for snapshots, histories and metric logs.

#[cfg(test)]
#[path = "../../tests/unit/utils/csv_io_test.rs"]
mod csv_io_test;

use super::{PreferenceError, PreferenceResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// A row of a delimited file with a fixed header.
pub(crate) trait CsvRow: Serialize {
    /// Column names in serialization order.
    const HEADER: &'static [&'static str];
}

/// Creates all directories along a path ("mkdir -p").
pub(crate) fn create_dirs(path: &Path) -> PreferenceResult<()> {
    if path.is_dir() {
        return Ok(());
    }

    std::fs::create_dir_all(path).map_err(|source| PreferenceError::Io { path: path.to_path_buf(), source })
}

/// Writes all rows into a new file, replacing existing one. Header is written even if there are no rows.
pub(crate) fn write_rows<T, I>(path: &Path, rows: I) -> PreferenceResult<usize>
where
    T: CsvRow,
    I: IntoIterator<Item = T>,
{
    let file = File::create(path).map_err(|source| PreferenceError::Io { path: path.to_path_buf(), source })?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

    writer.write_record(T::HEADER).map_err(|source| csv_error(path, source))?;

    let mut count = 0;
    for row in rows {
        writer.serialize(row).map_err(|source| csv_error(path, source))?;
        count += 1;
    }

    writer.flush().map_err(|source| PreferenceError::Io { path: path.to_path_buf(), source })?;

    Ok(count)
}

/// Appends a single row to a log file. The header is written only when the file is new or empty.
pub(crate) fn append_row<T: CsvRow>(path: &Path, row: T) -> PreferenceResult<()> {
    let is_new = std::fs::metadata(path).map(|meta| meta.len() == 0).unwrap_or(true);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| PreferenceError::Io { path: path.to_path_buf(), source })?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

    if is_new {
        writer.write_record(T::HEADER).map_err(|source| csv_error(path, source))?;
    }

    writer.serialize(row).map_err(|source| csv_error(path, source))?;
    writer.flush().map_err(|source| PreferenceError::Io { path: path.to_path_buf(), source })
}

/// Reads all rows of a headered file. Rows which cannot be parsed are skipped with a warning,
/// only a failure to open or read the file itself is reported as an error.
pub(crate) fn read_rows<T: DeserializeOwned>(path: &Path) -> PreferenceResult<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| csv_error(path, source))?;

    let mut rows = Vec::new();
    for (idx, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(err) if err.is_io_error() => return Err(csv_error(path, err)),
            // NOTE header is line 1, so data row idx is at line idx + 2
            Err(err) => log::warn!("skipping malformed row at line {} of {}: {err}", idx + 2, path.display()),
        }
    }

    Ok(rows)
}

fn csv_error(path: &Path, source: csv::Error) -> PreferenceError {
    PreferenceError::Csv { path: path.to_path_buf(), source }
}
