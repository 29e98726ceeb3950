use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::dataset::DatasetSchema;
use crate::domain::error::{AppError, Result};
use crate::domain::metadata::MetadataBlock;
use crate::domain::table::Table;

pub const LOCKED_MESSAGE: &str = "Feche o arquivo Excel e tente novamente.";

/// Rewrites `path` with `metadata` above the header row and `table` below it.
///
/// The workbook is built in memory and swapped in through a sibling
/// temporary file, so a failed write leaves the previous file in place.
pub fn save_sheet(
    path: &Path,
    schema: &DatasetSchema,
    metadata: &MetadataBlock,
    table: &Table,
) -> Result<()> {
    let buffer = build_workbook(schema, metadata, table).map_err(xlsx_error)?;
    ensure_writable(path).map_err(|e| io_error(path, e))?;

    let staging = staging_path(path);
    if let Err(e) = fs::write(&staging, &buffer) {
        let _ = fs::remove_file(&staging);
        return Err(io_error(path, e));
    }
    if let Err(e) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(io_error(path, e));
    }

    info!(
        path = %path.display(),
        rows = table.len(),
        bytes = buffer.len(),
        "Saved dataset sheet"
    );
    Ok(())
}

fn build_workbook(
    schema: &DatasetSchema,
    metadata: &MetadataBlock,
    table: &Table,
) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (row, cells) in metadata.iter().enumerate() {
        for (col, value) in cells.iter().enumerate() {
            write_cell(worksheet, row as u32, col as u16, value)?;
        }
    }

    let header_row = schema.layout.header_row;
    for (col, name) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(header_row, col as u16, name.as_str(), &header_format)?;
    }

    for (index, row) in table.rows().iter().enumerate() {
        let sheet_row = header_row + 1 + index as u32;
        for (col, name) in table.columns().iter().enumerate() {
            if let Some(value) = row.get(name) {
                write_cell(worksheet, sheet_row, col as u16, value)?;
            }
        }
    }

    workbook.save_to_buffer()
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
) -> std::result::Result<(), XlsxError> {
    match value {
        Value::Null => {}
        Value::Bool(flag) => {
            worksheet.write_boolean(row, col, *flag)?;
        }
        Value::Number(number) => match number.as_f64() {
            Some(n) if n.is_finite() => {
                worksheet.write_number(row, col, n)?;
            }
            _ => {}
        },
        Value::String(text) => {
            worksheet.write_string(row, col, text.as_str())?;
        }
        other => {
            worksheet.write_string(row, col, other.to_string().as_str())?;
        }
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.saving", name))
}

/// Fails the way an in-place write would when `path` exists but cannot be
/// written: read-only files and files another process holds open.
fn ensure_writable(path: &Path) -> io::Result<()> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if metadata.permissions().readonly() {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "dataset file is read-only",
        ));
    }
    fs::OpenOptions::new().write(true).open(path).map(|_| ())
}

/// True when the OS refused the write because another process holds the file.
pub fn is_lock_error(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
    cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33))
}

fn io_error(path: &Path, err: io::Error) -> AppError {
    if is_lock_error(&err) {
        warn!(path = %path.display(), error = %err, "Dataset file is locked");
        AppError::Locked(LOCKED_MESSAGE.to_string())
    } else {
        AppError::WriteError(format!("{}: {}", path.display(), err))
    }
}

fn xlsx_error(err: XlsxError) -> AppError {
    AppError::WriteError(err.to_string())
}
