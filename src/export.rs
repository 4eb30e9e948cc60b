//! CSV export of a meeting's attendee list.

use chrono::Local;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::attendance::AttendanceRecord;
use crate::models::meeting::Meeting;

#[derive(Serialize)]
struct AttendeeRow<'a> {
    usuario: &'a str,
    nombre: &'a str,
    registrado: String,
}

/// Attendees in the order given, one row each, with a header row.
pub fn attendance_csv(records: &[AttendanceRecord]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for r in records {
        writer
            .serialize(AttendeeRow {
                usuario: &r.username,
                nombre: &r.full_name,
                registrado: r
                    .scanned_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            })
            .map_err(csv_error)?;
    }
    if records.is_empty() {
        writer
            .write_record(["usuario", "nombre", "registrado"])
            .map_err(csv_error)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Io(std::io::Error::other(e.to_string())))?;
    String::from_utf8(bytes).map_err(|e| AppError::Io(std::io::Error::other(e)))
}

/// Download name, e.g. `asistencia-kickoff-2025-03-14.csv`.
pub fn file_name(meeting: &Meeting) -> String {
    let slug: String = meeting
        .name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let slug = if slug.is_empty() { format!("reunion-{}", meeting.id) } else { slug };
    format!("asistencia-{slug}-{}.csv", meeting.local_date().format("%Y-%m-%d"))
}

fn csv_error(e: csv::Error) -> AppError {
    AppError::Io(std::io::Error::other(e))
}
