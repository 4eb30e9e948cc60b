use serde::Serialize;
use std::str::FromStr;

use super::errors::OfflineError;
use super::types::OfflineDocument;

/// Which collection a CSV export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvKind {
    Members,
    Sessions,
    Asistencias,
}

impl CsvKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            CsvKind::Members => "miembros.csv",
            CsvKind::Sessions => "sesiones.csv",
            CsvKind::Asistencias => "asistencias.csv",
        }
    }
}

impl FromStr for CsvKind {
    type Err = OfflineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "members" | "miembros" => Ok(CsvKind::Members),
            "sessions" | "sesiones" => Ok(CsvKind::Sessions),
            "asistencias" => Ok(CsvKind::Asistencias),
            _ => Err(OfflineError::NotFound("export")),
        }
    }
}

#[derive(Serialize)]
struct MemberRow<'a> {
    id: String,
    nombre: &'a str,
    email: &'a str,
    telefono: &'a str,
}

#[derive(Serialize)]
struct SessionRow<'a> {
    id: String,
    titulo: &'a str,
    lider: &'a str,
    fecha: String,
}

#[derive(Serialize)]
struct AsistenciaRow<'a> {
    sesion: &'a str,
    fecha: String,
    miembro: &'a str,
    estado: &'static str,
    nota: &'a str,
}

/// Render one collection as CSV with a header row.
///
/// Fields holding a delimiter, quote or line break are quoted, with inner
/// quotes doubled.
pub fn to_csv(document: &OfflineDocument, kind: CsvKind) -> Result<String, OfflineError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    match kind {
        CsvKind::Members => {
            for m in &document.members {
                writer.serialize(MemberRow {
                    id: m.id.to_string(),
                    nombre: &m.full_name,
                    email: m.email.as_deref().unwrap_or(""),
                    telefono: m.phone.as_deref().unwrap_or(""),
                })?;
            }
            if document.members.is_empty() {
                writer.write_record(["id", "nombre", "email", "telefono"])?;
            }
        }
        CsvKind::Sessions => {
            for s in &document.sessions {
                writer.serialize(SessionRow {
                    id: s.id.to_string(),
                    titulo: &s.title,
                    lider: &s.leader,
                    fecha: s.date.format("%Y-%m-%d").to_string(),
                })?;
            }
            if document.sessions.is_empty() {
                writer.write_record(["id", "titulo", "lider", "fecha"])?;
            }
        }
        CsvKind::Asistencias => {
            for a in &document.asistencias {
                let session = document.session(a.session_id);
                let member = document.member(a.member_id);
                writer.serialize(AsistenciaRow {
                    sesion: session.map_or("", |s| s.title.as_str()),
                    fecha: session
                        .map(|s| s.date.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                    miembro: member.map_or("", |m| m.full_name.as_str()),
                    estado: a.status.as_str(),
                    nota: a.note.as_deref().unwrap_or(""),
                })?;
            }
            if document.asistencias.is_empty() {
                writer.write_record(["sesion", "fecha", "miembro", "estado", "nota"])?;
            }
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| OfflineError::Io(std::io::Error::other(e.to_string())))?;
    String::from_utf8(bytes).map_err(|e| OfflineError::Invalid(e.to_string()))
}
