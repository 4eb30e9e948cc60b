use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::errors::OfflineError;
use super::types::*;

/// File-backed offline dataset.
///
/// Every mutation reads the whole document, replaces it in memory and
/// writes it back through a temp file and rename. The mutex serializes
/// read-modify-write cycles between workers sharing one store.
#[derive(Clone)]
pub struct JsonOfflineStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonOfflineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<OfflineDocument, OfflineError> {
        let _guard = self.guard();
        self.read_state()
    }

    pub fn add_member(&self, input: NewMember) -> Result<Member, OfflineError> {
        let full_name = required(&input.full_name, "nombre")?;
        let _guard = self.guard();
        let mut state = self.read_state()?;

        let member = Member {
            id: Uuid::new_v4(),
            full_name,
            email: optional(input.email),
            phone: optional(input.phone),
            created_at: Utc::now(),
        };
        state.members.push(member.clone());
        self.write_state(&state)?;
        log::info!("Offline member added: {}", member.id);
        Ok(member)
    }

    /// Remove a member and every attendance entry that references it.
    pub fn remove_member(&self, id: Uuid) -> Result<(), OfflineError> {
        let _guard = self.guard();
        let mut state = self.read_state()?;

        let before = state.members.len();
        state.members.retain(|m| m.id != id);
        if state.members.len() == before {
            return Err(OfflineError::NotFound("member"));
        }
        state.asistencias.retain(|a| a.member_id != id);
        self.write_state(&state)?;
        log::info!("Offline member removed: {id}");
        Ok(())
    }

    pub fn add_session(&self, input: NewSession) -> Result<SessionRecord, OfflineError> {
        let title = required(&input.title, "título")?;
        let leader = required(&input.leader, "líder")?;
        let _guard = self.guard();
        let mut state = self.read_state()?;

        let session = SessionRecord {
            id: Uuid::new_v4(),
            title,
            leader,
            date: input.date,
        };
        state.sessions.push(session.clone());
        self.write_state(&state)?;
        log::info!("Offline session added: {}", session.id);
        Ok(session)
    }

    /// Remove a session and its attendance entries.
    pub fn remove_session(&self, id: Uuid) -> Result<(), OfflineError> {
        let _guard = self.guard();
        let mut state = self.read_state()?;

        let before = state.sessions.len();
        state.sessions.retain(|s| s.id != id);
        if state.sessions.len() == before {
            return Err(OfflineError::NotFound("session"));
        }
        state.asistencias.retain(|a| a.session_id != id);
        self.write_state(&state)?;
        log::info!("Offline session removed: {id}");
        Ok(())
    }

    /// Record attendance for a (session, member) pair, replacing any previous entry.
    pub fn set_attendance(&self, input: SetAttendance) -> Result<Asistencia, OfflineError> {
        let _guard = self.guard();
        let mut state = self.read_state()?;

        if state.session(input.session_id).is_none() {
            return Err(OfflineError::NotFound("session"));
        }
        if state.member(input.member_id).is_none() {
            return Err(OfflineError::NotFound("member"));
        }

        let entry = Asistencia {
            session_id: input.session_id,
            member_id: input.member_id,
            status: input.status,
            note: optional(input.note),
            recorded_at: Utc::now(),
        };
        match state
            .asistencias
            .iter_mut()
            .find(|a| a.session_id == entry.session_id && a.member_id == entry.member_id)
        {
            Some(existing) => *existing = entry.clone(),
            None => state.asistencias.push(entry.clone()),
        }
        self.write_state(&state)?;
        Ok(entry)
    }

    pub fn export_json(&self) -> Result<String, OfflineError> {
        let state = self.load()?;
        Ok(serde_json::to_string_pretty(&state)?)
    }

    /// Replace the dataset with an exported document.
    ///
    /// Nothing is written unless the document parses and validates.
    pub fn import_json(&self, raw: &str) -> Result<OfflineDocument, OfflineError> {
        let document: OfflineDocument = serde_json::from_str(raw)?;
        document.validate().map_err(OfflineError::Invalid)?;

        let _guard = self.guard();
        self.write_state(&document)?;
        log::info!(
            "Offline import: {} members, {} sessions, {} asistencias",
            document.members.len(),
            document.sessions.len(),
            document.asistencias.len()
        );
        Ok(document)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_state(&self) -> Result<OfflineDocument, OfflineError> {
        if !self.path.exists() {
            return Ok(OfflineDocument::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(OfflineDocument::default());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_state(&self, state: &OfflineDocument) -> Result<(), OfflineError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp_path = self.path.with_extension("tmp");
        let serialized = serde_json::to_string_pretty(state)?;
        fs::write(&tmp_path, serialized)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn required(value: &str, field: &str) -> Result<String, OfflineError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OfflineError::Invalid(format!("el campo {field} es obligatorio")));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
