use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The whole offline dataset. Persisted as one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineDocument {
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
    #[serde(default)]
    pub asistencias: Vec<Asistencia>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub title: String,
    pub leader: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Presente,
    Ausente,
    Excusa,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Presente => "presente",
            AttendanceStatus::Ausente => "ausente",
            AttendanceStatus::Excusa => "excusa",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "presente" => Ok(AttendanceStatus::Presente),
            "ausente" => Ok(AttendanceStatus::Ausente),
            "excusa" => Ok(AttendanceStatus::Excusa),
            other => Err(format!("estado desconocido: {other}")),
        }
    }
}

/// Attendance of one member at one session. At most one per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asistencia {
    pub session_id: Uuid,
    pub member_id: Uuid,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMember {
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSession {
    pub title: String,
    pub leader: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetAttendance {
    pub session_id: Uuid,
    pub member_id: Uuid,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub note: Option<String>,
}

impl OfflineDocument {
    pub fn member(&self, id: Uuid) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn session(&self, id: Uuid) -> Option<&SessionRecord> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Check the cross references an imported document must satisfy.
    pub fn validate(&self) -> Result<(), String> {
        let mut member_ids = HashSet::new();
        for m in &self.members {
            if m.full_name.trim().is_empty() {
                return Err(format!("el miembro {} no tiene nombre", m.id));
            }
            if !member_ids.insert(m.id) {
                return Err(format!("miembro duplicado: {}", m.id));
            }
        }

        let mut session_ids = HashSet::new();
        for s in &self.sessions {
            if s.title.trim().is_empty() {
                return Err(format!("la sesión {} no tiene título", s.id));
            }
            if !session_ids.insert(s.id) {
                return Err(format!("sesión duplicada: {}", s.id));
            }
        }

        let mut pairs = HashSet::new();
        for a in &self.asistencias {
            if !session_ids.contains(&a.session_id) {
                return Err(format!("asistencia con sesión inexistente: {}", a.session_id));
            }
            if !member_ids.contains(&a.member_id) {
                return Err(format!("asistencia con miembro inexistente: {}", a.member_id));
            }
            if !pairs.insert((a.session_id, a.member_id)) {
                return Err(format!(
                    "asistencia duplicada para sesión {} y miembro {}",
                    a.session_id, a.member_id
                ));
            }
        }
        Ok(())
    }
}
