use actix_session::Session;

use crate::errors::AppError;
use crate::models::profile::{Profile, Role};

pub const USER_ID_KEY: &str = "user_id";
const USERNAME_KEY: &str = "username";
const FULL_NAME_KEY: &str = "full_name";
const ROLE_KEY: &str = "role";
const FLASH_KEY: &str = "flash";
const SCANNED_KEY: &str = "scanned_meetings";

/// The authenticated caller, passed explicitly to handlers and services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProfile {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

impl SessionProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Store the identity of a freshly authenticated profile.
pub fn sign_in(session: &Session, profile: &Profile) -> Result<(), AppError> {
    session.renew();
    session
        .insert(USER_ID_KEY, profile.id)
        .and_then(|_| session.insert(USERNAME_KEY, &profile.username))
        .and_then(|_| session.insert(FULL_NAME_KEY, &profile.full_name))
        .and_then(|_| session.insert(ROLE_KEY, profile.role.as_str()))
        .map_err(|e| AppError::Session(format!("Failed to store session: {e}")))
}

/// Refresh the cached display fields after a profile edit or role change.
pub fn refresh(session: &Session, profile: &Profile) {
    let _ = session.insert(USERNAME_KEY, &profile.username);
    let _ = session.insert(FULL_NAME_KEY, &profile.full_name);
    let _ = session.insert(ROLE_KEY, profile.role.as_str());
}

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>(USER_ID_KEY).unwrap_or(None)
}

/// Load the caller from the session, failing when the session is incomplete.
pub fn current_profile(session: &Session) -> Result<SessionProfile, AppError> {
    let id = get_user_id(session).ok_or_else(|| AppError::Session("Not authenticated".to_string()))?;
    let username = read_string(session, USERNAME_KEY)?;
    let full_name = read_string(session, FULL_NAME_KEY)?;
    let role = read_string(session, ROLE_KEY)?
        .parse::<Role>()
        .map_err(AppError::Session)?;
    Ok(SessionProfile { id, username, full_name, role })
}

/// Like `current_profile`, but only admins get through.
pub fn require_admin(session: &Session) -> Result<SessionProfile, AppError> {
    let profile = current_profile(session)?;
    if profile.is_admin() {
        Ok(profile)
    } else {
        Err(AppError::PermissionDenied("admin role required".to_string()))
    }
}

fn read_string(session: &Session, key: &str) -> Result<String, AppError> {
    match session.get::<String>(key) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(AppError::Session(format!("No {key} in session"))),
        Err(e) => Err(AppError::Session(format!("Session error: {e}"))),
    }
}

pub fn set_flash(session: &Session, message: &str) {
    let _ = session.insert(FLASH_KEY, message);
}

pub fn take_flash(session: &Session) -> Option<String> {
    let flash = session.get::<String>(FLASH_KEY).unwrap_or(None);
    if flash.is_some() {
        session.remove(FLASH_KEY);
    }
    flash
}

/// Meetings this session has already checked into.
pub fn scanned_meetings(session: &Session) -> Vec<i64> {
    session.get::<Vec<i64>>(SCANNED_KEY).unwrap_or(None).unwrap_or_default()
}

pub fn mark_scanned(session: &Session, meeting_id: i64) {
    let mut scanned = scanned_meetings(session);
    if !scanned.contains(&meeting_id) {
        scanned.push(meeting_id);
        let _ = session.insert(SCANNED_KEY, scanned);
    }
}
