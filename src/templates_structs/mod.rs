// Template context structures for Askama templates, organized by page area.

use actix_session::Session;
use sqlx::SqlitePool;

use crate::auth::csrf;
use crate::auth::session::{SessionProfile, current_profile, take_flash};
use crate::errors::AppError;
use crate::models::profile;

mod common;
mod meeting;
mod members;

pub use self::common::{HomeTemplate, LoginTemplate, ProfileTemplate, RegisterTemplate};
pub use self::meeting::{MeetingDetailTemplate, MeetingsAdminTemplate, MeetingsMemberTemplate};
pub use self::members::MembersTemplate;

/// Common context shared by all authenticated pages.
/// Templates access these as `ctx.full_name`, `ctx.is_admin`, etc.
pub struct PageContext {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub is_admin: bool,
    pub role_label: String,
    pub avatar_initial: String,
    pub avatar_url: Option<String>,
    pub flash: Option<String>,
    pub app_name: String,
    pub csrf_token: String,
    pub current_path: String,
}

impl PageContext {
    pub async fn build(
        session: &Session,
        pool: &SqlitePool,
        app_name: &str,
        current_path: &str,
    ) -> Result<Self, AppError> {
        let caller = current_profile(session)?;
        // The avatar can change outside this session (another tab), so read it fresh.
        let avatar_url = profile::find_by_id(pool, caller.id)
            .await?
            .and_then(|p| p.avatar_url);
        Ok(Self::from_parts(session, caller, avatar_url, app_name, current_path))
    }

    fn from_parts(
        session: &Session,
        caller: SessionProfile,
        avatar_url: Option<String>,
        app_name: &str,
        current_path: &str,
    ) -> Self {
        let avatar_initial = caller
            .full_name
            .chars()
            .next()
            .unwrap_or('?')
            .to_uppercase()
            .to_string();
        Self {
            user_id: caller.id,
            is_admin: caller.is_admin(),
            role_label: caller.role.label().to_string(),
            username: caller.username,
            full_name: caller.full_name,
            avatar_initial,
            avatar_url,
            flash: take_flash(session),
            app_name: app_name.to_string(),
            csrf_token: csrf::get_or_create_token(session),
            current_path: current_path.to_string(),
        }
    }

    /// True when the nav link for `prefix` should be highlighted.
    pub fn is_current(&self, prefix: &str) -> bool {
        if prefix == "/" {
            self.current_path == "/"
        } else {
            self.current_path.starts_with(prefix)
        }
    }
}
