use actix_web::cookie::Key;
use std::path::PathBuf;

const MIN_SESSION_KEY_LEN: usize = 64;

/// Runtime configuration, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub bind_addr: String,
    pub database_url: String,
    pub data_dir: PathBuf,
    pub session_key: Option<String>,
    pub cookie_secure: bool,
    pub admin_email: String,
    pub admin_password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "Semillero".to_string(),
            bind_addr: "127.0.0.1:8080".to_string(),
            database_url: "sqlite://data/semillero.db?mode=rwc".to_string(),
            data_dir: PathBuf::from("data"),
            session_key: None,
            cookie_secure: false,
            admin_email: "admin@semillero.local".to_string(),
            admin_password: "admin123".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        Self {
            app_name: env_or("APP_NAME", defaults.app_name),
            bind_addr: env_or("BIND_ADDR", defaults.bind_addr),
            database_url: env_or("DATABASE_URL", defaults.database_url),
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            session_key: std::env::var("SESSION_KEY").ok(),
            cookie_secure: std::env::var("COOKIE_SECURE")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            admin_email: env_or("ADMIN_EMAIL", defaults.admin_email),
            admin_password: env_or("ADMIN_PASSWORD", defaults.admin_password),
        }
    }

    /// Directory backing the avatar store.
    pub fn avatar_dir(&self) -> PathBuf {
        self.data_dir.join("avatars")
    }

    /// Cookie signing key. Falls back to a random key, which loses sessions on restart.
    pub fn cookie_key(&self) -> Key {
        match &self.session_key {
            Some(val) if val.len() >= MIN_SESSION_KEY_LEN => {
                log::info!("Using SESSION_KEY from environment");
                Key::from(val.as_bytes())
            }
            Some(val) => {
                log::warn!(
                    "SESSION_KEY too short ({} bytes, need {}+), generating random key",
                    val.len(),
                    MIN_SESSION_KEY_LEN
                );
                Key::generate()
            }
            None => {
                log::warn!("No SESSION_KEY set, generating random key (sessions lost on restart)");
                Key::generate()
            }
        }
    }
}

fn env_or(name: &str, default: String) -> String {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default,
    }
}
