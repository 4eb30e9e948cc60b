//! Offline variant: members, sessions and asistencias kept in one local
//! JSON document, with CSV and JSON export.

pub mod errors;
pub mod export;
pub mod handlers;
pub mod store;
pub mod types;

pub use errors::OfflineError;
pub use export::{CsvKind, to_csv};
pub use store::JsonOfflineStore;
pub use types::*;

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct OfflineConfig {
    pub bind_addr: String,
    pub store_path: PathBuf,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8090".to_string(),
            store_path: PathBuf::from("data/offline.json"),
        }
    }
}

impl OfflineConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("OFFLINE_BIND").unwrap_or(defaults.bind_addr),
            store_path: std::env::var("OFFLINE_STORE")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
        }
    }
}
