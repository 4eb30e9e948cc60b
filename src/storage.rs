//! Avatar file store.
//!
//! The profile page posts the picked image as a `data:` URI. It is decoded,
//! size-checked and written as `<profile id>.<ext>` under the avatar
//! directory, which the server exposes at `/avatars`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::AppError;

pub const MAX_AVATAR_BYTES: usize = 512 * 1024;
pub const PUBLIC_PREFIX: &str = "/avatars";

const ALLOWED: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

#[derive(Debug, Clone)]
pub struct AvatarStore {
    dir: PathBuf,
}

/// A decoded upload, ready to be written.
#[derive(Debug, PartialEq, Eq)]
pub struct AvatarImage {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

impl AvatarStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Store the avatar for a profile and return its public URL.
    ///
    /// The URL carries a version query so browsers drop the cached image.
    pub fn save(&self, profile_id: i64, data_uri: &str) -> Result<String, AppError> {
        let image = parse_data_uri(data_uri)?;
        self.ensure_dir()?;
        self.remove_files(profile_id)?;

        let file_name = format!("{profile_id}.{}", image.extension);
        let tmp = self.dir.join(format!(".{file_name}.tmp"));
        fs::write(&tmp, &image.bytes)?;
        fs::rename(&tmp, self.dir.join(&file_name))?;

        log::info!(
            "Stored avatar for profile {profile_id} ({} bytes)",
            image.bytes.len()
        );
        Ok(format!(
            "{PUBLIC_PREFIX}/{file_name}?v={}",
            Utc::now().timestamp()
        ))
    }

    /// Delete any stored avatar for a profile.
    pub fn remove(&self, profile_id: i64) -> Result<(), AppError> {
        self.remove_files(profile_id)
    }

    fn remove_files(&self, profile_id: i64) -> Result<(), AppError> {
        for (_, ext) in ALLOWED {
            let path = self.dir.join(format!("{profile_id}.{ext}"));
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// Decode `data:image/<type>;base64,<payload>`.
pub fn parse_data_uri(data_uri: &str) -> Result<AvatarImage, AppError> {
    let rest = data_uri
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| AppError::BadRequest("La imagen no es válida".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AppError::BadRequest("La imagen no es válida".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| AppError::BadRequest("La imagen debe estar en base64".to_string()))?;
    let extension = ALLOWED
        .iter()
        .find(|(m, _)| m.eq_ignore_ascii_case(mime))
        .map(|(_, ext)| *ext)
        .ok_or_else(|| {
            AppError::BadRequest("Formato no soportado (usa PNG, JPG, WEBP o GIF)".to_string())
        })?;

    // Base64 inflates by 4/3; reject before decoding.
    if payload.len() > MAX_AVATAR_BYTES / 3 * 4 + 4 {
        return Err(too_large());
    }
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| AppError::BadRequest("La imagen no es válida".to_string()))?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("La imagen está vacía".to_string()));
    }
    if bytes.len() > MAX_AVATAR_BYTES {
        return Err(too_large());
    }

    Ok(AvatarImage { extension, bytes })
}

fn too_large() -> AppError {
    AppError::BadRequest("La imagen supera el límite de 512 KB".to_string())
}
