use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role assigned to a profile. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }

    /// Label shown in the UI.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Member => "Miembro",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    /// Accepts the stored form plus the Spanish "miembro" used by older records.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "member" | "miembro" => Ok(Role::Member),
            other => Err(format!("Unknown role '{other}'")),
        }
    }
}

/// A profile joined with its login email.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub username: String,
    pub role: Role,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn initial(&self) -> String {
        self.full_name
            .chars()
            .next()
            .unwrap_or('?')
            .to_uppercase()
            .to_string()
    }

    /// Digits of the phone number, for `wa.me` links.
    pub fn phone_digits(&self) -> String {
        self.phone
            .as_deref()
            .unwrap_or("")
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect()
    }
}

/// Credentials row used by the login flow.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Credentials {
    pub id: i64,
    pub password: String,
}

/// Registration input (password already hashed).
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub username: String,
    pub role: Role,
}

/// Fields the owner can change from the settings page.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub username: String,
    pub phone: Option<String>,
}

/// Registration form.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub csrf_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_accepts_legacy_spelling() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("miembro".parse::<Role>().unwrap(), Role::Member);
        assert_eq!("member".parse::<Role>().unwrap(), Role::Member);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn phone_digits_strip_formatting() {
        let p = Profile {
            id: 1,
            email: "a@b.co".into(),
            full_name: "ana".into(),
            username: "ana".into(),
            role: Role::Member,
            avatar_url: None,
            phone: Some("+57 300-123 4567".into()),
        };
        assert_eq!(p.phone_digits(), "573001234567");
        assert_eq!(p.initial(), "A");
    }
}
