/// Validate a username: 2-50 chars, alphanumeric, underscore, dot or hyphen.
pub fn validate_username(username: &str) -> Option<String> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Some("El usuario es obligatorio".to_string());
    }
    if trimmed.chars().count() < 2 {
        return Some("El usuario debe tener al menos 2 caracteres".to_string());
    }
    if trimmed.chars().count() > 50 {
        return Some("El usuario debe tener como máximo 50 caracteres".to_string());
    }
    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Some("El usuario solo puede contener letras, números, '_', '.' y '-'".to_string());
    }
    None
}

/// Validate an email: must contain '@' and '.', max 254 chars.
pub fn validate_email(email: &str) -> Option<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Some("El correo es obligatorio".to_string());
    }
    if trimmed.len() > 254 {
        return Some("El correo debe tener como máximo 254 caracteres".to_string());
    }
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => None,
        _ => Some("El correo no es válido".to_string()),
    }
}

/// Validate a password: min 8 chars.
pub fn validate_password(password: &str) -> Option<String> {
    if password.is_empty() {
        return Some("La contraseña es obligatoria".to_string());
    }
    if password.chars().count() < 8 {
        return Some("La contraseña debe tener al menos 8 caracteres".to_string());
    }
    None
}

/// Validate an optional phone number: digits, spaces, '+' and '-' only, 7-20 chars.
pub fn validate_phone(phone: &str) -> Option<String> {
    let trimmed = phone.trim();
    if trimmed.is_empty() {
        return None;
    }
    let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-'))
        || !(7..=20).contains(&digits)
    {
        return Some("El teléfono no es válido".to_string());
    }
    None
}

/// Validate a required text field with a max length.
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} es obligatorio"));
    }
    if trimmed.chars().count() > max_len {
        return Some(format!("{field_name} debe tener como máximo {max_len} caracteres"));
    }
    None
}
