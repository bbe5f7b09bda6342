use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

pub const NAME_MAX_LEN: usize = 150;
pub const CELLPHONE_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 6;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trims `value` and checks it is non-empty and at most `max` characters.
pub fn required_text(value: &str, label: &str, max: usize) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::bad_request(format!("O campo {label} é obrigatório.")));
    }
    if value.chars().count() > max {
        return Err(AppError::bad_request(format!(
            "O campo {label} deve ter no máximo {max} caracteres."
        )));
    }
    Ok(value.to_string())
}

pub fn name(value: &str) -> Result<String, AppError> {
    required_text(value, "nome", NAME_MAX_LEN)
}

pub fn cellphone(value: &str) -> Result<String, AppError> {
    required_text(value, "celular", CELLPHONE_MAX_LEN)
}

pub fn category(value: &str) -> Result<String, AppError> {
    required_text(value, "categoria", NAME_MAX_LEN)
}

pub fn email(value: &str) -> Result<String, AppError> {
    let email = normalize_email(value);
    if !is_valid_email(&email) {
        return Err(AppError::bad_request("Email inválido."));
    }
    Ok(email)
}

/// Password rules for a new password and its confirmation.
pub fn new_password(password: &str, confirm: &str) -> Result<(), AppError> {
    if password != confirm {
        return Err(AppError::bad_request("As senhas não são iguais"));
    }
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(AppError::bad_request(format!(
            "A senha deve ter pelo menos {PASSWORD_MIN_LEN} caracteres."
        )));
    }
    Ok(())
}
