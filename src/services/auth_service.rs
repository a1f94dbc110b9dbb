//! Credential lifecycle contract: login, recovery-code issuance and
//! verification, reset, and authenticated password change.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or incomplete request input; the message is client-facing
    #[error("{0}")]
    Validation(String),

    #[error("Usuario no encontrado")]
    NotFound,

    #[error("Contraseña incorrecta")]
    InvalidCredentials,

    #[error("La contraseña actual es incorrecta")]
    WrongCurrentPassword,

    #[error("Código inválido")]
    InvalidCode,

    #[error("Código expirado")]
    ExpiredCode,

    #[error("La nueva contraseña debe ser diferente a la actual")]
    PasswordUnchanged,

    #[error("Demasiadas solicitudes, intenta más tarde")]
    Throttled,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Account fields safe to return to clients. Never carries the hash.
#[derive(Debug, Clone, Serialize)]
pub struct UsuarioSummary {
    pub id: i32,
    pub nombre: String,
    pub email: String,
    pub rol: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub token: String,
    pub usuario: UsuarioSummary,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Verify credentials and issue a session token
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Generate a recovery code for the account and deliver it out of band
    async fn request_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Check a recovery code without consuming it
    async fn verify_code(&self, email: &str, codigo: i32) -> Result<(), AuthError>;

    /// Consume a recovery code and install a new password
    async fn reset_password(
        &self,
        email: &str,
        codigo: i32,
        nueva_password: &str,
    ) -> Result<(), AuthError>;

    /// Change password for an authenticated account, re-verifying the
    /// current password first
    async fn change_password(
        &self,
        usuario_id: i32,
        password_actual: &str,
        password_nueva: &str,
    ) -> Result<(), AuthError>;
}

/// Password policy for the authenticated change path. Checks run in a fixed
/// order so the first failure determines the message.
pub fn check_password_policy(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < 8 {
        return Err(AuthError::Validation(
            "La contraseña debe tener al menos 8 caracteres".to_string(),
        ));
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(AuthError::Validation(
            "La contraseña debe tener al menos una letra mayúscula".to_string(),
        ));
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(AuthError::Validation(
            "La contraseña debe tener al menos una letra minúscula".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::Validation(
            "La contraseña debe tener al menos un número".to_string(),
        ));
    }
    Ok(())
}

/// Six-digit recovery code, uniform over [100000, 999999]
pub fn generate_reset_code() -> i32 {
    use rand::Rng;
    rand::rng().random_range(100_000..=999_999)
}
