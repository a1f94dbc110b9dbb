use axum::{Json, extract::State};
use std::sync::Arc;

use super::types::{
    CambiarPasswordRequest, EstadoResponse, ForgotPasswordRequest, LoginRequest, LoginResponse,
    ResetPasswordRequest, VerifyCodeRequest, parse_codigo,
};
use super::{ApiError, AppState};
use crate::services::AuthError;

/// POST /api/auth/login
/// Verify credentials, returns a session token and the account summary
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email y contraseña requeridos"));
    }

    let result = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await
        .map_err(|e| match e {
            AuthError::NotFound => ApiError::Unauthorized("Usuario no encontrado".to_string()),
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Contraseña incorrecta".to_string())
            }
            AuthError::Validation(msg) => ApiError::ValidationError(msg),
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            other => ApiError::internal(other.to_string()),
        })?;

    Ok(Json(LoginResponse {
        success: true,
        token: result.token,
        usuario: result.usuario,
    }))
}

/// POST /api/forgot-password
/// Issue a recovery code and deliver it to the account's address.
/// Domain failures come back as HTTP 200 with `success: false`.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<EstadoResponse>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email requerido"));
    }

    match state.auth_service.request_reset(&payload.email).await {
        Ok(()) => Ok(Json(EstadoResponse::ok("Código enviado al correo"))),
        Err(AuthError::NotFound) => Ok(Json(EstadoResponse::fallo("Usuario no encontrado"))),
        Err(AuthError::Throttled) => Err(ApiError::TooManyRequests(
            AuthError::Throttled.to_string(),
        )),
        Err(AuthError::Database(msg)) => Err(ApiError::DatabaseError(msg)),
        Err(other) => Err(ApiError::internal(other.to_string())),
    }
}

/// POST /api/verify-code
/// Check a recovery code without consuming it
pub async fn verify_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyCodeRequest>,
) -> Result<Json<EstadoResponse>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email y código requeridos"));
    }

    let Some(codigo) = parse_codigo(&payload.codigo) else {
        return Ok(Json(EstadoResponse::fallo("Código inválido")));
    };

    match state.auth_service.verify_code(&payload.email, codigo).await {
        Ok(()) => Ok(Json(EstadoResponse::ok("Código válido"))),
        Err(e @ (AuthError::NotFound | AuthError::InvalidCode | AuthError::ExpiredCode)) => {
            Ok(Json(EstadoResponse::fallo(e.to_string())))
        }
        Err(AuthError::Database(msg)) => Err(ApiError::DatabaseError(msg)),
        Err(other) => Err(ApiError::internal(other.to_string())),
    }
}

/// POST /api/reset-password
/// Consume a recovery code and install a new password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<EstadoResponse>, ApiError> {
    if payload.email.is_empty() || payload.nueva_password.is_empty() {
        return Err(ApiError::validation("Todos los campos son requeridos"));
    }

    let Some(codigo) = parse_codigo(&payload.codigo) else {
        return Ok(Json(EstadoResponse::fallo("Código inválido")));
    };

    match state
        .auth_service
        .reset_password(&payload.email, codigo, &payload.nueva_password)
        .await
    {
        Ok(()) => Ok(Json(EstadoResponse::ok(
            "Contraseña actualizada correctamente",
        ))),
        Err(e @ (AuthError::NotFound | AuthError::InvalidCode | AuthError::ExpiredCode)) => {
            Ok(Json(EstadoResponse::fallo(e.to_string())))
        }
        Err(AuthError::Database(msg)) => Err(ApiError::DatabaseError(msg)),
        Err(other) => Err(ApiError::internal(other.to_string())),
    }
}

/// POST /api/cambiar-password
/// Change password for a signed-in account, re-verifying the current one.
/// Unlike the recovery endpoints this one reports failures with real
/// status codes.
pub async fn cambiar_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CambiarPasswordRequest>,
) -> Result<Json<EstadoResponse>, ApiError> {
    let (Some(usuario_id), false, false) = (
        payload.usuario_id,
        payload.password_actual.is_empty(),
        payload.password_nueva.is_empty(),
    ) else {
        return Err(ApiError::validation("Todos los campos son requeridos"));
    };

    state
        .auth_service
        .change_password(usuario_id, &payload.password_actual, &payload.password_nueva)
        .await
        .map_err(|e| match e {
            AuthError::Validation(msg) => ApiError::ValidationError(msg),
            AuthError::NotFound => ApiError::NotFound("Usuario no encontrado".to_string()),
            AuthError::WrongCurrentPassword => ApiError::Unauthorized(
                AuthError::WrongCurrentPassword.to_string(),
            ),
            AuthError::PasswordUnchanged => {
                ApiError::ValidationError(AuthError::PasswordUnchanged.to_string())
            }
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            other => ApiError::internal(other.to_string()),
        })?;

    Ok(Json(EstadoResponse::ok(
        "Contraseña actualizada correctamente",
    )))
}
