use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::types::{
    ActividadDto, ActividadResponse, ActualizarUsuarioRequest, CreadoResponse, CrearUsuarioRequest,
    EstadoResponse, UsuarioDto, UsuarioResponse, UsuariosResponse,
};
use super::{ApiError, AppState};
use crate::db::{NewUsuario, UsuarioUpdate};

const ACTIVIDAD_LIMIT: u64 = 10;

fn map_db(e: anyhow::Error) -> ApiError {
    ApiError::DatabaseError(e.to_string())
}

/// GET /api/usuarios
pub async fn list_usuarios(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsuariosResponse>, ApiError> {
    let usuarios = state.store().list_usuarios().await.map_err(map_db)?;

    Ok(Json(UsuariosResponse {
        success: true,
        usuarios: usuarios.into_iter().map(UsuarioDto::from).collect(),
    }))
}

/// POST /api/usuarios
pub async fn create_usuario(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CrearUsuarioRequest>,
) -> Result<Json<CreadoResponse>, ApiError> {
    if payload.nombre.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation(
            "Nombre, email y contraseña son requeridos",
        ));
    }

    if state
        .store()
        .get_usuario_by_email(&payload.email)
        .await
        .map_err(map_db)?
        .is_some()
    {
        return Err(ApiError::validation("El email ya está registrado"));
    }

    let new = NewUsuario {
        nombre: payload.nombre,
        documento_identidad: payload.documento_identidad,
        email: payload.email,
        telefono: payload.telefono,
        password: payload.password,
        rol: if payload.rol.is_empty() {
            "student".to_string()
        } else {
            payload.rol
        },
        estado: payload.estado.unwrap_or_else(|| "active".to_string()),
        foto_url: payload.foto_url,
        departamento: payload.departamento,
        ubicacion: payload.ubicacion,
    };

    let id = state
        .store()
        .create_usuario(new, &state.config.security)
        .await
        .map_err(map_db)?;

    Ok(Json(CreadoResponse {
        success: true,
        id,
        message: "Usuario creado correctamente".to_string(),
    }))
}

/// GET /api/usuarios/{id}
/// A miss reports `success: false` in the body, not a 404
pub async fn get_usuario(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    match state.store().get_usuario(id).await.map_err(map_db)? {
        Some(usuario) => Ok(Json(UsuarioResponse {
            success: true,
            usuario: UsuarioDto::from(usuario),
        })
        .into_response()),
        None => Ok(Json(EstadoResponse::fallo("Usuario no encontrado")).into_response()),
    }
}

/// PUT /api/usuarios/{id}
pub async fn update_usuario(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<ActualizarUsuarioRequest>,
) -> Result<Json<EstadoResponse>, ApiError> {
    if payload.nombre.is_empty() || payload.email.is_empty() {
        return Err(ApiError::validation("Nombre y email son requeridos"));
    }

    let update = UsuarioUpdate {
        nombre: payload.nombre,
        documento_identidad: payload.documento_identidad,
        email: payload.email,
        telefono: payload.telefono,
        rol: if payload.rol.is_empty() {
            "student".to_string()
        } else {
            payload.rol
        },
        estado: payload.estado.unwrap_or_else(|| "active".to_string()),
        departamento: payload.departamento,
        ubicacion: payload.ubicacion,
    };

    let updated = state
        .store()
        .update_usuario(id, update)
        .await
        .map_err(map_db)?;

    if !updated {
        return Err(ApiError::NotFound("Usuario no encontrado".to_string()));
    }

    Ok(Json(EstadoResponse::ok("Usuario actualizado correctamente")))
}

/// DELETE /api/usuarios/{id}
pub async fn delete_usuario(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<EstadoResponse>, ApiError> {
    let deleted = state.store().delete_usuario(id).await.map_err(map_db)?;

    if !deleted {
        return Err(ApiError::NotFound("Usuario no encontrado".to_string()));
    }

    Ok(Json(EstadoResponse::ok("Usuario eliminado correctamente")))
}

/// GET /api/perfil/{id}
pub async fn get_perfil(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<UsuarioResponse>, ApiError> {
    let usuario = state
        .store()
        .get_usuario(id)
        .await
        .map_err(map_db)?
        .ok_or_else(|| ApiError::NotFound("Usuario no encontrado".to_string()))?;

    Ok(Json(UsuarioResponse {
        success: true,
        usuario: UsuarioDto::from(usuario),
    }))
}

/// GET /api/actividad/{id}
/// Recent activity entries for one user
pub async fn get_actividad(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ActividadResponse>, ApiError> {
    let entries = state
        .store()
        .actividad_for_usuario(id, ACTIVIDAD_LIMIT)
        .await
        .map_err(map_db)?;

    Ok(Json(ActividadResponse {
        success: true,
        actividad: entries.into_iter().map(ActividadDto::from).collect(),
    }))
}
