use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::types::{CreadoResponse, CrearRolRequest, EstadoResponse, RolDto, RolesResponse};
use super::{ApiError, AppState};

fn map_db(e: anyhow::Error) -> ApiError {
    ApiError::DatabaseError(e.to_string())
}

/// GET /api/roles
/// Roles with their permissions and per-role user counts
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RolesResponse>, ApiError> {
    let roles = state.store().list_roles().await.map_err(map_db)?;

    Ok(Json(RolesResponse {
        success: true,
        roles: roles.into_iter().map(RolDto::from).collect(),
    }))
}

/// POST /api/roles
pub async fn create_rol(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CrearRolRequest>,
) -> Result<Json<CreadoResponse>, ApiError> {
    if payload.nombre.is_empty() {
        return Err(ApiError::validation("El nombre del rol es requerido"));
    }

    let id = state
        .store()
        .create_rol(&payload.nombre, &payload.descripcion)
        .await
        .map_err(map_db)?;

    Ok(Json(CreadoResponse {
        success: true,
        id,
        message: "Rol creado correctamente".to_string(),
    }))
}

/// DELETE /api/roles/{id}
/// System roles cannot be removed
pub async fn delete_rol(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<EstadoResponse>, ApiError> {
    match state.store().rol_es_sistema(id).await.map_err(map_db)? {
        None => return Err(ApiError::NotFound("Rol no encontrado".to_string())),
        Some(true) => {
            return Err(ApiError::Forbidden(
                "No se puede eliminar un rol del sistema".to_string(),
            ));
        }
        Some(false) => {}
    }

    state.store().delete_rol(id).await.map_err(map_db)?;

    Ok(Json(EstadoResponse::ok("Rol eliminado correctamente")))
}
