use axum::{Json, extract::State};
use std::sync::Arc;

use super::types::{ActividadDto, DashboardResponse, DashboardStats};
use super::{ApiError, AppState};

const ACTIVIDAD_RECIENTE_LIMIT: u64 = 5;

/// GET /api/dashboard/data
/// Aggregate counts plus the most recent activity entries
pub async fn get_dashboard_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let store = state.store();

    let total_usuarios = store.count_usuarios().await;
    let administradores = store.count_active_by_rol("admin").await;
    let instructores = store.count_active_by_rol("instructor").await;
    let estudiantes = store.count_active_by_rol("student").await;
    let inactivos = store.count_inactivos().await;
    let reciente = store.recent_actividad(ACTIVIDAD_RECIENTE_LIMIT).await;

    let map_db = |e: anyhow::Error| ApiError::DatabaseError(e.to_string());

    Ok(Json(DashboardResponse {
        success: true,
        stats: DashboardStats {
            total_usuarios: total_usuarios.map_err(map_db)?,
            administradores_activos: administradores.map_err(map_db)?,
            instructores_activos: instructores.map_err(map_db)?,
            estudiantes_activos: estudiantes.map_err(map_db)?,
            usuarios_inactivos: inactivos.map_err(map_db)?,
        },
        actividad_reciente: reciente
            .map_err(map_db)?
            .into_iter()
            .map(ActividadDto::from)
            .collect(),
    }))
}
