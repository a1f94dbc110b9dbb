use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{ActividadEntry, PermisoRow, RolRow, Usuario};
use crate::services::UsuarioSummary;

/// Flat status envelope used by every endpoint that returns no payload.
/// Exactly one of `message` and `error` is present.
#[derive(Debug, Serialize)]
pub struct EstadoResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EstadoResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn fallo(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub usuario: UsuarioSummary,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub codigo: Value,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub codigo: Value,
    #[serde(default, rename = "nuevaPassword")]
    pub nueva_password: String,
}

#[derive(Debug, Deserialize)]
pub struct CambiarPasswordRequest {
    #[serde(default)]
    pub usuario_id: Option<i32>,
    #[serde(default)]
    pub password_actual: String,
    #[serde(default)]
    pub password_nueva: String,
}

/// Clients send the recovery code as either a JSON number or a string.
/// Anything that does not parse to a six-digit-sized integer is treated as
/// a wrong code, not a malformed request.
pub fn parse_codigo(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UsuarioDto {
    pub id: i32,
    pub nombre: String,
    pub documento_identidad: Option<String>,
    pub email: String,
    pub telefono: Option<String>,
    pub rol: String,
    pub estado: String,
    pub foto_url: Option<String>,
    pub departamento: Option<String>,
    pub ubicacion: Option<String>,
    pub creado_en: String,
    pub actualizado_en: String,
}

impl From<Usuario> for UsuarioDto {
    fn from(u: Usuario) -> Self {
        Self {
            id: u.id,
            nombre: u.nombre,
            documento_identidad: u.documento_identidad,
            email: u.email,
            telefono: u.telefono,
            rol: u.rol,
            estado: u.estado,
            foto_url: u.foto_url,
            departamento: u.departamento,
            ubicacion: u.ubicacion,
            creado_en: u.creado_en,
            actualizado_en: u.actualizado_en,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsuariosResponse {
    pub success: bool,
    pub usuarios: Vec<UsuarioDto>,
}

#[derive(Debug, Serialize)]
pub struct UsuarioResponse {
    pub success: bool,
    pub usuario: UsuarioDto,
}

#[derive(Debug, Serialize)]
pub struct CreadoResponse {
    pub success: bool,
    pub id: i32,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CrearUsuarioRequest {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub documento_identidad: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub rol: String,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub foto_url: Option<String>,
    #[serde(default)]
    pub departamento: Option<String>,
    #[serde(default)]
    pub ubicacion: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActualizarUsuarioRequest {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub documento_identidad: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub rol: String,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub departamento: Option<String>,
    #[serde(default)]
    pub ubicacion: Option<String>,
}

// ============================================================================
// Roles
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PermisoDto {
    pub modulo: String,
    pub permiso: String,
    pub descripcion: Option<String>,
    pub permitido: bool,
}

#[derive(Debug, Serialize)]
pub struct RolDto {
    pub id: i32,
    pub nombre: String,
    pub descripcion: String,
    pub es_sistema: bool,
    pub total_usuarios: u64,
    pub permisos: Vec<PermisoDto>,
}

impl From<PermisoRow> for PermisoDto {
    fn from(p: PermisoRow) -> Self {
        Self {
            modulo: p.modulo,
            permiso: p.permiso,
            descripcion: p.descripcion,
            permitido: p.permitido,
        }
    }
}

impl From<RolRow> for RolDto {
    fn from(r: RolRow) -> Self {
        Self {
            id: r.id,
            nombre: r.nombre,
            descripcion: r.descripcion,
            es_sistema: r.es_sistema,
            total_usuarios: r.total_usuarios,
            permisos: r.permisos.into_iter().map(PermisoDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RolesResponse {
    pub success: bool,
    pub roles: Vec<RolDto>,
}

#[derive(Debug, Deserialize)]
pub struct CrearRolRequest {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub descripcion: String,
}

// ============================================================================
// Activity and dashboard
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ActividadDto {
    pub id: i64,
    pub usuario_id: i32,
    pub tipo: Option<String>,
    pub descripcion: String,
    pub modulo: Option<String>,
    pub creado_en: String,
}

impl From<ActividadEntry> for ActividadDto {
    fn from(a: ActividadEntry) -> Self {
        Self {
            id: a.id,
            usuario_id: a.usuario_id,
            tipo: a.tipo,
            descripcion: a.descripcion,
            modulo: a.modulo,
            creado_en: a.creado_en,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActividadResponse {
    pub success: bool,
    pub actividad: Vec<ActividadDto>,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_usuarios: u64,
    pub administradores_activos: u64,
    pub instructores_activos: u64,
    pub estudiantes_activos: u64,
    pub usuarios_inactivos: u64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub stats: DashboardStats,
    pub actividad_reciente: Vec<ActividadDto>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_codigo_accepts_number_and_string() {
        assert_eq!(parse_codigo(&json!(123456)), Some(123456));
        assert_eq!(parse_codigo(&json!("123456")), Some(123456));
        assert_eq!(parse_codigo(&json!(" 123456 ")), Some(123456));
    }

    #[test]
    fn parse_codigo_rejects_garbage() {
        assert_eq!(parse_codigo(&json!("abc")), None);
        assert_eq!(parse_codigo(&json!(null)), None);
        assert_eq!(parse_codigo(&json!(12.5)), None);
        assert_eq!(parse_codigo(&json!(99_999_999_999_i64)), None);
    }
}
