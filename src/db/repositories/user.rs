use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::usuarios;

/// User data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct Usuario {
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

impl From<usuarios::Model> for Usuario {
    fn from(model: usuarios::Model) -> Self {
        Self {
            id: model.id,
            nombre: model.nombre,
            documento_identidad: model.documento_identidad,
            email: model.email,
            telefono: model.telefono,
            rol: model.rol,
            estado: model.estado,
            foto_url: model.foto_url,
            departamento: model.departamento,
            ubicacion: model.ubicacion,
            creado_en: model.creado_en,
            actualizado_en: model.actualizado_en,
        }
    }
}

/// In-flight recovery state for one account. Both fields are set together
/// by `set_reset_code` and cleared together by `consume_reset_code`.
#[derive(Debug, Clone)]
pub struct ResetState {
    pub code: Option<i32>,
    pub expira: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewUsuario {
    pub nombre: String,
    pub documento_identidad: Option<String>,
    pub email: String,
    pub telefono: Option<String>,
    pub password: String,
    pub rol: String,
    pub estado: String,
    pub foto_url: Option<String>,
    pub departamento: Option<String>,
    pub ubicacion: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UsuarioUpdate {
    pub nombre: String,
    pub documento_identidad: Option<String>,
    pub email: String,
    pub telefono: Option<String>,
    pub rol: String,
    pub estado: String,
    pub departamento: Option<String>,
    pub ubicacion: Option<String>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user by id
    pub async fn get_by_id(&self, id: i32) -> Result<Option<Usuario>> {
        let user = usuarios::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by id")?;

        Ok(user.map(Usuario::from))
    }

    /// Get user by email, any estado
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Usuario>> {
        let user = usuarios::Entity::find()
            .filter(usuarios::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(Usuario::from))
    }

    /// Get an active user by email together with the stored password hash.
    /// An inactive account is indistinguishable from a missing one here.
    pub async fn get_active_by_email_with_hash(
        &self,
        email: &str,
    ) -> Result<Option<(Usuario, String)>> {
        let user = usuarios::Entity::find()
            .filter(usuarios::Column::Email.eq(email))
            .filter(usuarios::Column::Estado.eq("active"))
            .one(&self.conn)
            .await
            .context("Failed to query active user by email")?;

        Ok(user.map(|u| {
            let hash = u.password_hash.clone();
            (Usuario::from(u), hash)
        }))
    }

    /// Get user by id together with the stored password hash
    pub async fn get_by_id_with_hash(&self, id: i32) -> Result<Option<(Usuario, String)>> {
        let user = usuarios::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by id")?;

        Ok(user.map(|u| {
            let hash = u.password_hash.clone();
            (Usuario::from(u), hash)
        }))
    }

    /// List all users, newest first
    pub async fn list(&self) -> Result<Vec<Usuario>> {
        let users = usuarios::Entity::find()
            .order_by_desc(usuarios::Column::CreadoEn)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(users.into_iter().map(Usuario::from).collect())
    }

    /// Create a user, hashing the supplied password
    pub async fn create(&self, new: NewUsuario, security: &SecurityConfig) -> Result<i32> {
        let password = new.password.clone();
        let security = security.clone();
        let hash = task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .context("Password hashing task panicked")??;

        let now = Utc::now().to_rfc3339();

        let active = usuarios::ActiveModel {
            nombre: Set(new.nombre),
            documento_identidad: Set(new.documento_identidad),
            email: Set(new.email),
            telefono: Set(new.telefono),
            password_hash: Set(hash),
            rol: Set(new.rol),
            estado: Set(new.estado),
            foto_url: Set(new.foto_url),
            departamento: Set(new.departamento),
            ubicacion: Set(new.ubicacion),
            creado_en: Set(now.clone()),
            actualizado_en: Set(now),
            ..Default::default()
        };

        let inserted = active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        Ok(inserted.id)
    }

    /// Update profile fields, refreshing `actualizado_en`.
    /// Returns false when no row matched.
    pub async fn update_profile(&self, id: i32, update: UsuarioUpdate) -> Result<bool> {
        let Some(user) = usuarios::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
        else {
            return Ok(false);
        };

        let mut active: usuarios::ActiveModel = user.into();
        active.nombre = Set(update.nombre);
        active.documento_identidad = Set(update.documento_identidad);
        active.email = Set(update.email);
        active.telefono = Set(update.telefono);
        active.rol = Set(update.rol);
        active.estado = Set(update.estado);
        active.departamento = Set(update.departamento);
        active.ubicacion = Set(update.ubicacion);
        active.actualizado_en = Set(Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = usuarios::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;

        Ok(res.rows_affected > 0)
    }

    /// Persist a freshly issued recovery code and its expiry
    pub async fn set_reset_code(
        &self,
        email: &str,
        code: i32,
        expira: DateTime<Utc>,
    ) -> Result<bool> {
        let res = usuarios::Entity::update_many()
            .col_expr(usuarios::Column::ResetCode, Expr::value(Some(code)))
            .col_expr(
                usuarios::Column::ResetExpira,
                Expr::value(Some(expira.to_rfc3339())),
            )
            .filter(usuarios::Column::Email.eq(email))
            .exec(&self.conn)
            .await
            .context("Failed to store reset code")?;

        Ok(res.rows_affected > 0)
    }

    /// Read the stored recovery state for an account, if the account exists
    pub async fn reset_state(&self, email: &str) -> Result<Option<ResetState>> {
        let user = usuarios::Entity::find()
            .filter(usuarios::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query reset state")?;

        Ok(user.map(|u| ResetState {
            code: u.reset_code,
            expira: u
                .reset_expira
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        }))
    }

    /// Write the new password hash and clear the recovery fields in one
    /// conditional update. The `reset_code` filter makes the code single-use
    /// under concurrent requests: only one caller sees a row affected.
    pub async fn consume_reset_code(
        &self,
        email: &str,
        code: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<u64> {
        let password = new_password.to_string();
        let security = security.clone();
        let hash = task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .context("Password hashing task panicked")??;

        let res = usuarios::Entity::update_many()
            .col_expr(usuarios::Column::PasswordHash, Expr::value(hash))
            .col_expr(usuarios::Column::ResetCode, Expr::value(Option::<i32>::None))
            .col_expr(
                usuarios::Column::ResetExpira,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                usuarios::Column::ActualizadoEn,
                Expr::value(Utc::now().to_rfc3339()),
            )
            .filter(usuarios::Column::Email.eq(email))
            .filter(usuarios::Column::ResetCode.eq(code))
            .exec(&self.conn)
            .await
            .context("Failed to consume reset code")?;

        Ok(res.rows_affected)
    }

    /// Replace the password hash for a user, refreshing `actualizado_en`
    pub async fn update_password(
        &self,
        id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        let user = usuarios::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let password = new_password.to_string();
        let security = security.clone();
        let hash = task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .context("Password hashing task panicked")??;

        let mut active: usuarios::ActiveModel = user.into();
        active.password_hash = Set(hash);
        active.actualizado_en = Set(Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn count_all(&self) -> Result<u64> {
        let count = usuarios::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")?;
        Ok(count)
    }

    pub async fn count_active_by_rol(&self, rol: &str) -> Result<u64> {
        let count = usuarios::Entity::find()
            .filter(usuarios::Column::Rol.eq(rol))
            .filter(usuarios::Column::Estado.eq("active"))
            .count(&self.conn)
            .await
            .context("Failed to count users by role")?;
        Ok(count)
    }

    pub async fn count_inactive(&self) -> Result<u64> {
        let count = usuarios::Entity::find()
            .filter(usuarios::Column::Estado.eq("inactive"))
            .count(&self.conn)
            .await
            .context("Failed to count inactive users")?;
        Ok(count)
    }
}

/// Hash a password using Argon2id with optional custom params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored hash. Callers should run this on a
/// blocking task; Argon2 verification is CPU-intensive.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    let argon2 = Argon2::default();
    Ok(argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("S3cret-pw", None).unwrap();
        assert!(verify_password("S3cret-pw", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn hash_is_salted() {
        let a = hash_password("S3cret-pw", None).unwrap();
        let b = hash_password("S3cret-pw", None).unwrap();
        assert_ne!(a, b);
    }
}
