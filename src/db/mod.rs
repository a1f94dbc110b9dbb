use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;

pub mod migrator;
pub mod repositories;

pub use repositories::activity::ActividadEntry;
pub use repositories::role::{PermisoRow, RolRow};
pub use repositories::user::{NewUsuario, ResetState, Usuario, UsuarioUpdate};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn role_repo(&self) -> repositories::role::RoleRepository {
        repositories::role::RoleRepository::new(self.conn.clone())
    }

    fn activity_repo(&self) -> repositories::activity::ActivityRepository {
        repositories::activity::ActivityRepository::new(self.conn.clone())
    }

    // ===== Users =====

    pub async fn get_usuario(&self, id: i32) -> Result<Option<Usuario>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_usuario_by_email(&self, email: &str) -> Result<Option<Usuario>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_active_usuario_with_hash(
        &self,
        email: &str,
    ) -> Result<Option<(Usuario, String)>> {
        self.user_repo().get_active_by_email_with_hash(email).await
    }

    pub async fn get_usuario_with_hash(&self, id: i32) -> Result<Option<(Usuario, String)>> {
        self.user_repo().get_by_id_with_hash(id).await
    }

    pub async fn list_usuarios(&self) -> Result<Vec<Usuario>> {
        self.user_repo().list().await
    }

    pub async fn create_usuario(&self, new: NewUsuario, security: &SecurityConfig) -> Result<i32> {
        self.user_repo().create(new, security).await
    }

    pub async fn update_usuario(&self, id: i32, update: UsuarioUpdate) -> Result<bool> {
        self.user_repo().update_profile(id, update).await
    }

    pub async fn delete_usuario(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    pub async fn set_reset_code(
        &self,
        email: &str,
        code: i32,
        expira: DateTime<Utc>,
    ) -> Result<bool> {
        self.user_repo().set_reset_code(email, code, expira).await
    }

    pub async fn reset_state(&self, email: &str) -> Result<Option<ResetState>> {
        self.user_repo().reset_state(email).await
    }

    pub async fn consume_reset_code(
        &self,
        email: &str,
        code: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<u64> {
        self.user_repo()
            .consume_reset_code(email, code, new_password, security)
            .await
    }

    pub async fn update_password(
        &self,
        id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(id, new_password, security)
            .await
    }

    pub async fn count_usuarios(&self) -> Result<u64> {
        self.user_repo().count_all().await
    }

    pub async fn count_active_by_rol(&self, rol: &str) -> Result<u64> {
        self.user_repo().count_active_by_rol(rol).await
    }

    pub async fn count_inactivos(&self) -> Result<u64> {
        self.user_repo().count_inactive().await
    }

    // ===== Roles =====

    pub async fn list_roles(&self) -> Result<Vec<RolRow>> {
        self.role_repo().list().await
    }

    pub async fn create_rol(&self, nombre: &str, descripcion: &str) -> Result<i32> {
        self.role_repo().create(nombre, descripcion).await
    }

    pub async fn rol_es_sistema(&self, id: i32) -> Result<Option<bool>> {
        self.role_repo().es_sistema(id).await
    }

    pub async fn delete_rol(&self, id: i32) -> Result<bool> {
        self.role_repo().delete(id).await
    }

    // ===== Activity =====

    pub async fn record_actividad(
        &self,
        usuario_id: i32,
        tipo: Option<&str>,
        descripcion: &str,
        modulo: Option<&str>,
    ) -> Result<()> {
        self.activity_repo()
            .record(usuario_id, tipo, descripcion, modulo)
            .await
    }

    pub async fn recent_actividad(&self, limit: u64) -> Result<Vec<ActividadEntry>> {
        self.activity_repo().recent(limit).await
    }

    pub async fn actividad_for_usuario(
        &self,
        usuario_id: i32,
        limit: u64,
    ) -> Result<Vec<ActividadEntry>> {
        self.activity_repo().for_user(usuario_id, limit).await
    }
}
