use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entities::actividad;

pub use crate::entities::actividad::Model as ActividadEntry;

pub struct ActivityRepository {
    conn: DatabaseConnection,
}

impl ActivityRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Append one activity entry
    pub async fn record(
        &self,
        usuario_id: i32,
        tipo: Option<&str>,
        descripcion: &str,
        modulo: Option<&str>,
    ) -> Result<()> {
        let active = actividad::ActiveModel {
            usuario_id: Set(usuario_id),
            tipo: Set(tipo.map(str::to_string)),
            descripcion: Set(descripcion.to_string()),
            modulo: Set(modulo.map(str::to_string)),
            creado_en: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert activity entry")?;

        Ok(())
    }

    /// Most recent entries across all users
    pub async fn recent(&self, limit: u64) -> Result<Vec<ActividadEntry>> {
        let entries = actividad::Entity::find()
            .order_by_desc(actividad::Column::CreadoEn)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query recent activity")?;

        Ok(entries)
    }

    /// Most recent entries for one user
    pub async fn for_user(&self, usuario_id: i32, limit: u64) -> Result<Vec<ActividadEntry>> {
        let entries = actividad::Entity::find()
            .filter(actividad::Column::UsuarioId.eq(usuario_id))
            .order_by_desc(actividad::Column::CreadoEn)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query user activity")?;

        Ok(entries)
    }
}
