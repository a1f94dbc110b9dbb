use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{permisos, roles, usuarios};

#[derive(Debug, Clone)]
pub struct PermisoRow {
    pub modulo: String,
    pub permiso: String,
    pub descripcion: Option<String>,
    pub permitido: bool,
}

/// One role plus its permissions and how many users currently hold it
#[derive(Debug, Clone)]
pub struct RolRow {
    pub id: i32,
    pub nombre: String,
    pub descripcion: String,
    pub es_sistema: bool,
    pub total_usuarios: u64,
    pub permisos: Vec<PermisoRow>,
}

pub struct RoleRepository {
    conn: DatabaseConnection,
}

impl RoleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// List roles with permissions and per-role user counts.
    /// The count matches role names case-insensitively, since `usuarios.rol`
    /// is free-form text.
    pub async fn list(&self) -> Result<Vec<RolRow>> {
        let roles = roles::Entity::find()
            .order_by_asc(roles::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list roles")?;

        let mut rows = Vec::with_capacity(roles.len());
        for rol in roles {
            let total_usuarios = usuarios::Entity::find()
                .filter(
                    Expr::expr(Func::lower(Expr::col(usuarios::Column::Rol)))
                        .eq(rol.nombre.to_lowercase()),
                )
                .count(&self.conn)
                .await
                .context("Failed to count users for role")?;

            let permisos = permisos::Entity::find()
                .filter(permisos::Column::RolId.eq(rol.id))
                .order_by_desc(permisos::Column::Permitido)
                .order_by_asc(permisos::Column::Modulo)
                .all(&self.conn)
                .await
                .context("Failed to list role permissions")?
                .into_iter()
                .map(|p| PermisoRow {
                    modulo: p.modulo,
                    permiso: p.permiso,
                    descripcion: p.descripcion,
                    permitido: p.permitido,
                })
                .collect();

            rows.push(RolRow {
                id: rol.id,
                nombre: rol.nombre,
                descripcion: rol.descripcion,
                es_sistema: rol.es_sistema,
                total_usuarios,
                permisos,
            });
        }

        Ok(rows)
    }

    /// Create a role; names are stored lowercased
    pub async fn create(&self, nombre: &str, descripcion: &str) -> Result<i32> {
        let active = roles::ActiveModel {
            nombre: Set(nombre.to_lowercase()),
            descripcion: Set(descripcion.to_string()),
            es_sistema: Set(false),
            ..Default::default()
        };

        let inserted = active
            .insert(&self.conn)
            .await
            .context("Failed to insert role")?;

        Ok(inserted.id)
    }

    /// Whether the role is a protected system role; None when absent
    pub async fn es_sistema(&self, id: i32) -> Result<Option<bool>> {
        let rol = roles::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query role")?;

        Ok(rol.map(|r| r.es_sistema))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = roles::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete role")?;

        Ok(res.rows_affected > 0)
    }
}
