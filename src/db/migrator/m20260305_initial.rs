use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Seed account created on first run; change the password after bootstrap.
const DEFAULT_ADMIN_EMAIL: &str = "admin@tablero.local";

/// Hash the default admin password using Argon2id
fn hash_default_password() -> Result<String, DbErr> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"Admin1234";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .map(|h| h.to_string())
        .map_err(|e| DbErr::Custom(format!("Failed to hash default password: {e}")))
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Usuarios)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Roles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Permisos)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Actividad)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_default_password()?;

        let insert_admin = Query::insert()
            .into_table(Usuarios)
            .columns([
                crate::entities::usuarios::Column::Nombre,
                crate::entities::usuarios::Column::Email,
                crate::entities::usuarios::Column::PasswordHash,
                crate::entities::usuarios::Column::Rol,
                crate::entities::usuarios::Column::Estado,
                crate::entities::usuarios::Column::CreadoEn,
                crate::entities::usuarios::Column::ActualizadoEn,
            ])
            .values_panic([
                "Administrador".into(),
                DEFAULT_ADMIN_EMAIL.into(),
                password_hash.into(),
                "admin".into(),
                "active".into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert_admin).await?;

        for (nombre, descripcion) in [
            ("admin", "Acceso total al sistema"),
            ("instructor", "Gestión de formación"),
            ("student", "Acceso de consulta"),
        ] {
            let insert_rol = Query::insert()
                .into_table(Roles)
                .columns([
                    crate::entities::roles::Column::Nombre,
                    crate::entities::roles::Column::Descripcion,
                    crate::entities::roles::Column::EsSistema,
                ])
                .values_panic([nombre.into(), descripcion.into(), true.into()])
                .to_owned();

            manager.exec_stmt(insert_rol).await?;
        }

        for (modulo, permiso, descripcion) in [
            ("usuarios", "gestionar", "Crear, editar y eliminar usuarios"),
            ("roles", "gestionar", "Crear y eliminar roles"),
            ("dashboard", "ver", "Consultar estadísticas"),
        ] {
            let insert_permiso = Query::insert()
                .into_table(Permisos)
                .columns([
                    crate::entities::permisos::Column::RolId,
                    crate::entities::permisos::Column::Modulo,
                    crate::entities::permisos::Column::Permiso,
                    crate::entities::permisos::Column::Descripcion,
                    crate::entities::permisos::Column::Permitido,
                ])
                .values_panic([
                    1.into(),
                    modulo.into(),
                    permiso.into(),
                    descripcion.into(),
                    true.into(),
                ])
                .to_owned();

            manager.exec_stmt(insert_permiso).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Actividad).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Permisos).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Usuarios).to_owned())
            .await?;

        Ok(())
    }
}
