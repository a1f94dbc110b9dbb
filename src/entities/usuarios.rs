use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "usuarios")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub nombre: String,

    pub documento_identidad: Option<String>,

    #[sea_orm(unique)]
    pub email: String,

    pub telefono: Option<String>,

    /// Argon2id password hash
    pub password_hash: String,

    pub rol: String,

    /// "active" or "inactive"; only active accounts may log in
    pub estado: String,

    pub foto_url: Option<String>,

    pub departamento: Option<String>,

    pub ubicacion: Option<String>,

    /// 6-digit recovery code; set together with `reset_expira`, cleared together
    pub reset_code: Option<i32>,

    /// RFC3339 expiry for `reset_code`
    pub reset_expira: Option<String>,

    pub creado_en: String,

    pub actualizado_en: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
