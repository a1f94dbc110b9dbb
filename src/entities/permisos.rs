use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "permisos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub rol_id: i32,

    pub modulo: String,

    pub permiso: String,

    pub descripcion: Option<String>,

    pub permitido: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
