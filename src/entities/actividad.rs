use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "actividad")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub usuario_id: i32,

    pub tipo: Option<String>,

    pub descripcion: String,

    pub modulo: Option<String>,

    pub creado_en: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
