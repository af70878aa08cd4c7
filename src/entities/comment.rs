use sea_orm::entity::prelude::*;

use crate::entities::commodity::Entity as Commodity;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub uid: String,
    #[sea_orm(indexed)]
    pub cid: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub time: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Commodity",
        from = "Column::Cid",
        to = "crate::entities::commodity::Column::Cid",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Commodity,
}

impl Related<crate::entities::commodity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commodity.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
