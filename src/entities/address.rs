use sea_orm::entity::prelude::*;

use crate::entities::user::Entity as User;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "address")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub aid: String,
    #[sea_orm(indexed)]
    pub uid: String,
    pub name: String,
    pub phone: String,
    #[sea_orm(column_type = "Text")]
    pub address: String,
    /// At most one address per user carries this flag; setting a new
    /// default clears it on all the user's other rows.
    #[sea_orm(default_value = false)]
    pub is_default: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "User",
        from = "Column::Uid",
        to = "crate::entities::user::Column::Uid",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<crate::entities::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
