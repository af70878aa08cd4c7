use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "commodity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub cid: String,
    pub name: String,
    pub price: f64,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Ordered list of stored image file names; the first one is the album
    /// cover shown in listings.
    #[sea_orm(column_type = "Json")]
    pub images: ImageList,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ImageList(pub Vec<String>);

impl ImageList {
    pub fn album(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
