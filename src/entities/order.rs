use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entities::user::Entity as User;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub oid: String,
    #[sea_orm(indexed)]
    pub uid: String,
    pub aid: String,
    #[sea_orm(column_type = "Json")]
    pub content: OrderContent,
    pub time: DateTimeUtc,
    pub status: OrderStatus,
}

/// Commodity id -> quantity. Quantities are validated >= 1 on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct OrderContent(pub HashMap<String, i32>);

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "User",
        from = "Column::Uid",
        to = "crate::entities::user::Column::Uid"
    )]
    User,
}

impl Related<crate::entities::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// An order starts Idle and moves to Shipped or Canceled exactly once;
/// only admin overrides may take any other path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum OrderStatus {
    #[sea_orm(num_value = 0)]
    Idle,
    #[sea_orm(num_value = 1)]
    Shipped,
    #[sea_orm(num_value = 2)]
    Canceled,
}

impl TryFrom<i32> for OrderStatus {
    type Error = ();

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OrderStatus::Idle),
            1 => Ok(OrderStatus::Shipped),
            2 => Ok(OrderStatus::Canceled),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_values_are_stable() {
        assert_eq!(OrderStatus::try_from(0), Ok(OrderStatus::Idle));
        assert_eq!(OrderStatus::try_from(1), Ok(OrderStatus::Shipped));
        assert_eq!(OrderStatus::try_from(2), Ok(OrderStatus::Canceled));
        assert!(OrderStatus::try_from(3).is_err());
    }
}
