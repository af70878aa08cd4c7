use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, ModelTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{ApiError, StandardResponse};
use crate::entities::address::{self, Entity as AddressEntity};
use crate::entities::user;
use crate::middleware::auth::CurrentUser;

#[derive(Deserialize)]
pub struct AddressBody {
    pub name: String,
    pub phone: String,
    pub address: String,
}

#[derive(Deserialize)]
pub struct DefaultQuery {
    pub is_default: Option<bool>,
}

#[derive(Serialize)]
pub struct AddressData {
    pub aid: String,
    pub uid: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub is_default: bool,
}

impl From<address::Model> for AddressData {
    fn from(model: address::Model) -> Self {
        AddressData {
            aid: model.aid,
            uid: model.uid,
            name: model.name,
            phone: model.phone,
            address: model.address,
            is_default: model.is_default,
        }
    }
}

pub async fn list_addresses(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<StandardResponse<Vec<AddressData>>, ApiError> {
    let records = AddressEntity::find()
        .filter(address::Column::Uid.eq(&current.uid))
        .all(&*db)
        .await?;
    Ok(StandardResponse::ok(
        records.into_iter().map(AddressData::from).collect(),
    ))
}

pub async fn get_address(
    Path(aid): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<StandardResponse<AddressData>, ApiError> {
    let record = AddressEntity::find_by_id(aid)
        .filter(address::Column::Uid.eq(&current.uid))
        .one(&*db)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(StandardResponse::ok(AddressData::from(record)))
}

pub async fn add_address(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<DefaultQuery>,
    Json(body): Json<AddressBody>,
) -> Result<StandardResponse<String>, ApiError> {
    let aid = Uuid::new_v4().simple().to_string();
    let is_default = query.is_default.unwrap_or(false);

    let txn = db.begin().await?;
    if is_default {
        clear_default(&txn, &current.uid).await?;
    }
    let new_address = address::ActiveModel {
        aid: Set(aid.clone()),
        uid: Set(current.uid.clone()),
        name: Set(body.name),
        phone: Set(body.phone),
        address: Set(body.address),
        is_default: Set(is_default),
    };
    AddressEntity::insert(new_address).exec(&txn).await?;
    if is_default {
        point_user_default(&txn, &current.uid, Some(aid.clone())).await?;
    }
    txn.commit().await?;

    Ok(StandardResponse::created("Address added", aid))
}

pub async fn edit_address(
    Path(aid): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<DefaultQuery>,
    Json(body): Json<AddressBody>,
) -> Result<StandardResponse<()>, ApiError> {
    let is_default = query.is_default.unwrap_or(false);

    let txn = db.begin().await?;
    let record = AddressEntity::find_by_id(&aid)
        .filter(address::Column::Uid.eq(&current.uid))
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound)?;

    if is_default {
        clear_default(&txn, &current.uid).await?;
    }

    let mut record: address::ActiveModel = record.into();
    record.name = Set(body.name);
    record.phone = Set(body.phone);
    record.address = Set(body.address);
    if is_default {
        record.is_default = Set(true);
    }
    record.update(&txn).await?;

    if is_default {
        point_user_default(&txn, &current.uid, Some(aid)).await?;
    }
    txn.commit().await?;

    Ok(StandardResponse::message("Address updated"))
}

pub async fn remove_address(
    Path(aid): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<StandardResponse<()>, ApiError> {
    let txn = db.begin().await?;
    let record = AddressEntity::find_by_id(&aid)
        .filter(address::Column::Uid.eq(&current.uid))
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound)?;

    let was_default = record.is_default || current.default_address.as_deref() == Some(aid.as_str());
    record.delete(&txn).await?;
    if was_default {
        point_user_default(&txn, &current.uid, None).await?;
    }
    txn.commit().await?;

    Ok(StandardResponse::message("Address deleted"))
}

/// Drops the default flag from every address the user owns; the caller then
/// flags the one row that should carry it.
async fn clear_default(txn: &DatabaseTransaction, uid: &str) -> Result<(), DbErr> {
    AddressEntity::update_many()
        .col_expr(address::Column::IsDefault, Expr::value(false))
        .filter(address::Column::Uid.eq(uid))
        .exec(txn)
        .await?;
    Ok(())
}

async fn point_user_default(
    txn: &DatabaseTransaction,
    uid: &str,
    aid: Option<String>,
) -> Result<(), DbErr> {
    let user = user::ActiveModel {
        uid: Set(uid.to_owned()),
        default_address: Set(aid),
        ..Default::default()
    };
    user.update(txn).await?;
    Ok(())
}
