use axum::{
    extract::{Extension, Path, Query},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{ApiError, StandardResponse};
use crate::entities::commodity::Entity as CommodityEntity;
use crate::entities::order::{self, Entity as OrderEntity, OrderContent, OrderStatus};
use crate::entities::user::Permission;
use crate::middleware::auth::{auth_middleware, CurrentUser};

const PAGE_SIZE: u64 = 10;

pub fn order_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/add", post(add_order))
        .route("/list", get(list_orders))
        .route("/:oid/cancel", put(cancel_order))
        .route("/:oid", put(update_order_status))
        .layer(from_fn_with_state(db.clone(), auth_middleware))
        .layer(Extension(db))
}

#[derive(Deserialize)]
struct OrderBody {
    aid: String,
    content: HashMap<String, i32>,
}

async fn add_order(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<OrderBody>,
) -> Result<StandardResponse<String>, ApiError> {
    if body.content.is_empty() {
        return Err(ApiError::InvalidOperation);
    }

    let txn = db.begin().await?;
    for (cid, quantity) in &body.content {
        if *quantity < 1 {
            return Err(ApiError::InvalidOperation);
        }
        CommodityEntity::find_by_id(cid)
            .one(&txn)
            .await?
            .ok_or(ApiError::NotFound)?;
    }

    let oid = Uuid::new_v4().simple().to_string();
    let new_order = order::ActiveModel {
        oid: Set(oid.clone()),
        uid: Set(current.uid),
        aid: Set(body.aid),
        content: Set(OrderContent(body.content)),
        time: Set(Utc::now()),
        status: Set(OrderStatus::Idle),
    };
    OrderEntity::insert(new_order).exec(&txn).await?;
    txn.commit().await?;

    Ok(StandardResponse::created("Order created", oid))
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<u64>,
}

#[derive(Serialize)]
struct OrderData {
    oid: String,
    uid: String,
    aid: String,
    content: HashMap<String, i32>,
    time: chrono::DateTime<Utc>,
    status: i32,
}

impl From<order::Model> for OrderData {
    fn from(model: order::Model) -> Self {
        OrderData {
            oid: model.oid,
            uid: model.uid,
            aid: model.aid,
            content: model.content.0,
            time: model.time,
            status: model.status as i32,
        }
    }
}

async fn list_orders(
    Query(query): Query<PageQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<StandardResponse<Vec<OrderData>>, ApiError> {
    let page = query.page.unwrap_or(1);
    if page < 1 {
        return Err(ApiError::InvalidOperation);
    }

    let records = OrderEntity::find()
        .filter(order::Column::Uid.eq(&current.uid))
        .offset((page - 1) * PAGE_SIZE)
        .limit(PAGE_SIZE)
        .all(&*db)
        .await?;

    Ok(StandardResponse::ok(
        records.into_iter().map(OrderData::from).collect(),
    ))
}

/// Owners may cancel exactly once, and only while the order is still Idle.
async fn cancel_order(
    Path(oid): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<StandardResponse<()>, ApiError> {
    let txn = db.begin().await?;
    let record = OrderEntity::find_by_id(&oid)
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound)?;

    if record.uid != current.uid || record.status != OrderStatus::Idle {
        return Err(ApiError::InvalidOperation);
    }

    let mut record: order::ActiveModel = record.into();
    record.status = Set(OrderStatus::Canceled);
    record.update(&txn).await?;
    txn.commit().await?;

    Ok(StandardResponse::message("Order canceled"))
}

#[derive(Deserialize)]
struct StatusQuery {
    status: i32,
}

/// Admin override: any status may be set, including walking an order back.
async fn update_order_status(
    Path(oid): Path<String>,
    Query(query): Query<StatusQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<StandardResponse<()>, ApiError> {
    current.require(Permission::Admin)?;

    let status = OrderStatus::try_from(query.status).map_err(|_| ApiError::InvalidOperation)?;

    let txn = db.begin().await?;
    let record = OrderEntity::find_by_id(&oid)
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound)?;

    let mut record: order::ActiveModel = record.into();
    record.status = Set(status);
    record.update(&txn).await?;
    txn.commit().await?;

    Ok(StandardResponse::message("Order status updated"))
}
