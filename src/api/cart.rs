use axum::{
    extract::{Extension, Path, Query},
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, StandardResponse};
use crate::entities::cart::{self, Entity as CartEntity};
use crate::entities::commodity::{self, Entity as CommodityEntity};
use crate::middleware::auth::{auth_middleware, CurrentUser};

const PAGE_SIZE: u64 = 10;

pub fn cart_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/add/:cid", post(add_to_cart))
        .route("/remove/:cid", delete(remove_from_cart))
        .route("/all", get(list_cart).delete(clear_cart))
        .layer(from_fn_with_state(db.clone(), auth_middleware))
        .layer(Extension(db))
}

/// Adding an already-carted commodity bumps its quantity instead of
/// creating a second row.
async fn add_to_cart(
    Path(cid): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<StandardResponse<()>, ApiError> {
    let txn = db.begin().await?;
    CommodityEntity::find_by_id(&cid)
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound)?;

    match CartEntity::find_by_id((current.uid.clone(), cid.clone()))
        .one(&txn)
        .await?
    {
        Some(entry) => {
            let quantity = entry.quantity;
            let mut entry: cart::ActiveModel = entry.into();
            entry.quantity = Set(quantity + 1);
            entry.update(&txn).await?;
        }
        None => {
            let entry = cart::ActiveModel {
                uid: Set(current.uid),
                cid: Set(cid),
                quantity: Set(1),
            };
            CartEntity::insert(entry).exec(&txn).await?;
        }
    }
    txn.commit().await?;

    Ok(StandardResponse::created_message("Added to cart"))
}

#[derive(Deserialize)]
struct RemoveQuery {
    remove_all: Option<bool>,
}

/// Removing decrements by one; the row disappears at zero or when
/// `remove_all` is set, so quantity never goes negative.
async fn remove_from_cart(
    Path(cid): Path<String>,
    Query(query): Query<RemoveQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<StandardResponse<()>, ApiError> {
    let txn = db.begin().await?;
    let entry = CartEntity::find_by_id((current.uid.clone(), cid))
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound)?;

    if query.remove_all.unwrap_or(false) || entry.quantity <= 1 {
        entry.delete(&txn).await?;
    } else {
        let quantity = entry.quantity;
        let mut entry: cart::ActiveModel = entry.into();
        entry.quantity = Set(quantity - 1);
        entry.update(&txn).await?;
    }
    txn.commit().await?;

    Ok(StandardResponse::message("Removed from cart"))
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<u64>,
}

#[derive(Serialize)]
struct CartItem {
    cid: String,
    name: String,
    price: f64,
    quantity: i32,
}

async fn list_cart(
    Query(query): Query<PageQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<StandardResponse<Vec<CartItem>>, ApiError> {
    let page = query.page.unwrap_or(1);
    if page < 1 {
        return Err(ApiError::InvalidOperation);
    }

    let entries: Vec<(cart::Model, Option<commodity::Model>)> = CartEntity::find()
        .filter(cart::Column::Uid.eq(&current.uid))
        .find_also_related(CommodityEntity)
        .offset((page - 1) * PAGE_SIZE)
        .limit(PAGE_SIZE)
        .all(&*db)
        .await?;

    let items = entries
        .into_iter()
        .filter_map(|(entry, commodity)| {
            commodity.map(|commodity| CartItem {
                cid: entry.cid,
                name: commodity.name,
                price: commodity.price,
                quantity: entry.quantity,
            })
        })
        .collect();

    Ok(StandardResponse::ok(items))
}

async fn clear_cart(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<StandardResponse<()>, ApiError> {
    CartEntity::delete_many()
        .filter(cart::Column::Uid.eq(&current.uid))
        .exec(&*db)
        .await?;
    Ok(StandardResponse::message("Cart cleared"))
}
