use axum::{
    extract::{Extension, Path},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{ApiError, StandardResponse};
use crate::entities::comment::{self, Entity as CommentEntity};
use crate::entities::commodity::Entity as CommodityEntity;
use crate::entities::user::Permission;
use crate::middleware::auth::authenticate;

#[derive(Deserialize)]
pub struct CommentBody {
    pub content: String,
}

#[derive(Serialize)]
pub struct CommentData {
    pub id: String,
    pub uid: String,
    pub cid: String,
    pub content: String,
    pub time: chrono::DateTime<Utc>,
}

impl From<comment::Model> for CommentData {
    fn from(model: comment::Model) -> Self {
        CommentData {
            id: model.id,
            uid: model.uid,
            cid: model.cid,
            content: model.content,
            time: model.time,
        }
    }
}

pub async fn add_comment(
    Path(cid): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    headers: HeaderMap,
    Json(body): Json<CommentBody>,
) -> Result<StandardResponse<()>, ApiError> {
    let current = authenticate(&db, &headers).await?;

    let txn = db.begin().await?;
    CommodityEntity::find_by_id(&cid)
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound)?;

    let new_comment = comment::ActiveModel {
        id: Set(Uuid::new_v4().simple().to_string()),
        uid: Set(current.uid),
        cid: Set(cid),
        content: Set(body.content),
        time: Set(Utc::now()),
    };
    CommentEntity::insert(new_comment).exec(&txn).await?;
    txn.commit().await?;

    Ok(StandardResponse::created_message("Comment added"))
}

pub async fn list_comments(
    Path(cid): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<StandardResponse<Vec<CommentData>>, ApiError> {
    CommodityEntity::find_by_id(&cid)
        .one(&*db)
        .await?
        .ok_or(ApiError::NotFound)?;

    let records = CommentEntity::find()
        .filter(comment::Column::Cid.eq(&cid))
        .all(&*db)
        .await?;

    Ok(StandardResponse::ok(
        records.into_iter().map(CommentData::from).collect(),
    ))
}

pub async fn remove_comment(
    Path(id): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    headers: HeaderMap,
) -> Result<StandardResponse<()>, ApiError> {
    let current = authenticate(&db, &headers).await?;

    let txn = db.begin().await?;
    let record = CommentEntity::find_by_id(&id)
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound)?;

    if record.uid != current.uid {
        current.require(Permission::Admin)?;
    }

    record.delete(&txn).await?;
    txn.commit().await?;

    Ok(StandardResponse::message("Comment removed"))
}
