use axum::{
    extract::{Extension, Multipart, Path, Query},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::api::response::{ApiError, StandardResponse};
use crate::entities::comment;
use crate::entities::commodity::{self, Entity as CommodityEntity, ImageList};
use crate::middleware::auth::authenticate;
use crate::storage::{self, UploadDir};

const MAX_IMAGES: usize = 5;
const PAGE_SIZE: u64 = 50;

#[derive(Deserialize)]
struct CreateCommodity {
    name: String,
    price: f64,
    description: String,
}

#[derive(Deserialize, Default)]
struct UpdateCommodity {
    name: Option<String>,
    price: Option<f64>,
    description: Option<String>,
}

#[derive(Serialize)]
pub struct CommoditySummary {
    pub cid: String,
    pub name: String,
    pub price: f64,
    pub album: Option<String>,
}

#[derive(Serialize)]
pub struct CommodityData {
    pub cid: String,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub images: Vec<String>,
    pub album: Option<String>,
}

impl From<commodity::Model> for CommodityData {
    fn from(model: commodity::Model) -> Self {
        CommodityData {
            cid: model.cid,
            name: model.name,
            price: model.price,
            description: model.description,
            album: model.images.album().map(str::to_owned),
            images: model.images.0,
        }
    }
}

/// Multipart body: a `body` field holding the JSON payload plus up to five
/// `images` file parts.
async fn read_multipart<T: serde::de::DeserializeOwned>(
    multipart: &mut Multipart,
) -> Result<(Option<T>, Vec<(String, Vec<u8>)>), ApiError> {
    let mut body = None;
    let mut images = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::InvalidOperation)?
    {
        match field.name() {
            Some("body") => {
                let text = field.text().await.map_err(|_| ApiError::InvalidOperation)?;
                body = Some(serde_json::from_str(&text).map_err(|_| ApiError::InvalidOperation)?);
            }
            Some("images") => {
                let content_type = field
                    .content_type()
                    .ok_or(ApiError::InvalidOperation)?
                    .to_owned();
                if storage::allowed_extension(&content_type).is_none() {
                    return Err(ApiError::InvalidOperation);
                }
                let data = field.bytes().await.map_err(|_| ApiError::InvalidOperation)?;
                images.push((content_type, data.to_vec()));
            }
            _ => {}
        }
    }

    if images.len() > MAX_IMAGES {
        return Err(ApiError::InvalidOperation);
    }
    Ok((body, images))
}

async fn store_images(
    upload_dir: &UploadDir,
    images: Vec<(String, Vec<u8>)>,
) -> Result<Vec<String>, ApiError> {
    let mut stored = Vec::with_capacity(images.len());
    for (content_type, data) in images {
        let file_name = storage::save(upload_dir.path(), &content_type, &data)
            .await
            .map_err(|err| ApiError::Internal(err.to_string()))?;
        stored.push(file_name);
    }
    Ok(stored)
}

pub async fn add_commodity(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(upload_dir): Extension<UploadDir>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<StandardResponse<String>, ApiError> {
    let current = authenticate(&db, &headers).await?;
    current.require(crate::entities::user::Permission::Admin)?;

    let (body, images) = read_multipart::<CreateCommodity>(&mut multipart).await?;
    let body = body.ok_or(ApiError::InvalidOperation)?;

    let stored = store_images(&upload_dir, images).await?;
    let cid = Uuid::new_v4().simple().to_string();

    let txn = db.begin().await?;
    let new_commodity = commodity::ActiveModel {
        cid: Set(cid.clone()),
        name: Set(body.name),
        price: Set(body.price),
        description: Set(body.description),
        images: Set(ImageList(stored)),
    };
    CommodityEntity::insert(new_commodity).exec(&txn).await?;
    txn.commit().await?;

    Ok(StandardResponse::created("Commodity added", cid))
}

#[derive(Deserialize)]
pub struct PageQuery {
    page: Option<u64>,
}

pub async fn all_commodities(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Query(query): Query<PageQuery>,
) -> Result<StandardResponse<Vec<CommoditySummary>>, ApiError> {
    let page = query.page.unwrap_or(1);
    if page < 1 {
        return Err(ApiError::InvalidOperation);
    }

    let records = CommodityEntity::find()
        .offset((page - 1) * PAGE_SIZE)
        .limit(PAGE_SIZE)
        .all(&*db)
        .await?;

    Ok(StandardResponse::ok(
        records
            .into_iter()
            .map(|model| CommoditySummary {
                cid: model.cid,
                name: model.name,
                price: model.price,
                album: model.images.album().map(str::to_owned),
            })
            .collect(),
    ))
}

pub async fn get_commodity(
    Path(cid): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<StandardResponse<CommodityData>, ApiError> {
    let record = CommodityEntity::find_by_id(cid)
        .one(&*db)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(StandardResponse::ok(CommodityData::from(record)))
}

pub async fn get_album(
    Path(cid): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(upload_dir): Extension<UploadDir>,
) -> Result<Response, ApiError> {
    let record = CommodityEntity::find_by_id(cid)
        .one(&*db)
        .await?
        .ok_or(ApiError::NotFound)?;
    let album = record.images.album().ok_or(ApiError::NotFound)?;
    stream_image(&upload_dir, album).await
}

pub async fn get_image(
    Path(fid): Path<String>,
    Extension(upload_dir): Extension<UploadDir>,
) -> Result<Response, ApiError> {
    if !storage::is_clean_file_name(&fid) {
        return Err(ApiError::NotFound);
    }
    stream_image(&upload_dir, &fid).await
}

async fn stream_image(upload_dir: &UploadDir, file_name: &str) -> Result<Response, ApiError> {
    let (file, content_type) = storage::open(upload_dir.path(), file_name)
        .await
        .map_err(|_| ApiError::NotFound)?;

    let stream = ReaderStream::new(file);
    let body = axum::body::Body::from_stream(stream);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("inline"),
    );

    Ok((headers, body).into_response())
}

#[derive(Deserialize)]
pub struct EditQuery {
    no_images: Option<bool>,
}

pub async fn edit_commodity(
    Path(cid): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(upload_dir): Extension<UploadDir>,
    Query(query): Query<EditQuery>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<StandardResponse<()>, ApiError> {
    let current = authenticate(&db, &headers).await?;
    current.require(crate::entities::user::Permission::Admin)?;

    let (body, images) = read_multipart::<UpdateCommodity>(&mut multipart).await?;
    let body = body.unwrap_or_default();
    let drop_images = query.no_images.unwrap_or(false);

    let txn = db.begin().await?;
    let record = CommodityEntity::find_by_id(&cid)
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound)?;

    let old_images = record.images.0.clone();
    let mut record: commodity::ActiveModel = record.into();

    if let Some(name) = body.name {
        record.name = Set(name);
    }
    if let Some(price) = body.price {
        record.price = Set(price);
    }
    if let Some(description) = body.description {
        record.description = Set(description);
    }

    let replace_images = drop_images || !images.is_empty();
    if replace_images {
        let stored = store_images(&upload_dir, images).await?;
        record.images = Set(ImageList(stored));
    }

    record.update(&txn).await?;
    txn.commit().await?;

    if replace_images {
        for image in &old_images {
            storage::remove(upload_dir.path(), image).await;
        }
    }

    Ok(StandardResponse::message("Commodity updated"))
}

pub async fn remove_commodity(
    Path(cid): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(upload_dir): Extension<UploadDir>,
    headers: HeaderMap,
) -> Result<StandardResponse<()>, ApiError> {
    let current = authenticate(&db, &headers).await?;
    current.require(crate::entities::user::Permission::Admin)?;

    let txn = db.begin().await?;
    let record = CommodityEntity::find_by_id(&cid)
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound)?;

    let images = record.images.0.clone();
    record.delete(&txn).await?;
    comment::Entity::delete_many()
        .filter(comment::Column::Cid.eq(&cid))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    for image in &images {
        storage::remove(upload_dir.path(), image).await;
    }

    Ok(StandardResponse::message("Commodity removed"))
}
