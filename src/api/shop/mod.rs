pub mod comment;
pub mod commodity;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    routing::{delete, get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::storage::UploadDir;

/// Catalog router. Reads are public; mutations authenticate inside the
/// handler because admin and plain-user routes share these paths.
pub fn shop_router(db: Arc<DatabaseConnection>, upload_dir: UploadDir) -> Router {
    Router::new()
        .route("/add", post(commodity::add_commodity))
        .route("/all", get(commodity::all_commodities))
        .route(
            "/item/:cid",
            get(commodity::get_commodity)
                .put(commodity::edit_commodity)
                .delete(commodity::remove_commodity),
        )
        .route("/item/:cid/album", get(commodity::get_album))
        .route("/image/:fid", get(commodity::get_image))
        .route(
            "/item/:cid/comment",
            post(comment::add_comment).get(comment::list_comments),
        )
        .route("/comment/:id", delete(comment::remove_comment))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
        .layer(Extension(db))
        .layer(Extension(upload_dir))
}
