pub mod cart;
pub mod order;
pub mod response;
pub mod shop;
pub mod user;

use axum::{middleware::from_fn, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::captcha::CaptchaStore;
use crate::middleware::logging::logging_middleware;
use crate::storage::UploadDir;

pub fn create_api_router(
    db: Arc<DatabaseConnection>,
    captcha: CaptchaStore,
    upload_dir: UploadDir,
) -> Router {
    Router::new()
        .nest("/user", user::user_router(db.clone(), captcha))
        .nest("/shop", shop::shop_router(db.clone(), upload_dir))
        .nest("/cart", cart::cart_router(db.clone()))
        .nest("/order", order::order_router(db))
        .layer(from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
