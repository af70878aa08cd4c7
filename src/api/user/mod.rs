pub mod address;
pub mod auth;
pub mod profile;

use axum::{
    extract::Extension,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::captcha::CaptchaStore;
use crate::middleware::auth::auth_middleware;

pub fn user_router(db: Arc<DatabaseConnection>, captcha: CaptchaStore) -> Router {
    let public = Router::new()
        .route("/captcha/register", get(auth::request_register_captcha))
        .route("/captcha/recover", get(auth::request_recover_captcha))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/recover", post(auth::recover))
        .layer(Extension(captcha));

    let protected = Router::new()
        .route("/profile", get(profile::self_profile))
        .route(
            "/profile/:uid",
            get(profile::get_profile).put(profile::edit_profile),
        )
        .route(
            "/address",
            get(address::list_addresses).post(address::add_address),
        )
        .route(
            "/address/:aid",
            get(address::get_address)
                .put(address::edit_address)
                .delete(address::remove_address),
        )
        .layer(from_fn_with_state(db.clone(), auth_middleware));

    public.merge(protected).layer(Extension(db))
}
