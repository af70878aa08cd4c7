use sea_orm::Database;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use shop_backend::api::create_api_router;
use shop_backend::captcha::CaptchaStore;
use shop_backend::config::Config;
use shop_backend::entities::setup_schema;
use shop_backend::storage::UploadDir;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    setup_schema(&db).await.expect("Failed to create schema");

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .expect("Failed to create upload directory");

    let app = create_api_router(
        Arc::new(db),
        CaptchaStore::default(),
        UploadDir::new(config.upload_dir),
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Running at {}", config.bind_addr);
    axum::serve(listener, app).await.expect("Server error");
}
