use once_cell::sync::Lazy;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing or empty environment variable: {0}")]
    MissingVar(&'static str),
}

/// Runtime configuration, loaded once at startup from the environment
/// (a `.env` file is honored via `dotenvy` before this is called).
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub upload_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Token signing reads SECRET_KEY lazily; fail fast here instead.
        if std::env::var("SECRET_KEY").map(|v| v.is_empty()).unwrap_or(true) {
            return Err(ConfigError::MissingVar("SECRET_KEY"));
        }

        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => url,
            _ => return Err(ConfigError::MissingVar("DATABASE_URL")),
        };

        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned());
        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads"));

        Ok(Config {
            database_url,
            bind_addr,
            upload_dir,
        })
    }
}

/// Key used to sign and verify access tokens.
pub fn secret_key() -> &'static str {
    static KEY: Lazy<String> = Lazy::new(|| {
        dotenvy::dotenv().ok();
        std::env::var("SECRET_KEY").expect("SECRET_KEY must be set")
    });
    &KEY
}
