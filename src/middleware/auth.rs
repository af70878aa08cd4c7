use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::config;
use crate::entities::user::{self, Entity as UserEntity, Gender, Permission};

pub const TOKEN_TTL_MINUTES: i64 = 30;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: String,
    pub exp: usize,
}

/// The authenticated user, reloaded from the database on every request so
/// that permission changes take effect without waiting out the token.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub uid: String,
    pub username: String,
    pub email: String,
    pub permission: Permission,
    pub birthday: Option<chrono::NaiveDate>,
    pub gender: Gender,
    pub default_address: Option<String>,
}

impl CurrentUser {
    pub fn require(&self, level: Permission) -> Result<(), ApiError> {
        if self.permission >= level {
            Ok(())
        } else {
            Err(ApiError::PermissionDenied)
        }
    }
}

impl From<user::Model> for CurrentUser {
    fn from(model: user::Model) -> Self {
        CurrentUser {
            uid: model.uid,
            username: model.username,
            email: model.email,
            permission: model.permission,
            birthday: model.birthday,
            gender: model.gender,
            default_address: model.default_address,
        }
    }
}

pub fn generate_token(user: &user::Model) -> Result<String, ApiError> {
    let exp = Utc::now()
        .checked_add_signed(Duration::minutes(TOKEN_TTL_MINUTES))
        .ok_or_else(|| ApiError::Internal("Token expiry overflow".to_owned()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user.username.clone(),
        uid: user.uid.clone(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config::secret_key().as_bytes()),
    )
    .map_err(|err| ApiError::Internal(err.to_string()))
}

/// Resolves the bearer token in `headers` to a live user row.
///
/// Fully protected routers run this through `auth_middleware`; routers that
/// mix public and restricted routes (the catalog) call it directly from the
/// handlers that need it.
pub async fn authenticate(
    db: &DatabaseConnection,
    headers: &HeaderMap,
) -> Result<CurrentUser, ApiError> {
    let token = headers
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or(ApiError::AuthFailed)?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config::secret_key().as_bytes()),
        &validation,
    )
    .map_err(|_| ApiError::AuthFailed)?;

    let user = UserEntity::find_by_id(token_data.claims.uid)
        .one(db)
        .await?
        .ok_or(ApiError::AuthFailed)?;

    Ok(CurrentUser::from(user))
}

pub async fn auth_middleware(
    State(db): State<Arc<DatabaseConnection>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&db, req.headers()).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
