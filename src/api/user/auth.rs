use axum::{
    extract::{Extension, Query},
    http::HeaderMap,
    Form,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::{Validate, ValidateEmail};

use crate::api::response::{ApiError, StandardResponse};
use crate::captcha::CaptchaStore;
use crate::entities::user::{self, hash_password, Entity as UserEntity, Gender, Permission};
use crate::middleware::auth::generate_token;

#[derive(Deserialize)]
pub struct CaptchaQuery {
    email: String,
}

pub async fn request_register_captcha(
    Extension(captcha): Extension<CaptchaStore>,
    headers: HeaderMap,
    Query(query): Query<CaptchaQuery>,
) -> Result<StandardResponse<String>, ApiError> {
    issue_captcha(&captcha, &headers, &query.email, "register")
}

pub async fn request_recover_captcha(
    Extension(captcha): Extension<CaptchaStore>,
    headers: HeaderMap,
    Query(query): Query<CaptchaQuery>,
) -> Result<StandardResponse<String>, ApiError> {
    issue_captcha(&captcha, &headers, &query.email, "recover")
}

/// Issues a code bound to `{email}_{request_id}` for five minutes. Email
/// transport is out of scope here; the code is surfaced through the log.
fn issue_captcha(
    captcha: &CaptchaStore,
    headers: &HeaderMap,
    email: &str,
    purpose: &str,
) -> Result<StandardResponse<String>, ApiError> {
    if !email.validate_email() {
        return Err(ApiError::InvalidOperation);
    }

    let request_id = Uuid::new_v4().simple().to_string();
    let code = captcha.issue(format!("{email}_{request_id}"));

    let client = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");
    tracing::info!(email, purpose, client, "Captcha issued");
    tracing::debug!(code, "Captcha code");

    Ok(StandardResponse::ok_with_message("Captcha sent", request_id))
}

#[derive(Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(email)]
    email: String,
    username: String,
    #[validate(length(min = 6))]
    password: String,
    gender: String,
    captcha: String,
}

pub async fn register(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(captcha): Extension<CaptchaStore>,
    headers: HeaderMap,
    Form(form): Form<RegisterForm>,
) -> Result<StandardResponse<()>, ApiError> {
    form.validate().map_err(|_| ApiError::InvalidOperation)?;
    let gender = form
        .gender
        .parse::<i32>()
        .ok()
        .and_then(|value| Gender::try_from(value).ok())
        .ok_or(ApiError::InvalidOperation)?;
    let request_id = request_id(&headers)?;

    let txn = db.begin().await?;

    let is_first_user = UserEntity::find().count(&txn).await? == 0;

    let duplicate = UserEntity::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(&form.email))
                .add(user::Column::Username.eq(&form.username)),
        )
        .one(&txn)
        .await?;
    if duplicate.is_some() {
        return Err(ApiError::Conflict);
    }

    if !captcha.check_and_consume(&format!("{}_{}", form.email, request_id), &form.captcha) {
        return Err(ApiError::CaptchaFailed);
    }

    let password = hash_password(&form.password).map_err(|err| ApiError::Internal(err.to_string()))?;
    let new_user = user::ActiveModel {
        uid: Set(Uuid::new_v4().simple().to_string()),
        username: Set(form.username),
        email: Set(form.email),
        password: Set(password),
        // The very first account becomes the administrator.
        permission: Set(if is_first_user {
            Permission::Admin
        } else {
            Permission::User
        }),
        birthday: Set(None),
        gender: Set(gender),
        default_address: Set(None),
    };
    UserEntity::insert(new_user)
        .exec(&txn)
        .await
        .map_err(|_| ApiError::Conflict)?;
    txn.commit().await?;

    Ok(StandardResponse::created_message("User created"))
}

#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

#[derive(Serialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

pub async fn login(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Form(form): Form<LoginForm>,
) -> Result<StandardResponse<Token>, ApiError> {
    let user = UserEntity::find()
        .filter(user::Column::Username.eq(&form.username))
        .one(&*db)
        .await?
        .ok_or(ApiError::AuthFailed)?;

    if !user.verify_password(&form.password) {
        return Err(ApiError::AuthFailed);
    }

    let token = generate_token(&user)?;
    Ok(StandardResponse::ok(Token {
        access_token: token,
        token_type: "bearer".to_owned(),
    }))
}

#[derive(Deserialize, Validate)]
pub struct RecoverForm {
    #[validate(email)]
    email: String,
    #[validate(length(min = 6))]
    password: String,
    captcha: String,
}

pub async fn recover(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(captcha): Extension<CaptchaStore>,
    headers: HeaderMap,
    Form(form): Form<RecoverForm>,
) -> Result<StandardResponse<String>, ApiError> {
    let request_id = request_id(&headers)?;

    let txn = db.begin().await?;
    let record = UserEntity::find()
        .filter(user::Column::Email.eq(&form.email))
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound)?;

    form.validate().map_err(|_| ApiError::InvalidOperation)?;

    if !captcha.check_and_consume(&format!("{}_{}", form.email, request_id), &form.captcha) {
        return Err(ApiError::CaptchaFailed);
    }

    let username = record.username.clone();
    let mut record: user::ActiveModel = record.into();
    record.password = Set(
        hash_password(&form.password).map_err(|err| ApiError::Internal(err.to_string()))?
    );
    record.update(&txn).await?;
    txn.commit().await?;

    Ok(StandardResponse::ok_with_message("Password recovered", username))
}

fn request_id(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get("request-id")
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::CaptchaFailed)
}
