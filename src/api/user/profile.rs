use axum::{
    extract::{Extension, Path},
    Json,
};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, StandardResponse};
use crate::entities::user::{self, hash_password, Entity as UserEntity, Gender, Permission};
use crate::middleware::auth::CurrentUser;

#[derive(Serialize)]
pub struct Profile {
    pub uid: String,
    pub username: String,
    pub email: String,
    pub permission: i32,
    pub birthday: Option<NaiveDate>,
    pub gender: i32,
    pub default_address: Option<String>,
}

impl From<user::Model> for Profile {
    fn from(model: user::Model) -> Self {
        Profile {
            uid: model.uid,
            username: model.username,
            email: model.email,
            permission: model.permission as i32,
            birthday: model.birthday,
            gender: model.gender as i32,
            default_address: model.default_address,
        }
    }
}

pub async fn self_profile(
    Extension(current): Extension<CurrentUser>,
) -> Result<StandardResponse<Profile>, ApiError> {
    Ok(StandardResponse::ok(Profile {
        uid: current.uid,
        username: current.username,
        email: current.email,
        permission: current.permission as i32,
        birthday: current.birthday,
        gender: current.gender as i32,
        default_address: current.default_address,
    }))
}

pub async fn get_profile(
    Path(uid): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<StandardResponse<Profile>, ApiError> {
    let record = UserEntity::find_by_id(uid)
        .one(&*db)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(StandardResponse::ok(Profile::from(record)))
}

#[derive(Deserialize)]
pub struct UpdateProfile {
    pub birthday: Option<NaiveDate>,
    pub gender: Option<i32>,
    pub password: Option<String>,
    pub permission: Option<i32>,
}

pub async fn edit_profile(
    Path(uid): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<UpdateProfile>,
) -> Result<StandardResponse<()>, ApiError> {
    if uid != current.uid {
        current.require(Permission::Admin)?;
    }

    let txn = db.begin().await?;
    let record = UserEntity::find_by_id(&uid)
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound)?;

    let previous_permission = record.permission;
    let mut record: user::ActiveModel = record.into();

    if let Some(birthday) = body.birthday {
        record.birthday = Set(Some(birthday));
    }
    if let Some(gender) = body.gender {
        let gender = Gender::try_from(gender).map_err(|_| ApiError::InvalidOperation)?;
        record.gender = Set(gender);
    }
    if let Some(permission) = body.permission {
        let permission = Permission::try_from(permission).map_err(|_| ApiError::InvalidOperation)?;
        if permission != previous_permission {
            current.require(Permission::Admin)?;
            record.permission = Set(permission);
        }
    }
    if let Some(password) = body.password {
        if password.len() < 6 {
            return Err(ApiError::InvalidOperation);
        }
        record.password =
            Set(hash_password(&password).map_err(|err| ApiError::Internal(err.to_string()))?);
    }

    record.update(&txn).await?;
    txn.commit().await?;

    Ok(StandardResponse::message("User updated"))
}
