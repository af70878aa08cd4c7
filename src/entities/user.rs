use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: String,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password: String,
    pub permission: Permission,
    pub birthday: Option<Date>,
    pub gender: Gender,
    /// aid of the address pre-selected for the next order, if any.
    pub default_address: Option<String>,
}

impl Model {
    pub fn verify_password(&self, password: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.password) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2.hash_password(password.as_bytes(), &salt)?.to_string();

    Ok(password_hash)
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum Permission {
    #[sea_orm(num_value = 0)]
    Guest,
    #[sea_orm(num_value = 1)]
    User,
    #[sea_orm(num_value = 2)]
    Admin,
}

impl TryFrom<i32> for Permission {
    type Error = ();

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Permission::Guest),
            1 => Ok(Permission::User),
            2 => Ok(Permission::Admin),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum Gender {
    #[sea_orm(num_value = 0)]
    Female,
    #[sea_orm(num_value = 1)]
    Male,
}

impl TryFrom<i32> for Gender {
    type Error = ();

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Gender::Female),
            1 => Ok(Gender::Male),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("Secret15").expect("hashing failed");
        let model = Model {
            uid: "u".into(),
            username: "user".into(),
            email: "user@example.com".into(),
            password: hash,
            permission: Permission::User,
            birthday: None,
            gender: Gender::Male,
            default_address: None,
        };
        assert!(model.verify_password("Secret15"));
        assert!(!model.verify_password("Secret16"));
    }

    #[test]
    fn permission_levels_are_ordered() {
        assert!(Permission::Admin > Permission::User);
        assert!(Permission::User > Permission::Guest);
        assert_eq!(Permission::try_from(2), Ok(Permission::Admin));
        assert!(Permission::try_from(7).is_err());
    }
}
