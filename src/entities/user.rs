//! User entity - a person who can sign in.
//!
//! Users reach stores through [`super::store_member`] rows, which carry the role.

use super::enums::UserStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Login email, unique across the system
    #[sea_orm(unique)]
    pub email: String,
    /// bcrypt hash of the password
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Deactivated users cannot sign in
    pub status: UserStatus,
    /// Last successful login
    pub last_login_at: Option<DateTimeUtc>,
    /// When the user registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Store memberships of this user
    #[sea_orm(has_many = "super::store_member::Entity")]
    Memberships,
}

impl Related<super::store_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
