//! Authentication business logic - registration, login and profile lookup.
//!
//! Registration creates the user, their store and the owner membership in one
//! transaction. Login compares the bcrypt hash first and only then looks at
//! account status, so a caller without the password learns nothing about it.

use crate::{
    core::{policy, token::TokenKeys},
    entities::{
        PlanTier, Role, Store, StoreMember, StoreStatus, User, UserStatus, store, store_member,
        user,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Months, Utc};
use regex::Regex;
use sea_orm::{QueryOrder, Set, SqlErr, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::info;

/// Length of the free trial granted at registration.
const TRIAL_MONTHS: u32 = 3;
/// Shortest password accepted at registration.
const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

const EMAIL_TAKEN: &str = "This email is already registered";

/// A concurrent registration can pass the lookup and lose on the unique index.
fn email_conflict(err: DbErr) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::conflict(EMAIL_TAKEN),
        _ => err.into(),
    }
}

/// Registration request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    /// Owner's name
    pub name: String,
    pub email: String,
    pub password: String,
    /// Name of the store being opened
    pub store_name: String,
    pub phone: Option<String>,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// User, store and role summary returned by every auth operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub store_id: i64,
    pub store_name: String,
    pub role: Role,
    pub plan: PlanTier,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    /// Landing page of the client for this role
    pub home: &'static str,
}

impl Profile {
    fn build(user: &user::Model, store: &store::Model, role: Role) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            store_id: store.id,
            store_name: store.name.clone(),
            role,
            plan: store.plan,
            trial_ends_at: store.trial_ends_at,
            last_login_at: user.last_login_at,
            home: policy::home_path(role),
        }
    }
}

/// A freshly issued session
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    /// Bearer token
    pub token: String,
    pub user: Profile,
}

/// Registers a new store together with its owner and signs the owner in.
///
/// # Errors
/// Returns an error if:
/// - A required field is blank, the email is malformed or the password is too short
/// - The email is already registered
/// - Hashing, token signing or the database fails
pub async fn register(
    db: &DatabaseConnection,
    keys: &TokenKeys,
    bcrypt_cost: u32,
    input: RegisterInput,
) -> Result<AuthSession> {
    let name = input.name.trim().to_string();
    let store_name = input.store_name.trim().to_string();
    let email = normalize_email(&input.email);

    if name.is_empty() || email.is_empty() || input.password.is_empty() || store_name.is_empty()
    {
        return Err(Error::validation("All fields are required"));
    }
    if !is_valid_email(&email) {
        return Err(Error::validation("Please enter a valid email"));
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }

    let phone = non_blank(input.phone);
    let password_hash = bcrypt::hash(&input.password, bcrypt_cost)?;
    let now = Utc::now();

    let txn = db.begin().await?;

    let existing = User::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(Error::conflict(EMAIL_TAKEN));
    }

    let user = user::ActiveModel {
        name: Set(name),
        email: Set(email.clone()),
        password_hash: Set(password_hash),
        phone: Set(phone.clone()),
        status: Set(UserStatus::Activo),
        last_login_at: Set(None),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(email_conflict)?;

    let store = store::ActiveModel {
        name: Set(store_name),
        email: Set(email.clone()),
        phone: Set(phone),
        plan: Set(PlanTier::Free),
        status: Set(StoreStatus::Activo),
        trial_ends_at: Set(now.checked_add_months(Months::new(TRIAL_MONTHS))),
        last_payment_at: Set(None),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    store_member::ActiveModel {
        user_id: Set(user.id),
        store_id: Set(store.id),
        role: Set(Role::Owner),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(user_id = user.id, store_id = store.id, "Registered new store");

    let token = keys.issue(user.id, store.id, &user.email, Role::Owner)?;
    Ok(AuthSession {
        token,
        user: Profile::build(&user, &store, Role::Owner),
    })
}

/// Signs a user in with email and password.
///
/// # Errors
/// Returns an error if:
/// - Email or password is blank (validation)
/// - The email is unknown or the password does not match (one shared error)
/// - The user is inactive or their store is suspended
/// - Token signing or the database fails
pub async fn login(
    db: &DatabaseConnection,
    keys: &TokenKeys,
    input: LoginInput,
) -> Result<AuthSession> {
    let email = normalize_email(&input.email);
    if email.is_empty() || input.password.is_empty() {
        return Err(Error::validation("Email and password are required"));
    }

    let Some(user) = User::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(db)
        .await?
    else {
        return Err(Error::InvalidCredentials);
    };

    if !bcrypt::verify(&input.password, &user.password_hash)? {
        return Err(Error::InvalidCredentials);
    }

    let (membership, store) = first_membership(db, user.id)
        .await?
        .ok_or(Error::InvalidCredentials)?;

    if user.status != UserStatus::Activo {
        return Err(Error::forbidden(
            "Your account has been deactivated. Contact support.",
        ));
    }
    if store.status != StoreStatus::Activo {
        return Err(Error::forbidden(
            "The store is suspended. Contact support.",
        ));
    }

    let now = Utc::now();
    let mut active: user::ActiveModel = user.into();
    active.last_login_at = Set(Some(now));
    let user = active.update(db).await?;

    info!(user_id = user.id, store_id = store.id, "User logged in");

    let token = keys.issue(user.id, store.id, &user.email, membership.role)?;
    Ok(AuthSession {
        token,
        user: Profile::build(&user, &store, membership.role),
    })
}

/// Returns the profile of `user_id` acting in `store_id`.
///
/// # Errors
/// Returns [`Error::NotFound`] if the user no longer belongs to the store.
pub async fn get_profile(db: &DatabaseConnection, user_id: i64, store_id: i64) -> Result<Profile> {
    let membership = StoreMember::find()
        .filter(store_member::Column::UserId.eq(user_id))
        .filter(store_member::Column::StoreId.eq(store_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;

    let user = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;
    let store = Store::find_by_id(store_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Store", store_id))?;

    Ok(Profile::build(&user, &store, membership.role))
}

async fn first_membership(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Option<(store_member::Model, store::Model)>> {
    let row = StoreMember::find()
        .filter(store_member::Column::UserId.eq(user_id))
        .order_by_asc(store_member::Column::Id)
        .find_also_related(Store)
        .one(db)
        .await?;

    Ok(row.and_then(|(membership, store)| store.map(|store| (membership, store))))
}
