use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::user_repo;
use crate::models::UsersRow;
use crate::services::error::{is_unique_violation, ServiceError, ServiceResult};
use crate::services::{credential_service, timefmt};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserInput {
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone: Option<String>,
    pub real_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub real_name: Option<String>,
}

// Public profile; the password hash never leaves the service layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub real_name: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginView {
    #[serde(flatten)]
    pub user: UserView,
    pub token: String,
}

pub fn to_view(row: UsersRow) -> UserView {
    UserView {
        id: row.user_id,
        username: row.username,
        email: row.email,
        phone: row.phone,
        role: row.role,
        real_name: row.real_name,
        is_active: row.is_active == 1,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub async fn register_user(pool: &SqlitePool, input: RegisterUserInput) -> ServiceResult<UserView> {
    let username = input.username.trim();
    let email = input.email.trim();
    if username.is_empty() {
        return Err(ServiceError::Validation("username is required".to_string()));
    }
    if input.password.len() < 6 {
        return Err(ServiceError::Validation(
            "password must be at least 6 characters".to_string(),
        ));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(ServiceError::Validation("a valid email is required".to_string()));
    }

    // Friendly pre-checks; the UNIQUE columns stay authoritative under races.
    if user_repo::username_exists(pool, username).await? {
        return Err(ServiceError::Duplicate("username is already taken".to_string()));
    }
    if user_repo::email_taken_by_other(pool, email, "").await? {
        return Err(ServiceError::Duplicate("email is already registered".to_string()));
    }

    let password_hash = credential_service::hash_password(&input.password)?;
    let user_id = Uuid::new_v4().to_string();
    let now = timefmt::now();

    let inserted = user_repo::insert_user(
        pool,
        user_repo::NewUser {
            user_id: &user_id,
            username,
            email,
            password_hash: &password_hash,
            phone: input.phone.as_deref(),
            role: "user",
            real_name: input.real_name.as_deref(),
            created_at: &now,
        },
    )
    .await;

    match inserted {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(ServiceError::Duplicate(
                "username or email is already registered".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    let row = user_repo::load_by_id(pool, &user_id)
        .await?
        .ok_or_else(|| ServiceError::Internal("user vanished after insert".to_string()))?;
    Ok(to_view(row))
}

pub async fn login(
    pool: &SqlitePool,
    jwt_secret: &str,
    username: &str,
    password: &str,
) -> ServiceResult<LoginView> {
    // Same message for unknown user and wrong password.
    let invalid = || ServiceError::NotFound("invalid username or password".to_string());

    let Some(row) = user_repo::load_active_by_username(pool, username.trim()).await? else {
        return Err(invalid());
    };
    if !credential_service::verify_password(password, &row.password_hash)? {
        return Err(invalid());
    }

    let token =
        credential_service::issue_token(jwt_secret, &row.user_id, &row.username, &row.role)?;
    Ok(LoginView {
        user: to_view(row),
        token,
    })
}

pub async fn get_user(pool: &SqlitePool, user_id: &str) -> ServiceResult<UserView> {
    let row = user_repo::load_active_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("user not found".to_string()))?;
    Ok(to_view(row))
}

pub async fn update_user(
    pool: &SqlitePool,
    user_id: &str,
    input: UpdateUserInput,
    requester_id: &str,
    requester_role: &str,
) -> ServiceResult<UserView> {
    if requester_id != user_id && requester_role != "admin" {
        return Err(ServiceError::Forbidden(
            "only the account owner can update this profile".to_string(),
        ));
    }

    let row = user_repo::load_active_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("user not found".to_string()))?;

    if let Some(email) = input.email.as_deref() {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ServiceError::Validation("a valid email is required".to_string()));
        }
        if email != row.email && user_repo::email_taken_by_other(pool, email, user_id).await? {
            return Err(ServiceError::Duplicate("email is already registered".to_string()));
        }
    }

    user_repo::update_profile(
        pool,
        user_id,
        input.email.as_deref().map(str::trim),
        input.phone.as_deref(),
        input.real_name.as_deref(),
        &timefmt::now(),
    )
    .await?;

    get_user(pool, user_id).await
}

pub async fn deactivate_user(
    pool: &SqlitePool,
    user_id: &str,
    requester_id: &str,
    requester_role: &str,
) -> ServiceResult<()> {
    if requester_id != user_id && requester_role != "admin" {
        return Err(ServiceError::Forbidden(
            "only the account owner can deactivate this account".to_string(),
        ));
    }

    let row = user_repo::load_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("user not found".to_string()))?;
    if row.is_active == 0 {
        return Err(ServiceError::InvalidState(
            "account is already deactivated".to_string(),
        ));
    }

    user_repo::deactivate(pool, user_id, &timefmt::now()).await?;
    Ok(())
}
