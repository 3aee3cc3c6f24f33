//! Registration ledger. Every check-then-mutate sequence here runs inside one
//! transaction whose first statement is a write, so the transaction owns the
//! SQLite write lock before any decision-relevant read happens. The capacity
//! check itself is the conditional counter update in `activity_repo`.

use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::{activity_repo, registration_repo};
use crate::models::registrations::{ActivityRegistrantRow, UserRegistrationRow};
use crate::models::{ActivitiesRow, RegistrationsRow};
use crate::services::error::{is_unique_violation, ServiceError, ServiceResult};
use crate::services::timefmt;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationView {
    pub id: String,
    pub user_id: String,
    pub activity_id: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistrationView {
    pub id: String,
    pub activity_id: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub activity_title: Option<String>,
    pub activity_start_time: Option<String>,
    pub activity_location: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRegistrantView {
    pub id: String,
    pub user_id: String,
    pub notes: Option<String>,
    pub registered_at: String,
    pub username: String,
    pub real_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
}

fn to_view(row: RegistrationsRow) -> RegistrationView {
    RegistrationView {
        id: row.registration_id,
        user_id: row.user_id,
        activity_id: row.activity_id,
        status: row.status,
        notes: row.notes,
        created_at: row.created_at,
    }
}

// The conditional update either claims a seat or proves the activity is
// full/absent; any later precondition failure rolls the claim back with the
// transaction.
pub async fn join_activity(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
    notes: Option<&str>,
) -> ServiceResult<RegistrationView> {
    let now = timefmt::now();
    let mut tx = pool.begin().await?;

    let reserved =
        activity_repo::try_adjust_participants(&mut *tx, activity_id, 1, &now).await?;
    if reserved == 0 {
        let row = activity_repo::load_visible_by_id(&mut *tx, activity_id).await?;
        tx.rollback().await?;
        return Err(join_blocked(row));
    }

    let activity = activity_repo::load_visible_by_id(&mut *tx, activity_id)
        .await?
        .ok_or_else(|| ServiceError::Internal("activity vanished mid-transaction".to_string()))?;
    if activity.start_time <= now {
        tx.rollback().await?;
        return Err(ServiceError::InvalidState(
            "activity has already started".to_string(),
        ));
    }

    let registration_id = Uuid::new_v4().to_string();
    let inserted = registration_repo::insert_confirmed(
        &mut *tx,
        registration_repo::NewRegistration {
            registration_id: &registration_id,
            user_id,
            activity_id,
            notes,
            created_at: &now,
        },
    )
    .await;

    match inserted {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            tx.rollback().await?;
            return Err(ServiceError::Duplicate(
                "already registered for this activity".to_string(),
            ));
        }
        Err(e) => {
            tx.rollback().await?;
            return Err(e.into());
        }
    }

    let row = registration_repo::load_by_id(&mut *tx, &registration_id)
        .await?
        .ok_or_else(|| ServiceError::Internal("registration vanished after insert".to_string()))?;
    tx.commit().await?;
    Ok(to_view(row))
}

fn join_blocked(row: Option<ActivitiesRow>) -> ServiceError {
    match row {
        None => ServiceError::NotFound("activity not found or closed".to_string()),
        Some(a) if a.current_participants >= a.max_participants => {
            ServiceError::Capacity("activity is full".to_string())
        }
        Some(_) => ServiceError::NotFound("activity not found or closed".to_string()),
    }
}

pub async fn cancel_registration(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
) -> ServiceResult<()> {
    let now = timefmt::now();
    let mut tx = pool.begin().await?;

    let flipped =
        registration_repo::cancel_confirmed(&mut *tx, user_id, activity_id, &now).await?;
    if flipped == 0 {
        tx.rollback().await?;
        return Err(ServiceError::NotFound(
            "no active registration for this activity".to_string(),
        ));
    }

    let activity = activity_repo::load_by_id(&mut *tx, activity_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("activity not found".to_string()))?;
    if activity.start_time <= now {
        tx.rollback().await?;
        return Err(ServiceError::InvalidState(
            "activity has already started; registration can no longer be cancelled".to_string(),
        ));
    }

    let released = activity_repo::try_adjust_participants(&mut *tx, activity_id, -1, &now).await?;
    if released == 0 {
        tx.rollback().await?;
        return Err(ServiceError::Internal(
            "participant counter out of sync with registrations".to_string(),
        ));
    }

    tx.commit().await?;
    Ok(())
}

pub async fn list_user_registrations(
    pool: &SqlitePool,
    user_id: &str,
) -> ServiceResult<Vec<UserRegistrationView>> {
    let rows = registration_repo::list_for_user(pool, user_id).await?;
    Ok(rows.into_iter().map(user_registration_view).collect())
}

fn user_registration_view(row: UserRegistrationRow) -> UserRegistrationView {
    UserRegistrationView {
        id: row.registration_id,
        activity_id: row.activity_id,
        status: row.status,
        notes: row.notes,
        created_at: row.created_at,
        activity_title: row.activity_title,
        activity_start_time: row.activity_start_time,
        activity_location: row.activity_location,
    }
}

pub async fn list_activity_registrations(
    pool: &SqlitePool,
    activity_id: &str,
) -> ServiceResult<Vec<ActivityRegistrantView>> {
    activity_repo::load_visible_by_id(pool, activity_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("activity not found".to_string()))?;
    let rows = registration_repo::list_confirmed_for_activity(pool, activity_id).await?;
    Ok(rows.into_iter().map(registrant_view).collect())
}

fn registrant_view(row: ActivityRegistrantRow) -> ActivityRegistrantView {
    ActivityRegistrantView {
        id: row.registration_id,
        user_id: row.user_id,
        notes: row.notes,
        registered_at: row.created_at,
        username: row.username,
        real_name: row.real_name,
        email: row.email,
        phone: row.phone,
    }
}

pub async fn is_registered(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
) -> ServiceResult<bool> {
    Ok(registration_repo::load_confirmed(pool, user_id, activity_id)
        .await?
        .is_some())
}
