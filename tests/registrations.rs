mod common;

use sportmeet::services::registration_service;
use sportmeet::services::ServiceError;

#[tokio::test]
async fn join_creates_confirmed_registration_and_increments_counter() {
    let pool = common::test_pool().await;
    let host = common::register_user(&pool, "host").await;
    let anna = common::register_user(&pool, "anna").await;
    let activity = common::create_activity(&pool, &host, 10, 0.0).await;

    let registration =
        registration_service::join_activity(&pool, &anna, &activity, Some("first timer"))
            .await
            .unwrap();
    assert_eq!(registration.status, "confirmed");
    assert_eq!(registration.notes.as_deref(), Some("first timer"));
    assert_eq!(common::participant_count(&pool, &activity).await, 1);
    common::assert_capacity_invariant(&pool, &activity).await;
}

#[tokio::test]
async fn duplicate_join_is_rejected_without_counter_drift() {
    let pool = common::test_pool().await;
    let host = common::register_user(&pool, "host").await;
    let anna = common::register_user(&pool, "anna").await;
    let activity = common::create_activity(&pool, &host, 10, 0.0).await;

    registration_service::join_activity(&pool, &anna, &activity, None)
        .await
        .unwrap();
    let second = registration_service::join_activity(&pool, &anna, &activity, None).await;
    assert!(matches!(second, Err(ServiceError::Duplicate(_))));

    // The rolled-back attempt must not leave a claimed seat behind.
    assert_eq!(common::participant_count(&pool, &activity).await, 1);
}

#[tokio::test]
async fn join_rejects_full_activity() {
    let pool = common::test_pool().await;
    let host = common::register_user(&pool, "host").await;
    let anna = common::register_user(&pool, "anna").await;
    let ben = common::register_user(&pool, "ben").await;
    let activity = common::create_activity(&pool, &host, 1, 0.0).await;

    registration_service::join_activity(&pool, &anna, &activity, None)
        .await
        .unwrap();
    let full = registration_service::join_activity(&pool, &ben, &activity, None).await;
    assert!(matches!(full, Err(ServiceError::Capacity(_))));
    assert_eq!(common::participant_count(&pool, &activity).await, 1);
}

#[tokio::test]
async fn join_rejects_started_or_missing_activity() {
    let pool = common::test_pool().await;
    let host = common::register_user(&pool, "host").await;
    let anna = common::register_user(&pool, "anna").await;

    let started = common::create_activity(&pool, &host, 10, 0.0).await;
    common::backdate_activity(&pool, &started).await;
    let result = registration_service::join_activity(&pool, &anna, &started, None).await;
    assert!(matches!(result, Err(ServiceError::InvalidState(_))));
    assert_eq!(common::participant_count(&pool, &started).await, 0);

    let missing = registration_service::join_activity(&pool, &anna, "no-such-id", None).await;
    assert!(matches!(missing, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn cancel_flips_registration_and_releases_seat() {
    let pool = common::test_pool().await;
    let host = common::register_user(&pool, "host").await;
    let anna = common::register_user(&pool, "anna").await;
    let activity = common::create_activity(&pool, &host, 10, 0.0).await;

    registration_service::join_activity(&pool, &anna, &activity, None)
        .await
        .unwrap();
    registration_service::cancel_registration(&pool, &anna, &activity)
        .await
        .unwrap();

    assert_eq!(common::participant_count(&pool, &activity).await, 0);
    assert!(!common::confirmed_registration_exists(&pool, &anna, &activity).await);

    let again = registration_service::cancel_registration(&pool, &anna, &activity).await;
    assert!(matches!(again, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn cancelled_registration_does_not_block_rejoin() {
    let pool = common::test_pool().await;
    let host = common::register_user(&pool, "host").await;
    let anna = common::register_user(&pool, "anna").await;
    let activity = common::create_activity(&pool, &host, 10, 0.0).await;

    registration_service::join_activity(&pool, &anna, &activity, None)
        .await
        .unwrap();
    registration_service::cancel_registration(&pool, &anna, &activity)
        .await
        .unwrap();
    registration_service::join_activity(&pool, &anna, &activity, None)
        .await
        .unwrap();

    assert_eq!(common::participant_count(&pool, &activity).await, 1);
    assert!(common::confirmed_registration_exists(&pool, &anna, &activity).await);
}

#[tokio::test]
async fn cancel_is_rejected_after_start() {
    let pool = common::test_pool().await;
    let host = common::register_user(&pool, "host").await;
    let anna = common::register_user(&pool, "anna").await;
    let activity = common::create_activity(&pool, &host, 10, 0.0).await;

    registration_service::join_activity(&pool, &anna, &activity, None)
        .await
        .unwrap();
    common::backdate_activity(&pool, &activity).await;

    let result = registration_service::cancel_registration(&pool, &anna, &activity).await;
    assert!(matches!(result, Err(ServiceError::InvalidState(_))));

    // Registration must survive the refused cancellation.
    assert!(common::confirmed_registration_exists(&pool, &anna, &activity).await);
    assert_eq!(common::participant_count(&pool, &activity).await, 1);
}

#[tokio::test]
async fn registration_lists_and_check() {
    let pool = common::test_pool().await;
    let host = common::register_user(&pool, "host").await;
    let anna = common::register_user(&pool, "anna").await;
    let activity = common::create_activity(&pool, &host, 10, 0.0).await;

    assert!(!registration_service::is_registered(&pool, &anna, &activity)
        .await
        .unwrap());

    registration_service::join_activity(&pool, &anna, &activity, None)
        .await
        .unwrap();

    assert!(registration_service::is_registered(&pool, &anna, &activity)
        .await
        .unwrap());

    let mine = registration_service::list_user_registrations(&pool, &anna)
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].activity_id, activity);
    assert_eq!(mine[0].activity_title.as_deref(), Some("Friendly match"));

    let registrants = registration_service::list_activity_registrations(&pool, &activity)
        .await
        .unwrap();
    assert_eq!(registrants.len(), 1);
    assert_eq!(registrants[0].username, "anna");
    assert_eq!(registrants[0].email, "anna@example.com");
}
