//! The property the naive read-check-write design gets wrong: concurrent
//! check-then-mutate sequences against the same activity must serialize, so a
//! single remaining seat is never handed out twice.

mod common;

use sportmeet::services::{order_service, registration_service};
use sportmeet::services::ServiceError;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_simultaneous_joins_for_the_last_seat() {
    let pool = common::test_pool().await;
    let host = common::register_user(&pool, "host").await;
    let anna = common::register_user(&pool, "anna").await;
    let ben = common::register_user(&pool, "ben").await;
    let activity = common::create_activity(&pool, &host, 1, 0.0).await;

    let task_a = {
        let (pool, anna, activity) = (pool.clone(), anna.clone(), activity.clone());
        tokio::spawn(
            async move { registration_service::join_activity(&pool, &anna, &activity, None).await },
        )
    };
    let task_b = {
        let (pool, ben, activity) = (pool.clone(), ben.clone(), activity.clone());
        tokio::spawn(
            async move { registration_service::join_activity(&pool, &ben, &activity, None).await },
        )
    };

    let result_a = task_a.await.unwrap();
    let result_b = task_b.await.unwrap();

    let successes = [&result_a, &result_b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one join may win the last seat");

    let loser = if result_a.is_err() { result_a } else { result_b };
    assert!(matches!(loser, Err(ServiceError::Capacity(_))));

    assert_eq!(common::participant_count(&pool, &activity).await, 1);
    common::assert_capacity_invariant(&pool, &activity).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn join_stampede_never_oversells() {
    let pool = common::test_pool().await;
    let host = common::register_user(&pool, "host").await;
    let activity = common::create_activity(&pool, &host, 3, 0.0).await;

    let mut users = Vec::new();
    for i in 0..8 {
        users.push(common::register_user(&pool, &format!("runner{i}")).await);
    }

    let mut tasks = Vec::new();
    for user in users {
        let (pool, activity) = (pool.clone(), activity.clone());
        tasks.push(tokio::spawn(async move {
            registration_service::join_activity(&pool, &user, &activity, None).await
        }));
    }

    let mut successes = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => successes += 1,
            Err(ServiceError::Capacity(_)) => {}
            Err(other) => panic!("unexpected failure: {other}"),
        }
    }

    assert_eq!(successes, 3);
    assert_eq!(common::participant_count(&pool, &activity).await, 3);
    common::assert_capacity_invariant(&pool, &activity).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pay_and_join_race_for_the_last_seat() {
    let pool = common::test_pool().await;
    let host = common::register_user(&pool, "host").await;
    let anna = common::register_user(&pool, "anna").await;
    let ben = common::register_user(&pool, "ben").await;
    let activity = common::create_activity(&pool, &host, 1, 20.0).await;

    let order = order_service::create_order(&pool, &anna, &activity, None)
        .await
        .unwrap();

    let pay_task = {
        let (pool, anna, number) = (pool.clone(), anna.clone(), order.order_number.clone());
        tokio::spawn(async move { order_service::pay_order(&pool, &number, &anna).await })
    };
    let join_task = {
        let (pool, ben, activity) = (pool.clone(), ben.clone(), activity.clone());
        tokio::spawn(
            async move { registration_service::join_activity(&pool, &ben, &activity, None).await },
        )
    };

    let pay_result = pay_task.await.unwrap();
    let join_result = join_task.await.unwrap();

    let successes = pay_result.is_ok() as usize + join_result.is_ok() as usize;
    assert_eq!(successes, 1, "the seat can be claimed exactly once");
    assert_eq!(common::participant_count(&pool, &activity).await, 1);

    // The losing payment must leave its order pending.
    if pay_result.is_err() {
        assert_eq!(common::order_status(&pool, &order.order_number).await, "pending");
    }
    common::assert_capacity_invariant(&pool, &activity).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_joins_yield_one_registration() {
    let pool = common::test_pool().await;
    let host = common::register_user(&pool, "host").await;
    let anna = common::register_user(&pool, "anna").await;
    let activity = common::create_activity(&pool, &host, 10, 0.0).await;

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let (pool, anna, activity) = (pool.clone(), anna.clone(), activity.clone());
        tasks.push(tokio::spawn(async move {
            registration_service::join_activity(&pool, &anna, &activity, None).await
        }));
    }

    let mut successes = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => successes += 1,
            Err(ServiceError::Duplicate(_)) => {}
            Err(other) => panic!("unexpected failure: {other}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(common::participant_count(&pool, &activity).await, 1);
}
