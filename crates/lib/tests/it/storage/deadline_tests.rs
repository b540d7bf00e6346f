//! Cancellation and deadlines stop multi-step operations between steps

use std::{sync::Arc, time::Duration};

use filekeep::{OpContext, Storage, StorageConfig, Stores, share::Share};
use handle_trait::Handle;
use tokio_util::sync::CancellationToken;

use crate::helpers::*;

fn completed(err: &filekeep::Error) -> usize {
    match err {
        filekeep::Error::Storage(e) => e.completed_steps(),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_cancelled_before_start_changes_nothing() {
    let (storage, _) = setup_storage();
    let u1 = user_with_dependents(&storage, "u1", 2, 1).await;

    let ctx = OpContext::new();
    ctx.cancel();
    let err = storage.delete_user(&ctx, &u1).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(completed(&err), 0);

    let fresh = OpContext::new();
    storage.get_user(&fresh, &u1).await.unwrap();
    assert_eq!(storage.list_shares(&fresh, Some(&u1)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_cancel_mid_cascade_finishes_current_step() {
    let (storage, store) = setup_flaky_storage();
    let u1 = user_with_dependents(&storage, "u1", 3, 0).await;
    store.delay(Op::DeleteShare, Duration::from_millis(50));

    let token = CancellationToken::new();
    let ctx = OpContext::new().with_cancellation(token.clone());
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(70)).await;
        token.cancel();
    });

    let err = storage.delete_user(&ctx, &u1).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(err.is_retryable());
    let done = completed(&err);
    assert!((1..3).contains(&done), "completed {done} steps");

    let fresh = OpContext::new();
    storage.get_user(&fresh, &u1).await.unwrap();
    assert_eq!(
        storage.list_shares(&fresh, Some(&u1)).await.unwrap().len(),
        3 - done
    );

    storage.delete_user(&fresh, &u1).await.unwrap();
    assert!(storage.list_shares(&fresh, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deadline_mid_cascade_is_retryable() {
    let (storage, store) = setup_flaky_storage();
    let u1 = user_with_dependents(&storage, "u1", 3, 1).await;
    store.delay(Op::DeleteShare, Duration::from_millis(50));

    let ctx = OpContext::new().with_timeout(Duration::from_millis(70));
    let err = storage.delete_user(&ctx, &u1).await.unwrap_err();
    assert!(err.is_timeout_error());
    assert!(completed(&err) >= 1);

    let fresh = OpContext::new();
    storage.get_user(&fresh, &u1).await.unwrap();
    storage.delete_user(&fresh, &u1).await.unwrap();
    assert!(storage.verify_integrity(&fresh).await.unwrap().is_consistent());
    assert!(
        storage
            .get_auth_rule(&fresh, &"u1-r0".into())
            .await
            .unwrap()
            .is_global()
    );
}

#[tokio::test]
async fn test_configured_timeout_applies_without_caller_deadline() {
    let store = Arc::new(FlakyStore::new());
    let config = StorageConfig::default().with_default_timeout(Duration::from_millis(70));
    let storage = Storage::open(Stores::shared(store.clone()), config);
    let u1 = user_with_dependents(&storage, "u1", 3, 0).await;
    store.delay(Op::DeleteShare, Duration::from_millis(50));

    let err = storage
        .delete_user(&OpContext::new(), &u1)
        .await
        .unwrap_err();
    assert!(err.is_timeout_error());

    // A caller deadline takes precedence over the configured one.
    let ctx = OpContext::new().with_timeout(Duration::from_secs(5));
    storage.delete_user(&ctx, &u1).await.unwrap();
}

#[tokio::test]
async fn test_lock_wait_respects_deadline() {
    let (storage, store) = setup_flaky_storage();
    let u1 = user_with_dependents(&storage, "u1", 1, 0).await;
    store.delay(Op::DeleteShare, Duration::from_millis(200));

    let deleting = {
        let storage = storage.handle();
        let u1 = u1.clone();
        tokio::spawn(async move { storage.delete_user(&OpContext::new(), &u1).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let ctx = OpContext::new().with_timeout(Duration::from_millis(30));
    let err = storage
        .create_share(&ctx, Share::with_key("late", u1.clone(), "/late"))
        .await
        .unwrap_err();
    assert!(err.is_timeout_error());
    assert_eq!(completed(&err), 0);

    deleting.await.unwrap().unwrap();
    assert!(storage.list_shares(&OpContext::new(), None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_huge_configured_timeout_never_expires() {
    let store = Arc::new(FlakyStore::new());
    let config = StorageConfig::default().with_default_timeout(Duration::MAX);
    let storage = Storage::open(Stores::shared(store), config);
    let u1 = user_with_dependents(&storage, "u1", 2, 1).await;

    storage.delete_user(&OpContext::new(), &u1).await.unwrap();
    assert!(storage.list_shares(&OpContext::new(), None).await.unwrap().is_empty());
}
