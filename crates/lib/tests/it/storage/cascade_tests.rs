//! Interrupted user-deletion cascades and their retries

use filekeep::{OpContext, RuleId, ShareKey, StorageError, storage::CascadeStep};

use crate::helpers::*;

fn cascade_error(err: filekeep::Error) -> StorageError {
    match err {
        filekeep::Error::Storage(e @ StorageError::CascadeFailed { .. }) => e,
        other => panic!("expected CascadeFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failure_before_any_write_is_not_a_cascade_failure() {
    let (storage, store) = setup_flaky_storage();
    let ctx = OpContext::new();
    let u1 = user_with_dependents(&storage, "u1", 2, 1).await;

    store.fail(Op::ListSharesByOwner);
    let err = storage.delete_user(&ctx, &u1).await.unwrap_err();
    assert!(!err.is_cascade_failure());
    assert!(err.is_retryable());

    store.heal(Op::ListSharesByOwner);
    storage.get_user(&ctx, &u1).await.unwrap();
    assert_eq!(storage.list_shares(&ctx, Some(&u1)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_share_delete_failure_reports_step_and_keeps_user() {
    let (storage, store) = setup_flaky_storage();
    let ctx = OpContext::new();
    let u1 = user_with_dependents(&storage, "u1", 3, 1).await;

    store.fail_after(Op::DeleteShare, 1);
    let err = cascade_error(storage.delete_user(&ctx, &u1).await.unwrap_err());
    assert_eq!(err.completed_steps(), 1);
    assert_eq!(
        err.cascade_step(),
        Some(&CascadeStep::DeleteShare(ShareKey::from("u1-s1")))
    );

    // Nothing past the failed step ran.
    storage.get_user(&ctx, &u1).await.unwrap();
    assert_eq!(storage.list_shares(&ctx, Some(&u1)).await.unwrap().len(), 2);
    let rule = storage.get_auth_rule(&ctx, &"u1-r0".into()).await.unwrap();
    assert!(rule.references(&u1));

    store.heal(Op::DeleteShare);
    storage.delete_user(&ctx, &u1).await.unwrap();

    assert!(storage.get_user(&ctx, &u1).await.unwrap_err().is_not_found());
    assert!(storage.list_shares(&ctx, Some(&u1)).await.unwrap().is_empty());
    let rule = storage.get_auth_rule(&ctx, &"u1-r0".into()).await.unwrap();
    assert!(rule.is_global());
}

#[tokio::test]
async fn test_rule_clear_failure_after_shares_deleted() {
    let (storage, store) = setup_flaky_storage();
    let ctx = OpContext::new();
    let u1 = user_with_dependents(&storage, "u1", 2, 2).await;

    store.fail_after(Op::PutRule, 1);
    let err = cascade_error(storage.delete_user(&ctx, &u1).await.unwrap_err());
    assert_eq!(err.completed_steps(), 3);
    assert_eq!(
        err.cascade_step(),
        Some(&CascadeStep::ClearRule(RuleId::from("u1-r1")))
    );
    assert!(err.is_retryable());

    storage.get_user(&ctx, &u1).await.unwrap();
    assert!(storage.list_shares(&ctx, Some(&u1)).await.unwrap().is_empty());

    store.heal(Op::PutRule);
    storage.delete_user(&ctx, &u1).await.unwrap();
    let rules = storage.list_auth_rules(&ctx).await.unwrap();
    assert!(rules.iter().all(|r| r.is_global()));
}

#[tokio::test]
async fn test_user_record_failure_after_dependents_detached() {
    let (storage, store) = setup_flaky_storage();
    let ctx = OpContext::new();
    let u1 = user_with_dependents(&storage, "u1", 1, 0).await;

    store.fail(Op::DeleteUser);
    let err = cascade_error(storage.delete_user(&ctx, &u1).await.unwrap_err());
    assert_eq!(err.cascade_step(), Some(&CascadeStep::DeleteUser));

    // A live user with no dependents is the only possible leftover.
    storage.get_user(&ctx, &u1).await.unwrap();
    assert!(storage.list_shares(&ctx, None).await.unwrap().is_empty());

    store.heal(Op::DeleteUser);
    storage.delete_user(&ctx, &u1).await.unwrap();
    assert!(storage.delete_user(&ctx, &u1).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_user_without_dependents_fails_plainly() {
    let (storage, store) = setup_flaky_storage();
    let ctx = OpContext::new();
    let u1 = create_user(&storage, "u1").await;

    store.fail(Op::DeleteUser);
    let err = storage.delete_user(&ctx, &u1).await.unwrap_err();
    assert!(!err.is_cascade_failure());
    assert!(matches!(err, filekeep::Error::Store(_)));
}

#[tokio::test]
async fn test_cascade_error_message_names_step() {
    let (storage, store) = setup_flaky_storage();
    let u1 = user_with_dependents(&storage, "u1", 2, 0).await;

    store.fail_after(Op::DeleteShare, 1);
    let err = storage
        .delete_user(&OpContext::new(), &u1)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "deleting user u1 failed at step 'delete share u1-s1' after 1 completed step(s)"
    );
}
