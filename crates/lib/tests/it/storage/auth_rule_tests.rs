//! Auth rules through the facade

use filekeep::{
    OpContext,
    auth::{AuthMethod, AuthRule},
};

use crate::helpers::*;

#[tokio::test]
async fn test_rule_for_missing_subject_is_rejected() {
    let (storage, _) = setup_storage();
    let ctx = OpContext::new();

    let rule = AuthRule::new("r1", AuthMethod::Json).for_subject("ghost");
    let err = storage.upsert_auth_rule(&ctx, rule).await.unwrap_err();
    assert!(err.is_dangling_reference());
    assert!(storage.get_auth_rule(&ctx, &"r1".into()).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_rule_degrades_to_global_on_user_delete() {
    let (storage, _) = setup_storage();
    let ctx = OpContext::new();
    let u1 = create_user(&storage, "u1").await;
    let hook = AuthMethod::Hook {
        command: "/usr/local/bin/check-login".to_string(),
    };
    storage
        .upsert_auth_rule(&ctx, AuthRule::new("r1", hook.clone()).for_subject("u1"))
        .await
        .unwrap();

    storage.delete_user(&ctx, &u1).await.unwrap();

    let rule = storage.get_auth_rule(&ctx, &"r1".into()).await.unwrap();
    assert!(rule.is_global());
    assert_eq!(rule.method, hook);
}

#[tokio::test]
async fn test_rules_for_other_users_are_untouched() {
    let (storage, _) = setup_storage();
    let ctx = OpContext::new();
    let alice = user_with_dependents(&storage, "alice", 0, 2).await;
    user_with_dependents(&storage, "bob", 0, 1).await;
    create_rule(&storage, "global", None).await;

    storage.delete_user(&ctx, &alice).await.unwrap();

    let rules = storage.list_auth_rules(&ctx).await.unwrap();
    assert_eq!(rules.len(), 4);
    let bobs: Vec<_> = rules.iter().filter(|r| !r.is_global()).collect();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].id, "bob-r0");
}

#[tokio::test]
async fn test_invalid_rule_is_rejected() {
    let (storage, _) = setup_storage();
    let rule = AuthRule::new(
        "r1",
        AuthMethod::Proxy {
            header: " ".to_string(),
        },
    );
    let err = storage
        .upsert_auth_rule(&OpContext::new(), rule)
        .await
        .unwrap_err();
    assert!(err.is_validation_error());
}
