//! Settings are independent of every other domain

use filekeep::{OpContext, settings::Settings};

use crate::helpers::*;

#[tokio::test]
async fn test_settings_with_empty_user_store() {
    let (storage, _) = setup_storage();
    let ctx = OpContext::new();

    let settings = Settings {
        signup: true,
        create_user_dir: true,
        ..Settings::default()
    };
    storage.put_settings(&ctx, settings.clone()).await.unwrap();
    assert_eq!(storage.get_settings(&ctx).await.unwrap(), settings);
}

#[tokio::test]
async fn test_settings_while_other_stores_fail() {
    let (storage, store) = setup_flaky_storage();
    let ctx = OpContext::new();
    for op in [
        Op::GetUser,
        Op::DeleteUser,
        Op::DeleteShare,
        Op::ListSharesByOwner,
        Op::ListRulesBySubject,
        Op::PutRule,
    ] {
        store.fail(op);
    }

    storage
        .put_settings(&ctx, Settings::default())
        .await
        .unwrap();
    assert_eq!(storage.get_settings(&ctx).await.unwrap(), Settings::default());
}
