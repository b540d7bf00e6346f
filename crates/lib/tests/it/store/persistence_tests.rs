//! Facade state across a save and reload of the in-memory store

use std::sync::Arc;

use filekeep::{InMemory, OpContext, Storage, StorageError, settings::Settings, user::User};

use crate::helpers::*;

#[tokio::test]
async fn test_deleted_user_stays_deleted_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filekeep.json");
    let ctx = OpContext::new();

    {
        let (storage, store) = setup_storage();
        let u1 = user_with_dependents(&storage, "u1", 1, 1).await;
        create_user(&storage, "u2").await;
        storage.delete_user(&ctx, &u1).await.unwrap();
        store.save_to_file(&path).await.unwrap();
    }

    let storage = Storage::in_memory(Arc::new(InMemory::load_from_file(&path).await.unwrap()));
    assert!(storage.get_user(&ctx, &"u1".into()).await.unwrap_err().is_not_found());
    storage.get_user(&ctx, &"u2".into()).await.unwrap();

    let err = storage
        .create_user(&ctx, User::with_key("u1", "reborn"))
        .await
        .unwrap_err();
    match err {
        filekeep::Error::Storage(StorageError::DuplicateKey { retired, .. }) => assert!(retired),
        other => panic!("unexpected error: {other:?}"),
    }

    assert!(storage.get_share(&ctx, &"u1-s0".into()).await.unwrap_err().is_not_found());
    assert!(
        storage
            .get_auth_rule(&ctx, &"u1-r0".into())
            .await
            .unwrap()
            .is_global()
    );
}

#[tokio::test]
async fn test_settings_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filekeep.json");
    let ctx = OpContext::new();
    let settings = Settings {
        signup: true,
        min_password_length: 20,
        ..Settings::default()
    };

    let (storage, store) = setup_storage();
    storage.put_settings(&ctx, settings.clone()).await.unwrap();
    store.save_to_file(&path).await.unwrap();

    let storage = Storage::in_memory(Arc::new(InMemory::load_from_file(&path).await.unwrap()));
    assert_eq!(storage.get_settings(&ctx).await.unwrap(), settings);
}

#[tokio::test]
async fn test_save_replaces_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filekeep.json");

    let (storage, store) = setup_storage();
    create_user(&storage, "u1").await;
    store.save_to_file(&path).await.unwrap();
    create_user(&storage, "u2").await;
    store.save_to_file(&path).await.unwrap();

    let reloaded = Storage::in_memory(Arc::new(InMemory::load_from_file(&path).await.unwrap()));
    assert_eq!(
        reloaded.list_users(&OpContext::new()).await.unwrap().len(),
        2
    );
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    assert!(!std::path::Path::new(&tmp).exists());
}
