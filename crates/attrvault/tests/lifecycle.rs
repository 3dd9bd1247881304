//! Key provisioning, persistence, tokens and shared use across threads.

use std::sync::Arc;
use std::thread;

use attrvault::keys::{
    AuthorityKeys, FileKeyStore, KeyError, KeySlot, KeyStore, RootKey, TrustedAuthority,
};
use attrvault::{
    open_key_store, start_authority, start_content_service, RecordKind, VaultConfig, VaultError,
};
use attrvault_testkit::{TestVault, FIXTURE_NOW};

#[tokio::test]
async fn test_token_expiry_boundary() {
    let vault = TestVault::new().await;
    let session = vault.login("42", &["patient"]);
    let token = session.token.as_str();

    assert!(vault.content.authenticate_at(token, FIXTURE_NOW + 3599).is_ok());
    let err = vault
        .content
        .authenticate_at(token, FIXTURE_NOW + 3601)
        .unwrap_err();
    assert!(matches!(err, VaultError::Key(KeyError::Expired)));
}

#[tokio::test]
async fn test_file_store_provision_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let config = VaultConfig {
        key_dir: dir.path().join("keys"),
        ..VaultConfig::default()
    };
    let root = RootKey::generate();

    let (record, session) = {
        let store = open_key_store(&config).await.unwrap();
        let authority = start_authority(&store, &root, &config).await.unwrap();
        let content = start_content_service(&store, config.clone()).await.unwrap();

        let session = authority.login_at("n1", ["nurse"], FIXTURE_NOW).unwrap();
        let record = content
            .seal_record(RecordKind::HealthRecord, "3", &session.attributes, b"vitals")
            .unwrap();
        (record.to_bytes(), session)
    };

    // Every slot was written.
    let store = FileKeyStore::open(&config.key_dir).await.unwrap();
    for slot in KeySlot::ALL {
        assert!(store.get(slot).await.unwrap().is_some(), "{slot}");
    }

    // A restarted authority keeps the same keys.
    let authority = start_authority(&store, &root, &config).await.unwrap();
    let content = start_content_service(&store, config.clone()).await.unwrap();
    assert!(content
        .authenticate_at(session.token.as_str(), FIXTURE_NOW + 10)
        .is_ok());

    let record = attrvault::Ciphertext::from_bytes(&record).unwrap();
    assert_eq!(
        content.open_record(&record, &session.secret_key).unwrap(),
        b"vitals"
    );
    let fresh = authority.login_at("n2", ["nurse"], FIXTURE_NOW).unwrap();
    assert_eq!(
        content.open_record(&record, &fresh.secret_key).unwrap(),
        b"vitals"
    );

    // Without the root key nothing secret loads.
    assert!(matches!(
        AuthorityKeys::load(&store, &RootKey::generate()).await,
        Err(KeyError::Unseal(_))
    ));
}

#[tokio::test]
async fn test_provision_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileKeyStore::open(dir.path()).await.unwrap();
    let root = RootKey::generate();

    AuthorityKeys::provision(&store, &root).await.unwrap();
    assert!(matches!(
        AuthorityKeys::provision(&store, &root).await,
        Err(KeyError::AlreadyProvisioned)
    ));
}

#[tokio::test]
async fn test_reprovision_invalidates_prior_keys() {
    let vault = TestVault::new().await;
    let doctor = vault.login("d1", &["doctor"]);

    let fresh = AuthorityKeys::reprovision(&vault.store, &vault.root)
        .await
        .unwrap();
    let authority = TrustedAuthority::new(fresh);
    let content = start_content_service(&vault.store, VaultConfig::default())
        .await
        .unwrap();

    let record = content
        .seal_record(RecordKind::ResearchRecord, "1", &doctor.attributes, b"cohort")
        .unwrap();
    assert!(content
        .open_record(&record, &doctor.secret_key)
        .unwrap_err()
        .is_permission_denied());

    let renewed = authority.login_at("d1", ["doctor"], FIXTURE_NOW).unwrap();
    assert_eq!(
        content.open_record(&record, &renewed.secret_key).unwrap(),
        b"cohort"
    );
}

#[tokio::test]
async fn test_content_service_is_shareable_across_threads() {
    let vault = TestVault::new().await;
    let content = Arc::new(vault.content.clone());
    let sessions: Vec<_> = (0..4)
        .map(|i| vault.login(&format!("d{i}"), &["doctor"]))
        .collect();

    thread::scope(|scope| {
        for (i, session) in sessions.iter().enumerate() {
            let content = Arc::clone(&content);
            scope.spawn(move || {
                let payload = format!("note {i}").into_bytes();
                let record = content
                    .seal_record(RecordKind::HealthRecord, "42", &session.attributes, &payload)
                    .unwrap();
                assert_eq!(content.open_record(&record, &session.secret_key).unwrap(), payload);
            });
        }
    });
}
