//! Durable backends: SQLite key store and filesystem blob store.

use std::sync::Arc;

use keyward::{Vault, VaultConfig, VaultError};
use keyward_core::{Address, Role};
use keyward_store::{FsBlobStore, MemoryLedger, SqliteKeyStore};
use keyward_testkit::text_upload;

#[tokio::test]
async fn keys_and_blobs_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("alice-keys.db");
    let blob_dir = dir.path().join("blobs");
    let ledger = Arc::new(MemoryLedger::new());
    let alice = Address::from("alice");

    let receipt = {
        let vault = Vault::new(
            alice.clone(),
            Arc::new(SqliteKeyStore::open(&key_path).unwrap()),
            Arc::new(FsBlobStore::open(&blob_dir).await.unwrap()),
            ledger.clone(),
            VaultConfig::default(),
        );
        vault.register(Role::User).await.unwrap();
        vault.upload(text_upload("notes.txt", "hello")).await.unwrap()
    };

    // A new process: same files on disk, same ledger.
    let vault = Vault::new(
        alice,
        Arc::new(SqliteKeyStore::open(&key_path).unwrap()),
        Arc::new(FsBlobStore::open(&blob_dir).await.unwrap()),
        ledger,
        VaultConfig::default(),
    );
    assert!(vault.has_local_keys().await.unwrap());
    let file = vault.retrieve(&receipt.file_id).await.unwrap();
    assert_eq!(file.bytes, b"hello");
}

#[tokio::test]
async fn lost_key_store_means_not_registered() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(MemoryLedger::new());
    let blobs = Arc::new(FsBlobStore::open(dir.path()).await.unwrap());
    let alice = Address::from("alice");

    let receipt = {
        let vault = Vault::new(
            alice.clone(),
            Arc::new(SqliteKeyStore::open_memory().unwrap()),
            blobs.clone(),
            ledger.clone(),
            VaultConfig::default(),
        );
        vault.register(Role::User).await.unwrap();
        vault.upload(text_upload("notes.txt", "hello")).await.unwrap()
    };

    // Fresh device: the ledger still knows alice but the private key is gone.
    let vault = Vault::new(
        alice,
        Arc::new(SqliteKeyStore::open_memory().unwrap()),
        blobs,
        ledger,
        VaultConfig::default(),
    );
    vault.register(Role::User).await.unwrap();
    assert!(!vault.has_local_keys().await.unwrap());
    assert!(matches!(
        vault.retrieve(&receipt.file_id).await,
        Err(VaultError::NotRegistered(_))
    ));
}
