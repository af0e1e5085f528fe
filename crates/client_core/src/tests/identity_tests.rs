use super::*;
use tempfile::TempDir;

#[test]
fn identity_is_stable_across_calls() {
    let mut provider = IdentityProvider::new(MemoryIdentityStore::new());

    let first = provider.get_or_create();
    let second = provider.get_or_create();

    assert_eq!(first, second);
    assert!(first.as_str().starts_with("user_"));
    assert!(!provider.is_degraded());
}

#[test]
fn stored_identity_is_reused_by_a_new_provider() {
    let store = MemoryIdentityStore::new();
    let first = IdentityProvider::new(store.clone()).get_or_create();

    let again = IdentityProvider::new(store).get_or_create();

    assert_eq!(first, again);
}

#[test]
fn clearing_storage_yields_a_new_identity() {
    let store = MemoryIdentityStore::new();
    let first = IdentityProvider::new(store.clone()).get_or_create();

    store.clear().expect("clear");
    let second = IdentityProvider::new(store).get_or_create();

    assert_ne!(first, second);
}

#[test]
fn file_store_persists_identity() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("nested").join("user_uuid");

    let created = IdentityProvider::from_path(Some(path.clone())).get_or_create();

    let on_disk = fs::read_to_string(&path).expect("identity file");
    assert_eq!(on_disk, created.as_str());
    let mut reopened = IdentityProvider::from_path(Some(path));
    assert_eq!(reopened.existing(), Ok(created));
}

#[test]
fn blank_identity_file_counts_as_missing() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("user_uuid");
    fs::write(&path, "  \n").expect("write");

    let mut provider = IdentityProvider::new(FileIdentityStore::new(&path));

    assert_eq!(provider.existing(), Err(ClientError::MissingIdentity));
    let created = provider.get_or_create();
    assert_eq!(fs::read_to_string(&path).expect("read"), created.as_str());
}

#[test]
fn existing_never_creates() {
    let store = MemoryIdentityStore::new();
    let mut provider = IdentityProvider::new(store.clone());

    assert_eq!(provider.existing(), Err(ClientError::MissingIdentity));
    assert_eq!(store.load().expect("load"), None);
}

#[test]
fn unavailable_storage_degrades_to_session_identity() {
    let mut provider = IdentityProvider::new(UnavailableIdentityStore);

    let first = provider.get_or_create();
    let second = provider.get_or_create();

    assert!(provider.is_degraded());
    assert_eq!(first, second);
    assert_eq!(provider.existing(), Ok(first));
}

#[test]
fn generated_identities_have_expected_shape() {
    let identity = generate_identity();
    let parts: Vec<&str> = identity.as_str().split('_').collect();

    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "user");
    assert_eq!(parts[1].len(), RANDOM_SUFFIX_LEN);
    assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
    assert_ne!(identity, generate_identity());
}

#[test]
fn base36_encoding() {
    assert_eq!(to_base36(0), "0");
    assert_eq!(to_base36(35), "z");
    assert_eq!(to_base36(36), "10");
}
