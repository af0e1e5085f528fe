use super::*;
use tempfile::TempDir;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let pairs: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| pairs.get(key).cloned()
}

#[test]
fn defaults_point_at_local_backend() {
    let settings = ClientSettings::default();
    assert_eq!(settings.server_url, "http://localhost:8865");
    assert_eq!(settings.identity_path, None);
    assert_eq!(settings.request_timeout(), None);
}

#[test]
fn file_values_override_defaults() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(SETTINGS_FILE);
    fs::write(
        &path,
        "server_url = \"http://cases.internal:9000\"\nidentity_path = \"/tmp/id\"\nrequest_timeout_secs = 30\n",
    )
    .expect("write");

    let mut settings = ClientSettings::default();
    apply_file(&mut settings, &path).expect("apply");

    assert_eq!(settings.server_url, "http://cases.internal:9000");
    assert_eq!(settings.identity_path, Some(PathBuf::from("/tmp/id")));
    assert_eq!(settings.request_timeout(), Some(Duration::from_secs(30)));
}

#[test]
fn malformed_file_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(SETTINGS_FILE);
    fs::write(&path, "server_url = ").expect("write");

    let err = apply_file(&mut ClientSettings::default(), &path).expect_err("parse error");
    assert!(err.to_string().contains("failed to parse settings file"));
}

#[test]
fn app_prefixed_env_wins_over_legacy_name() {
    let mut settings = ClientSettings::default();
    apply_env(
        &mut settings,
        env(&[
            ("CASEGEN_SERVER_URL", "http://legacy:1"),
            ("APP__SERVER_URL", "http://primary:2"),
            ("APP__REQUEST_TIMEOUT_SECS", "not-a-number"),
        ]),
    );

    assert_eq!(settings.server_url, "http://primary:2");
    assert_eq!(settings.request_timeout_secs, None);
}

#[test]
fn zero_timeout_means_no_timeout() {
    let mut settings = ClientSettings::default();
    apply_env(&mut settings, env(&[("APP__REQUEST_TIMEOUT_SECS", "0")]));

    assert_eq!(settings.request_timeout_secs, Some(0));
    assert_eq!(settings.request_timeout(), None);
}

#[test]
fn server_url_is_normalized() {
    assert_eq!(normalize_server_url("localhost:8865/"), "http://localhost:8865");
    assert_eq!(normalize_server_url(" https://cases.example/api/ "), "https://cases.example/api");
    assert_eq!(normalize_server_url("  "), "http://localhost:8865");
}
