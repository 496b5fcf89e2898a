//! Configuration layering and session persistence on disk

use std::io::Write;
use std::time::Duration;

use serial_test::serial;

use souq_chat::client::{Config, SessionStore};
use souq_chat::shared::config::ConfigFile;
use souq_chat::shared::messaging::UserId;
use souq_chat::shared::{AppConfig, Locale};

const ENV_KEYS: [&str; 4] = [
    "SOUQ_API_URL",
    "SOUQ_POLL_INTERVAL_SECS",
    "SOUQ_LOCALE",
    "SOUQ_PUSHER_KEY",
];

fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

#[test]
fn test_file_then_env_layering() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
api_url = "https://staging.souq.example/api"
pusher_key = "file-key"
poll_interval_secs = 45
locale = "en"
"#
    )
    .unwrap();

    let parsed = ConfigFile::read(file.path()).unwrap();
    let config = AppConfig::builder()
        .apply_file(parsed)
        .apply_env(|key| match key {
            "SOUQ_PUSHER_KEY" => Some("env-key".to_string()),
            _ => None,
        })
        .build()
        .unwrap();

    assert_eq!(config.api_url, "https://staging.souq.example/api");
    assert_eq!(config.auth_endpoint, "https://staging.souq.example/broadcasting/auth");
    assert_eq!(config.realtime.key, "env-key");
    assert_eq!(config.poll_interval, Duration::from_secs(45));
    assert_eq!(config.locale, Locale::English);
}

#[test]
fn test_malformed_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "poll_interval_secs = \"soon\"").unwrap();
    assert!(ConfigFile::read(file.path()).is_err());
}

#[test]
#[serial]
fn test_load_reads_process_environment() {
    clear_env();
    std::env::set_var("SOUQ_API_URL", "http://localhost:8000/api/");
    std::env::set_var("SOUQ_POLL_INTERVAL_SECS", "5");
    std::env::set_var("SOUQ_LOCALE", "ar");

    let config = Config::load();
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.server_url(), "http://localhost:8000/api");
    assert_eq!(config.api_url("/chats"), "http://localhost:8000/api/chats");
    assert_eq!(config.poll_interval(), Duration::from_secs(5));
    assert_eq!(config.locale(), Locale::Arabic);
}

#[test]
#[serial]
fn test_load_rejects_invalid_url_from_environment() {
    clear_env();
    std::env::set_var("SOUQ_API_URL", "ftp://souq.example");
    let result = Config::load();
    clear_env();
    assert!(result.is_err());
}

#[test]
fn test_persistent_session_survives_restart_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let store = SessionStore::persistent(&path);
    assert!(!store.is_authenticated());
    store.set("token-1", Some(UserId(7))).unwrap();

    let reopened = SessionStore::persistent(&path);
    assert_eq!(reopened.token().as_deref(), Some("token-1"));
    assert_eq!(reopened.user_id(), Some(UserId(7)));

    reopened.clear();
    assert!(!path.exists());
    assert!(!SessionStore::persistent(&path).is_authenticated());
}

#[test]
fn test_clones_share_session() {
    let store = SessionStore::in_memory();
    let clone = store.clone();
    store.set("abc", None).unwrap();
    assert_eq!(clone.token().as_deref(), Some("abc"));
    clone.clear();
    assert!(!store.is_authenticated());
}
