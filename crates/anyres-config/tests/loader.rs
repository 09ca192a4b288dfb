use std::io::Write;
use std::time::Duration;

use anyres_config::{ConfigError, load_config};
use anyres_config::loader::load_config_with_default_path;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_file_and_environment_overrides() {
    let file = write_config(
        r#"
        subscription_id = "00000000-0000-0000-0000-000000000000"

        [features]
        default_location = "westeurope"

        [timeouts]
        create = "10m"
        "#,
    );

    // SAFETY: this is the only test in the binary touching ANYRES__ variables.
    unsafe {
        std::env::set_var("ANYRES__FEATURES__DEFAULT_NAMING", "from-env");
        std::env::set_var("ANYRES__TIMEOUTS__READ", "2m");
    }
    let config = load_config(file.path().to_str()).unwrap();
    unsafe {
        std::env::remove_var("ANYRES__FEATURES__DEFAULT_NAMING");
        std::env::remove_var("ANYRES__TIMEOUTS__READ");
    }

    assert_eq!(config.subscription_id, "00000000-0000-0000-0000-000000000000");
    assert_eq!(config.features.default_location.as_deref(), Some("westeurope"));
    assert_eq!(config.features.default_naming.as_deref(), Some("from-env"));
    assert_eq!(config.timeouts.create(), Duration::from_secs(600));
    assert_eq!(config.timeouts.read(), Duration::from_secs(120));
}

#[test]
fn invalid_file_fails_validation() {
    let file = write_config(
        r#"
        subscription_id = "sub"
        [logging]
        level = "chatty"
        "#,
    );
    let err = load_config_with_default_path(Some(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn missing_file_without_subscription_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = load_config(path.to_str()).unwrap_err();
    assert!(err.to_string().contains("subscription_id"));
}
