use super::*;
use serial_test::serial;
use std::env;
use std::time::Duration;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_quill_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        env::remove_var("QUILL_API_BASE_URL");
        env::remove_var("QUILL_REQUEST_TIMEOUT_SECS");
        env::remove_var("QUILL_DEBOUNCE_MS");
        env::remove_var("QUILL_SEARCH_STALE_SECS");
        env::remove_var("QUILL_FULL_TEXT_STALE_SECS");
        env::remove_var("QUILL_RECORD_STALE_SECS");
        env::remove_var("QUILL_POLL_INTERVAL_MS");
        env::remove_var("QUILL_MAX_POLL_FAILURES");
        env::remove_var("QUILL_MAX_UNMEASURED_POLLS");
        env::remove_var("QUILL_CACHE_CAPACITY");
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.api_base_url, "http://localhost:8000");
    assert_eq!(config.debounce, Duration::from_millis(300));
    assert_eq!(config.search_stale_after, Duration::from_secs(60));
    assert_eq!(config.full_text_stale_after, Duration::from_secs(300));
    assert_eq!(config.poll_interval, Duration::from_millis(1_000));
    assert_eq!(config.max_poll_failures, 3);
    assert_eq!(config.max_unmeasured_polls, 30);
    assert_eq!(config.cache_capacity, 1_024);
}

#[test]
fn test_api_root_strips_trailing_slashes() {
    let config = Config {
        api_base_url: "https://memo.example.com///".to_string(),
        ..Default::default()
    };
    assert_eq!(config.api_root(), "https://memo.example.com/api");

    assert_eq!(Config::default().api_root(), "http://localhost:8000/api");
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_quill_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn test_from_env_custom_timings() {
    clear_quill_env();

    with_env_vars(
        &[
            ("QUILL_DEBOUNCE_MS", "500"),
            ("QUILL_POLL_INTERVAL_MS", "250"),
            ("QUILL_SEARCH_STALE_SECS", "10"),
            ("QUILL_REQUEST_TIMEOUT_SECS", "5"),
        ],
        || {
            let config = Config::from_env().expect("should parse");
            assert_eq!(config.debounce, Duration::from_millis(500));
            assert_eq!(config.poll_interval, Duration::from_millis(250));
            assert_eq!(config.search_stale_after, Duration::from_secs(10));
            assert_eq!(config.request_timeout, Duration::from_secs(5));
        },
    );
}

#[test]
#[serial]
fn test_from_env_custom_base_url_is_trimmed() {
    clear_quill_env();

    with_env_vars(&[("QUILL_API_BASE_URL", "  http://backend:9000/  ")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(config.api_base_url, "http://backend:9000/");
        assert_eq!(config.api_root(), "http://backend:9000/api");
    });
}

#[test]
#[serial]
fn test_from_env_blank_base_url_uses_default() {
    clear_quill_env();

    with_env_vars(&[("QUILL_API_BASE_URL", "   ")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    });
}

#[test]
#[serial]
fn test_from_env_invalid_number() {
    clear_quill_env();

    with_env_vars(&[("QUILL_MAX_POLL_FAILURES", "three")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                name: "QUILL_MAX_POLL_FAILURES",
                ..
            }
        ));
        assert!(err.to_string().contains("three"));
    });
}

#[test]
fn test_validate_success_with_defaults() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_validate_rejects_non_http_base_url() {
    let config = Config {
        api_base_url: "ftp://memo.example.com".to_string(),
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
    assert!(err.to_string().contains("ftp://memo.example.com"));
}

#[test]
fn test_validate_rejects_zero_poll_interval() {
    let config = Config {
        poll_interval: Duration::ZERO,
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::ZeroValue {
            name: "QUILL_POLL_INTERVAL_MS"
        }
    ));
}

#[test]
fn test_validate_allows_zero_debounce_and_staleness() {
    let config = Config {
        debounce: Duration::ZERO,
        search_stale_after: Duration::ZERO,
        ..Default::default()
    };

    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_zero_failure_budget() {
    let config = Config {
        max_poll_failures: 0,
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ZeroValue { .. })
    ));
}
