use lookup_mcp::config::{AppConfig, DEFAULT_CONFIG_FILE, LogFormat};
use serial_test::serial;
use std::env;
use std::fs;
use std::io::Write;

const VARS: &[&str] = &[
    "LOOKUP_CONFIG_FILE",
    "LOOKUP_API_URL",
    "LOOKUP_API_KEY",
    "LOOKUP_API_TIMEOUT_MS",
    "LOOKUP_LOG_LEVEL",
    "LOOKUP_LOG_FORMAT",
    "LOOKUP_API__TIMEOUT_MS",
    "LOOKUP_API__AUTH_SCHEME",
    "LOOKUP_SERVER__NAME",
    "LOOKUP_LOGGING__FORMAT",
    "LOOKUP_LOGGING__LEVEL",
];

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    for var in VARS {
        unsafe {
            env::remove_var(var);
        }
    }
}

fn load(args: &[&str]) -> AppConfig {
    let mut argv = vec!["lookup-mcp"];
    argv.extend_from_slice(args);
    AppConfig::load_from_args(argv).expect("Failed to load config")
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = load(&[]);
    assert_eq!(config.server.name, "lookup-mcp");
    assert_eq!(config.api.timeout_ms, 30_000);
    assert_eq!(config.api.auth_scheme, "Bearer");
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, LogFormat::Text);
    assert!(config.api.client_config().unwrap().is_none());
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("LOOKUP_API__TIMEOUT_MS", "4500");
        env::set_var("LOOKUP_SERVER__NAME", "kb-tools");
    }

    let config = load(&[]);
    assert_eq!(config.api.timeout_ms, 4500);
    assert_eq!(config.server.name, "kb-tools");

    clear_env_vars();
}

#[test]
#[serial]
fn test_direct_env_aliases() {
    clear_env_vars();
    unsafe {
        env::set_var("LOOKUP_API_URL", "https://kb.example.com/api/v1");
        env::set_var("LOOKUP_API_KEY", "secret");
        env::set_var("LOOKUP_API_TIMEOUT_MS", "2500");
        env::set_var("LOOKUP_LOG_FORMAT", "JSON");
    }

    let config = load(&[]);
    let client = config.api.client_config().unwrap().unwrap();
    assert_eq!(client.base_url, "https://kb.example.com/api/v1");
    assert_eq!(client.credential, "secret");
    assert_eq!(client.timeout_ms(), 2500);
    assert_eq!(config.logging.format, LogFormat::Json);

    clear_env_vars();
}

#[test]
#[serial]
fn test_sectioned_logging_env_is_normalized() {
    clear_env_vars();
    unsafe {
        env::set_var("LOOKUP_LOGGING__FORMAT", "JSON");
        env::set_var("LOOKUP_LOGGING__LEVEL", "Warn");
    }

    let config = load(&[]);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.logging.level, "warn");

    clear_env_vars();
}

#[test]
#[serial]
fn test_unknown_log_level_rejected() {
    clear_env_vars();
    unsafe {
        env::set_var("LOOKUP_LOGGING__LEVEL", "loud");
    }

    let result = AppConfig::load_from_args(["lookup-mcp"]);
    assert!(result.is_err());

    clear_env_vars();
    let result = AppConfig::load_from_args(["lookup-mcp", "--log-format", "yaml"]);
    assert!(result.is_err());

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_beats_env() {
    clear_env_vars();
    unsafe {
        env::set_var("LOOKUP_API__TIMEOUT_MS", "4500");
    }

    let config = load(&["--timeout-ms", "900", "--log-level", "debug"]);
    assert_eq!(config.api.timeout_ms, 900);
    assert_eq!(config.logging.level, "debug");

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("Failed to create temp config");
    writeln!(
        file,
        r#"
api:
  base_url: "http://127.0.0.1:8080/api/v1"
  api_key: "Token abc"
  timeout_ms: 7000
logging:
  format: json
"#
    )
    .unwrap();

    let path = file.path().to_str().unwrap().to_string();
    let config = load(&["--config", &path]);
    assert_eq!(config.api.timeout_ms, 7000);
    assert_eq!(config.logging.format, LogFormat::Json);
    let client = config.api.client_config().unwrap().unwrap();
    assert_eq!(client.credential, "Token abc");

    // Env layers over the file
    unsafe {
        env::set_var("LOOKUP_API__TIMEOUT_MS", "8000");
    }
    let config = load(&["-c", &path]);
    assert_eq!(config.api.timeout_ms, 8000);

    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_explicit_file_fails() {
    clear_env_vars();
    let result = AppConfig::load_from_args(["lookup-mcp", "--config", "/nonexistent/lookup.yaml"]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_cwd_config_fallback() {
    clear_env_vars();

    let config_content = r"
api:
  timeout_ms: 6060
    ";
    fs::write(DEFAULT_CONFIG_FILE, config_content).expect("Failed to write ./lookup.yaml");

    let result = std::panic::catch_unwind(|| {
        let config = load(&[]);
        assert_eq!(config.api.timeout_ms, 6060);
    });

    fs::remove_file(DEFAULT_CONFIG_FILE).unwrap();

    if let Err(e) = result {
        std::panic::resume_unwind(e);
    }
}
