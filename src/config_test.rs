use super::*;

/// # Safety
/// Env-mutating tests serialize on `ENV_LOCK`.
unsafe fn clear_clinic_env() {
    unsafe {
        std::env::remove_var("CLINIC_API_URL");
        std::env::remove_var("CLINIC_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("CLINIC_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("CLINIC_LOGIN_PATH");
        std::env::remove_var("CLINIC_HOME_PATH");
        std::env::remove_var("CLINIC_MUTATION_ORDERING");
    }
}

static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[test]
fn from_env_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_clinic_env() };

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg, ClientConfig::default());
    assert_eq!(cfg.api_url, DEFAULT_API_URL);
    assert_eq!(cfg.ordering, MutationOrdering::LastSettled);
}

#[test]
fn from_env_parses_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_clinic_env();
        std::env::set_var("CLINIC_API_URL", "https://crm.example.test/api/");
        std::env::set_var("CLINIC_REQUEST_TIMEOUT_SECS", "5");
        std::env::set_var("CLINIC_CONNECT_TIMEOUT_SECS", "2");
        std::env::set_var("CLINIC_LOGIN_PATH", "/entrar");
        std::env::set_var("CLINIC_HOME_PATH", "/dashboard");
        std::env::set_var("CLINIC_MUTATION_ORDERING", "last-issued");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_url, "https://crm.example.test/api");
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 5, connect_secs: 2 });
    assert_eq!(cfg.login_path, "/entrar");
    assert_eq!(cfg.home_path, "/dashboard");
    assert_eq!(cfg.ordering, MutationOrdering::LastIssued);

    unsafe { clear_clinic_env() };
}

#[test]
fn from_env_ignores_unparseable_or_zero_timeouts() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_clinic_env();
        std::env::set_var("CLINIC_REQUEST_TIMEOUT_SECS", "soon");
        std::env::set_var("CLINIC_CONNECT_TIMEOUT_SECS", "0");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(
        cfg.timeouts,
        Timeouts { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    );

    unsafe { clear_clinic_env() };
}

#[test]
fn from_env_rejects_relative_login_path() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_clinic_env();
        std::env::set_var("CLINIC_LOGIN_PATH", "login");
    }

    let err = ClientConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Parse(msg) if msg.contains("CLINIC_LOGIN_PATH")));

    unsafe { clear_clinic_env() };
}

#[test]
fn parse_ordering_rejects_unknown_value() {
    assert_eq!(parse_ordering(None), Ok(MutationOrdering::LastSettled));
    assert_eq!(parse_ordering(Some(" last-issued ")), Ok(MutationOrdering::LastIssued));
    assert!(parse_ordering(Some("newest")).is_err());
}
