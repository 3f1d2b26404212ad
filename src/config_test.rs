use super::*;

/// # Safety
/// Tests must run with `--test-threads=1` to avoid env races.
unsafe fn clear_jobly_env() {
    unsafe {
        std::env::remove_var("SECRET_KEY");
        std::env::remove_var("JOBLY_API_URL");
        std::env::remove_var("JOBLY_STORAGE_PATH");
        std::env::remove_var("JOBLY_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("JOBLY_CONNECT_TIMEOUT_SECS");
    }
}

#[test]
fn env_defaults_and_overrides() {
    unsafe { clear_jobly_env() };

    let issuer = IssuerConfig::from_env();
    assert_eq!(issuer.secret_key, DEFAULT_SECRET_KEY);

    let client = ClientConfig::from_env();
    assert_eq!(client.base_url, DEFAULT_API_URL);
    assert_eq!(client.storage_path, PathBuf::from(DEFAULT_STORAGE_PATH));
    assert_eq!(client.timeouts, ClientTimeouts::default());

    unsafe {
        std::env::set_var("SECRET_KEY", "s3cret");
        std::env::set_var("JOBLY_API_URL", "https://jobly.example.test/");
        std::env::set_var("JOBLY_STORAGE_PATH", "/tmp/jobly.json");
        std::env::set_var("JOBLY_REQUEST_TIMEOUT_SECS", "42");
        std::env::set_var("JOBLY_CONNECT_TIMEOUT_SECS", "nope");
    }

    let issuer = IssuerConfig::from_env();
    assert_eq!(issuer.secret_key, "s3cret");

    let client = ClientConfig::from_env();
    assert_eq!(client.base_url, "https://jobly.example.test");
    assert_eq!(client.storage_path, PathBuf::from("/tmp/jobly.json"));
    assert_eq!(client.timeouts.request_secs, 42);
    assert_eq!(client.timeouts.connect_secs, DEFAULT_CONNECT_TIMEOUT_SECS);

    unsafe { clear_jobly_env() };
}

#[test]
fn timeouts_convert_to_durations() {
    let timeouts = ClientTimeouts { request_secs: 5, connect_secs: 2 };
    assert_eq!(timeouts.request(), Duration::from_secs(5));
    assert_eq!(timeouts.connect(), Duration::from_secs(2));
}
