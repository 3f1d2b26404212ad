use super::*;

fn base(url: &str) -> Url {
    Url::parse(url).unwrap()
}

#[test]
fn endpoint_formats_user_path() {
    let url = endpoint(&base("http://localhost:3001"), &["users", "u1"]).unwrap();
    assert_eq!(url.as_str(), "http://localhost:3001/users/u1");
}

#[test]
fn endpoint_formats_apply_path() {
    let url = endpoint(&base("http://api"), &["users", "u1", "jobs", "7"]).unwrap();
    assert_eq!(url.as_str(), "http://api/users/u1/jobs/7");
}

#[test]
fn endpoint_keeps_base_path_prefix() {
    let url = endpoint(&base("http://api/v1"), &["auth", "token"]).unwrap();
    assert_eq!(url.as_str(), "http://api/v1/auth/token");
}

#[test]
fn endpoint_escapes_reserved_characters_in_username() {
    let url = endpoint(&base("http://api"), &["users", "a/b?c#d"]).unwrap();
    assert_eq!(url.path(), "/users/a%2Fb%3Fc%23d");
    assert_eq!(url.query(), None);
    assert_eq!(url.fragment(), None);
}

#[test]
fn new_rejects_relative_base_url() {
    let config = ClientConfig {
        base_url: "localhost-without-scheme".into(),
        storage_path: "unused.json".into(),
        timeouts: crate::config::ClientTimeouts::default(),
    };
    assert!(matches!(HttpJoblyApi::new(&config), Err(ApiError::InvalidBaseUrl(_))));
}

#[test]
fn error_messages_single_string() {
    let body = r#"{"error": {"message": "Invalid username/password", "status": 401}}"#;
    assert_eq!(error_messages(StatusCode::UNAUTHORIZED, body), vec!["Invalid username/password"]);
}

#[test]
fn error_messages_list() {
    let body = r#"{"error": {"message": ["instance.username is required", "instance.password is required"], "status": 400}}"#;
    assert_eq!(
        error_messages(StatusCode::BAD_REQUEST, body),
        vec!["instance.username is required", "instance.password is required"]
    );
}

#[test]
fn error_messages_non_json_body() {
    assert_eq!(error_messages(StatusCode::BAD_GATEWAY, "upstream down"), vec!["upstream down"]);
}

#[test]
fn error_messages_empty_body_uses_reason() {
    assert_eq!(error_messages(StatusCode::NOT_FOUND, ""), vec!["Not Found"]);
}

#[test]
fn rejected_messages_are_returned_verbatim() {
    let err = ApiError::Rejected { status: 400, messages: vec!["a".into(), "b".into()] };
    assert_eq!(err.messages(), vec!["a", "b"]);
    assert_eq!(err.to_string(), "API rejected request: status 400: a; b");
}

#[test]
fn transport_error_messages_wrap_display() {
    let err = ApiError::Request("connection refused".into());
    assert_eq!(err.messages(), vec!["API request failed: connection refused"]);
}

#[test]
fn new_trims_trailing_slash() {
    let config = ClientConfig {
        base_url: "http://localhost:3001/".into(),
        storage_path: "unused.json".into(),
        timeouts: crate::config::ClientTimeouts::default(),
    };
    let api = HttpJoblyApi::new(&config).unwrap();
    assert_eq!(api.base_url(), "http://localhost:3001");
}
