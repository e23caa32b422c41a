use axum::http::header::LOCATION;
use axum::http::StatusCode;
use phrasebook::config::GoogleCfg;
use phrasebook::web::session::{OAUTH_STATE_COOKIE, OAUTH_VERIFIER_COOKIE};
use tower::ServiceExt; // for oneshot
use tower_cookies::cookie::{Cookie, CookieJar};
use tower_cookies::Key;

#[path = "common.rs"]
mod common;

fn google_config() -> phrasebook::config::AppConfig {
    let mut config = common::test_config();
    config.google = Some(GoogleCfg {
        client_id: "test-client".into(),
        client_secret: "test-secret".into(),
        redirect_uri: "http://127.0.0.1:8080/api/auth/google/callback".into(),
    });
    config
}

/// Encrypts state/verifier cookies with the app key, the way a browser
/// would present them after the start redirect.
fn oauth_cookie_header(state: &str, verifier: &str) -> String {
    let key = Key::from(&common::TEST_COOKIE_KEY);
    let mut jar = CookieJar::new();
    jar.private_mut(&key).add(Cookie::new(OAUTH_STATE_COOKIE, state.to_string()));
    jar.private_mut(&key).add(Cookie::new(OAUTH_VERIFIER_COOKIE, verifier.to_string()));
    jar.iter().map(|c| format!("{}={}", c.name(), c.value())).collect::<Vec<_>>().join("; ")
}

#[tokio::test]
async fn start_without_config_is_a_server_error() {
    let app = common::spawn_app().expect("spawn app");
    let res =
        app.router.clone().oneshot(common::get_request("/api/auth/google", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let v = common::body_json(res).await;
    assert_eq!(v["error"], "Google OAuth is not configured");
}

#[tokio::test]
async fn start_redirects_to_google_with_pkce() {
    let app = common::spawn_app_with(google_config()).expect("spawn app");
    let res =
        app.router.clone().oneshot(common::get_request("/api/auth/google", None)).await.unwrap();

    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = res.headers().get(LOCATION).expect("Location header").to_str().unwrap();
    assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth"), "{location}");
    assert!(location.contains("client_id=test-client"), "{location}");
    assert!(location.contains("response_type=code"), "{location}");
    assert!(location.contains("state="), "{location}");
    assert!(location.contains("code_challenge="), "{location}");
    assert!(location.contains("code_challenge_method=S256"), "{location}");
    assert!(location.contains("access_type=offline"), "{location}");
    assert!(location.contains("prompt=consent"), "{location}");
    assert!(location.contains("scope="), "{location}");

    // Both ephemeral cookies are set with a short lifetime
    let cookies = common::set_cookies_from(&res);
    for name in [OAUTH_STATE_COOKIE, OAUTH_VERIFIER_COOKIE] {
        let cookie = cookies
            .iter()
            .find(|c| c.starts_with(&format!("{name}=")))
            .unwrap_or_else(|| panic!("missing {name} cookie"));
        assert!(cookie.contains("Max-Age=600"), "{cookie}");
        assert!(cookie.contains("HttpOnly"), "{cookie}");
    }
}

#[tokio::test]
async fn callback_with_mismatched_state_is_rejected_before_exchange() {
    let app = common::spawn_app_with(google_config()).expect("spawn app");
    let header = oauth_cookie_header("expected-state", "some-verifier");

    // No token endpoint exists in this test; the request only passes if the
    // mismatch short-circuits before any exchange.
    let res = app
        .router
        .clone()
        .oneshot(common::get_request(
            "/api/auth/google/callback?code=abc&state=wrong-state",
            Some(&header),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = res.headers().get(LOCATION).unwrap().to_str().unwrap();
    assert_eq!(location, "/?auth_error=state_mismatch");
    assert_oauth_cookies_cleared(&res);
}

#[tokio::test]
async fn callback_propagates_provider_error_indicator() {
    let app = common::spawn_app_with(google_config()).expect("spawn app");
    let header = oauth_cookie_header("expected-state", "some-verifier");

    let res = app
        .router
        .clone()
        .oneshot(common::get_request("/api/auth/google/callback?error=access_denied", Some(&header)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = res.headers().get(LOCATION).unwrap().to_str().unwrap();
    assert_eq!(location, "/?auth_error=access_denied");
    assert_oauth_cookies_cleared(&res);
}

#[tokio::test]
async fn callback_without_code_or_state_is_rejected() {
    let app = common::spawn_app_with(google_config()).expect("spawn app");
    let header = oauth_cookie_header("expected-state", "some-verifier");

    let res = app
        .router
        .clone()
        .oneshot(common::get_request("/api/auth/google/callback?code=abc", Some(&header)))
        .await
        .unwrap();

    let location = res.headers().get(LOCATION).unwrap().to_str().unwrap();
    assert_eq!(location, "/?auth_error=missing_code");
    assert_oauth_cookies_cleared(&res);
}

#[tokio::test]
async fn callback_without_stored_artifacts_is_rejected() {
    let app = common::spawn_app_with(google_config()).expect("spawn app");

    let res = app
        .router
        .clone()
        .oneshot(common::get_request("/api/auth/google/callback?code=abc&state=s", None))
        .await
        .unwrap();

    let location = res.headers().get(LOCATION).unwrap().to_str().unwrap();
    assert_eq!(location, "/?auth_error=missing_oauth_session");
}

fn assert_oauth_cookies_cleared(res: &axum::http::Response<axum::body::Body>) {
    let cookies = common::set_cookies_from(res);
    for name in [OAUTH_STATE_COOKIE, OAUTH_VERIFIER_COOKIE] {
        let removal = cookies
            .iter()
            .find(|c| c.starts_with(&format!("{name}=;")) || c.starts_with(&format!("{name}=\"\"")))
            .or_else(|| {
                cookies.iter().find(|c| c.starts_with(&format!("{name}=")) && c.contains("Max-Age=0"))
            });
        assert!(removal.is_some(), "expected removal Set-Cookie for {name}, got {cookies:?}");
    }
}
