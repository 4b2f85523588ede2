// gateway/tests/gateway_tests.rs
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::test;
use common::GatewayConfig;
use gateway::build_app;
use gateway::session_store::{MemorySessionStore, SessionStore};
use serde_json::Value;
use uuid::Uuid;

const COOKIE_NAME: &str = "gateway_session";

/// Temp-dir fixture holding bundle directories for the three configured
/// apps plus a public root, cleaned up on drop
struct TestSite {
    root: PathBuf,
    config: GatewayConfig,
    store: Arc<MemorySessionStore>,
}

impl TestSite {
    fn new() -> Self {
        let root = std::env::temp_dir().join(format!("gateway-test-{}", Uuid::new_v4()));

        let mut config = GatewayConfig::default();
        config.public_dir = root.join("public");
        fs::create_dir_all(&config.public_dir).unwrap();
        fs::write(config.public_dir.join("favicon.ico"), b"icon").unwrap();

        for app in &mut config.apps {
            app.dir = root.join(app.prefix.trim_start_matches('/'));
            fs::create_dir_all(&app.dir).unwrap();
            fs::write(
                app.dir.join("index.html"),
                format!("<html><body>{} entry</body></html>", app.name),
            )
            .unwrap();
        }

        // One real bundle file to exercise direct hits
        fs::write(
            root.join("aerosole").join("app.js"),
            "console.log('aerosole');",
        )
        .unwrap();

        // And one file under an explicit asset mount
        let assets = root.join("aerosole").join("assets");
        fs::create_dir_all(&assets).unwrap();
        fs::write(assets.join("chunk.css"), "body{}").unwrap();

        // Nothing listens here; proxy tests expect a refused connection
        config.upstream.origin = "http://127.0.0.1:9".to_string();
        config.upstream.timeout_secs = 2;

        Self {
            root,
            config,
            store: Arc::new(MemorySessionStore::new()),
        }
    }

    fn store_dyn(&self) -> Arc<dyn SessionStore> {
        self.store.clone()
    }
}

impl Drop for TestSite {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn session_cookie<B>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|c| c.name() == COOKIE_NAME)
        .expect("response should carry the session cookie")
        .into_owned()
}

fn location<B>(res: &ServiceResponse<B>) -> &str {
    res.headers()
        .get(header::LOCATION)
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap()
}

/// Log in with the demo credentials and return the session cookie
async fn login<S, B>(app: &S) -> Cookie<'static>
where
    S: actix_web::dev::Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([("username", "demo@1digitals.com"), ("password", "1Digitals@123")])
        .to_request();
    let res = test::call_service(app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/");
    session_cookie(&res)
}

#[actix_web::test]
async fn unauthenticated_app_request_redirects_and_records_destination() {
    let site = TestSite::new();
    let app = test::init_service(build_app(site.config.clone(), site.store_dyn())).await;

    let req = test::TestRequest::get().uri("/aerosole").to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/login");

    let cookie = session_cookie(&res);
    let session = site.store.get(cookie.value()).expect("session was created");
    assert!(!session.authenticated);
    assert_eq!(session.return_to.as_deref(), Some("/aerosole"));
}

#[actix_web::test]
async fn query_string_is_part_of_the_recorded_destination() {
    let site = TestSite::new();
    let app = test::init_service(build_app(site.config.clone(), site.store_dyn())).await;

    let req = test::TestRequest::get()
        .uri("/express/checkout?step=2")
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    let cookie = session_cookie(&res);
    assert_eq!(
        site.store.get(cookie.value()).unwrap().return_to.as_deref(),
        Some("/express/checkout?step=2")
    );
}

#[actix_web::test]
async fn login_page_and_exempt_extensions_never_redirect() {
    let site = TestSite::new();
    let app = test::init_service(build_app(site.config.clone(), site.store_dyn())).await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/login").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);

    // Bundle assets load before authentication completes
    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/aerosole/app.js").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    // Even a miss with an exempt extension must not bounce to the login form
    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/no-such-file.css").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Public root files are reachable anonymously
    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/favicon.ico").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn login_with_demo_credentials_authenticates_the_session() {
    let site = TestSite::new();
    let app = test::init_service(build_app(site.config.clone(), site.store_dyn())).await;

    let cookie = login(&app).await;
    let session = site.store.get(cookie.value()).unwrap();
    assert!(session.authenticated);
}

#[actix_web::test]
async fn login_with_wrong_credentials_bounces_back_with_error_flag() {
    let site = TestSite::new();
    let app = test::init_service(build_app(site.config.clone(), site.store_dyn())).await;

    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([("username", "demo@1digitals.com"), ("password", "wrong")])
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/login?error=1");

    let cookie = session_cookie(&res);
    assert!(!site.store.get(cookie.value()).unwrap().authenticated);

    // The flagged retry renders the inline error message
    let req = test::TestRequest::get()
        .uri("/login?error=1")
        .cookie(cookie)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = test::read_body(res).await;
    assert!(String::from_utf8_lossy(&body).contains("Invalid credentials"));
}

#[actix_web::test]
async fn login_form_redirects_home_when_already_authenticated() {
    let site = TestSite::new();
    let app = test::init_service(build_app(site.config.clone(), site.store_dyn())).await;

    let cookie = login(&app).await;
    let req = test::TestRequest::get()
        .uri("/login")
        .cookie(cookie)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/");
}

#[actix_web::test]
async fn logout_destroys_the_session_and_is_idempotent() {
    let site = TestSite::new();
    let app = test::init_service(build_app(site.config.clone(), site.store_dyn())).await;

    let cookie = login(&app).await;

    let req = test::TestRequest::get()
        .uri("/logout")
        .cookie(cookie.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/login");
    assert!(site.store.get(cookie.value()).is_none());

    // A second logout with the stale cookie lands in the same place
    let req = test::TestRequest::get()
        .uri("/logout")
        .cookie(cookie)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/login");
}

#[actix_web::test]
async fn client_side_routes_get_the_entry_document() {
    let site = TestSite::new();
    let app = test::init_service(build_app(site.config.clone(), site.store_dyn())).await;

    let cookie = login(&app).await;

    for (path, marker) in [
        ("/aerosole/cart/checkout", "AeroSole entry"),
        ("/express/orders/42", "Express entry"),
        ("/at-t/plans", "AT&T entry"),
    ] {
        let req = test::TestRequest::get()
            .uri(path)
            .cookie(cookie.clone())
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK, "for {}", path);
        let content_type = res
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("text/html"), "for {}", path);

        let body = test::read_body(res).await;
        assert!(String::from_utf8_lossy(&body).contains(marker), "for {}", path);
    }
}

#[actix_web::test]
async fn existing_bundle_files_win_over_the_fallback() {
    let site = TestSite::new();
    let app = test::init_service(build_app(site.config.clone(), site.store_dyn())).await;

    let cookie = login(&app).await;
    let req = test::TestRequest::get()
        .uri("/aerosole/app.js")
        .cookie(cookie)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/javascript"
    );
    assert_eq!(
        res.headers().get(header::CACHE_CONTROL).unwrap(),
        "max-age=86400"
    );
    let body = test::read_body(res).await;
    assert_eq!(&body[..], b"console.log('aerosole');");
}

#[actix_web::test]
async fn asset_mounts_serve_with_a_day_of_client_caching() {
    let site = TestSite::new();
    let app = test::init_service(build_app(site.config.clone(), site.store_dyn())).await;

    let req = test::TestRequest::get()
        .uri("/aerosole/assets/chunk.css")
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(header::CACHE_CONTROL).unwrap(),
        "max-age=86400"
    );
    assert!(res.headers().contains_key(header::ETAG));
}

#[actix_web::test]
async fn non_get_requests_to_app_prefixes_are_rejected_not_redirected() {
    let site = TestSite::new();
    let app = test::init_service(build_app(site.config.clone(), site.store_dyn())).await;

    // Only GET and HEAD pass through the gate; the app resource itself
    // only routes GET, so an anonymous POST gets a 405, not a login bounce
    let req = test::TestRequest::post().uri("/aerosole").to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(res.headers().get(header::LOCATION).is_none());
}

#[actix_web::test]
async fn proxy_failure_surfaces_as_structured_502() {
    let site = TestSite::new();
    let app = test::init_service(build_app(site.config.clone(), site.store_dyn())).await;

    // No login: the agent prefix is exempt from the gate by default
    let req = test::TestRequest::post()
        .uri("/api/invoke_agent/run")
        .set_payload(r#"{"prompt":"hello"}"#)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "upstream_unreachable");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[actix_web::test]
async fn proxy_can_be_put_behind_the_gate() {
    let mut site = TestSite::new();
    site.config.upstream.require_auth = true;
    let app = test::init_service(build_app(site.config.clone(), site.store_dyn())).await;

    let req = test::TestRequest::get()
        .uri("/api/invoke_agent/run")
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/login");
}

#[actix_web::test]
async fn landing_page_requires_authentication() {
    let site = TestSite::new();
    let app = test::init_service(build_app(site.config.clone(), site.store_dyn())).await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/login");
}

#[actix_web::test]
async fn authenticated_round_trip_reaches_every_app() {
    let site = TestSite::new();
    let app = test::init_service(build_app(site.config.clone(), site.store_dyn())).await;

    let cookie = login(&app).await;

    // Landing page links all three applications
    let req = test::TestRequest::get()
        .uri("/")
        .cookie(cookie.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = test::read_body(res).await;
    let body = String::from_utf8_lossy(&body);
    for prefix in ["/aerosole", "/express", "/at-t"] {
        assert!(body.contains(&format!(r#"href="{}""#, prefix)), "missing {}", prefix);
    }

    // Each application root serves its entry document
    for prefix in ["/aerosole", "/express", "/at-t"] {
        let req = test::TestRequest::get()
            .uri(prefix)
            .cookie(cookie.clone())
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK, "for {}", prefix);
        let content_type = res
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("text/html"), "for {}", prefix);

        let body = test::read_body(res).await;
        assert!(String::from_utf8_lossy(&body).contains("entry"), "for {}", prefix);
    }
}

#[actix_web::test]
async fn unknown_paths_render_the_fallback_page_for_authenticated_users() {
    let site = TestSite::new();
    let app = test::init_service(build_app(site.config.clone(), site.store_dyn())).await;

    let cookie = login(&app).await;
    let req = test::TestRequest::get()
        .uri("/nowhere")
        .cookie(cookie)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = test::read_body(res).await;
    assert!(String::from_utf8_lossy(&body).contains("Available routes"));
}
