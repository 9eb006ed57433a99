//! HTTP 层测试
//!
//! 会话守卫、CSRF 守卫、提示消息、登录限流与主要页面流程，
//! 通过 `actix_web::test` 驱动。

mod common;

use std::net::SocketAddr;

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::http::header::{
    CONTENT_SECURITY_POLICY, CONTENT_TYPE, LOCATION, X_CONTENT_TYPE_OPTIONS,
};
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};

use common::{PASSWORD, TestEnv};
use unswtalk::api::constants::{CSRF_COOKIE_NAME, FLASH_COOKIE_NAME, SESSION_COOKIE_NAME};
use unswtalk::api::services::{configure, decode_flashes, not_found};
use unswtalk::services::NewContent;

const CSRF: &str = "test-csrf-token";

macro_rules! init_app {
    ($env:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::from($env.services.clone()))
                .configure(configure)
                .default_service(web::to(not_found)),
        )
        .await
    };
}

fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

fn session_cookies(env: &TestEnv, z_id: &str) -> (Cookie<'static>, Cookie<'static>) {
    let token = env.services.accounts.session_token(z_id).unwrap();
    (
        Cookie::new(SESSION_COOKIE_NAME, token),
        Cookie::new(CSRF_COOKIE_NAME, CSRF),
    )
}

fn as_member(req: TestRequest, env: &TestEnv, z_id: &str) -> TestRequest {
    let (session, csrf) = session_cookies(env, z_id);
    req.cookie(session).cookie(csrf)
}

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn response_cookie<B>(resp: &actix_web::dev::ServiceResponse<B>, name: &str) -> Option<String> {
    resp.response()
        .cookies()
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

fn multipart(fields: &[(&str, &str)]) -> (String, Vec<u8>) {
    let boundary = "talkboundary7MA4YWxkTrZu0gW";
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            boundary, name, value
        ));
    }
    body.push_str(&format!("--{}--\r\n", boundary));
    (
        format!("multipart/form-data; boundary={}", boundary),
        body.into_bytes(),
    )
}

// =============================================================================
// 公开页面
// =============================================================================

#[actix_rt::test]
async fn test_landing_page_for_guests() {
    let env = TestEnv::new().await;
    let app = init_app!(env);

    let resp = test::call_service(&app, TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("/login"));
    assert!(body.contains("/signup"));
}

#[actix_rt::test]
async fn test_landing_page_redirects_members_home() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;
    let app = init_app!(env);

    let req = as_member(TestRequest::get().uri("/"), &env, "z5000001").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/home");
}

#[actix_rt::test]
async fn test_static_assets_and_health() {
    let env = TestEnv::new().await;
    let app = init_app!(env);

    let resp =
        test::call_service(&app, TestRequest::get().uri("/static/style.css").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(CONTENT_TYPE).unwrap(),
        "text/css; charset=utf-8"
    );

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/images/defaultprofile.svg").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let health: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["database"]["reachable"], true);
    assert_eq!(health["database"]["backend"], "sqlite");
}

#[actix_rt::test]
async fn test_uploaded_svg_is_served_sandboxed() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;
    let post = env
        .services
        .content
        .create_post(
            "z5000001",
            NewContent::Media {
                file_name: "drawing.svg".to_string(),
                bytes: b"<svg xmlns=\"http://www.w3.org/2000/svg\"><script>alert(1)</script></svg>"
                    .to_vec(),
            },
        )
        .await
        .unwrap();
    let stored = post.content_path.clone().unwrap();
    let app = init_app!(env);

    let req = as_member(
        TestRequest::get().uri(&format!("/images/{}", stored)),
        &env,
        "z5000001",
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(CONTENT_TYPE).unwrap(), "image/svg+xml");
    let csp = resp
        .headers()
        .get(CONTENT_SECURITY_POLICY)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(csp.contains("default-src 'none'"));
    assert!(csp.contains("sandbox"));
    assert_eq!(resp.headers().get(X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
}

// =============================================================================
// 会话守卫与提示消息
// =============================================================================

#[actix_rt::test]
async fn test_member_pages_redirect_guests_to_login() {
    let env = TestEnv::new().await;
    let app = init_app!(env);

    for uri in ["/home", "/search?q=x", "/profile/z5000001", "/recommendations/2"] {
        let resp = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&resp), "/login", "{}", uri);

        let flash = response_cookie(&resp, FLASH_COOKIE_NAME).expect("flash cookie");
        assert_eq!(
            decode_flashes(&flash),
            vec!["You must be logged in to access that page".to_string()]
        );
    }
}

#[actix_rt::test]
async fn test_flash_is_shown_once() {
    let env = TestEnv::new().await;
    let app = init_app!(env);

    let resp = test::call_service(&app, TestRequest::get().uri("/home").to_request()).await;
    let flash = response_cookie(&resp, FLASH_COOKIE_NAME).unwrap();

    let req = TestRequest::get()
        .uri("/login")
        .cookie(Cookie::new(FLASH_COOKIE_NAME, flash))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    // 显示过的消息会清除 cookie
    assert_eq!(response_cookie(&resp, FLASH_COOKIE_NAME).as_deref(), Some(""));
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("You must be logged in to access that page"));
}

#[actix_rt::test]
async fn test_forged_session_is_rejected() {
    let env = TestEnv::new().await;
    let app = init_app!(env);

    let req = TestRequest::get()
        .uri("/home")
        .cookie(Cookie::new(SESSION_COOKIE_NAME, "forged.token.value"))
        .cookie(Cookie::new(CSRF_COOKIE_NAME, CSRF))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
}

#[actix_rt::test]
async fn test_unknown_page_is_404_for_members() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;
    let app = init_app!(env);

    let req = as_member(TestRequest::get().uri("/no/such/page"), &env, "z5000001").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// 登录、登出与限流
// =============================================================================

#[actix_rt::test]
async fn test_login_sets_session_and_csrf_cookies() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;
    let app = init_app!(env);

    let req = TestRequest::post()
        .uri("/login")
        .peer_addr(peer())
        .set_form([("z_id", "z5000001"), ("password", PASSWORD)])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/home");

    let session = response_cookie(&resp, SESSION_COOKIE_NAME).expect("session cookie");
    let csrf = response_cookie(&resp, CSRF_COOKIE_NAME).expect("csrf cookie");
    assert!(!csrf.is_empty());

    let req = TestRequest::get()
        .uri("/home")
        .cookie(Cookie::new(SESSION_COOKIE_NAME, session))
        .cookie(Cookie::new(CSRF_COOKIE_NAME, csrf))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("z5000001"));
}

#[actix_rt::test]
async fn test_bad_login_flashes_back_to_login() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;
    let app = init_app!(env);

    let req = TestRequest::post()
        .uri("/login")
        .peer_addr(peer())
        .set_form([("z_id", "z5000001"), ("password", "wrong-password")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
    assert!(response_cookie(&resp, SESSION_COOKIE_NAME).is_none());

    let flash = response_cookie(&resp, FLASH_COOKIE_NAME).unwrap();
    assert_eq!(
        decode_flashes(&flash),
        vec!["Unknown username or password".to_string()]
    );
}

#[actix_rt::test]
async fn test_login_is_rate_limited() {
    let env = TestEnv::new().await;
    let app = init_app!(env);

    let mut statuses = Vec::new();
    for _ in 0..7 {
        let req = TestRequest::post()
            .uri("/login")
            .peer_addr(peer())
            .set_form([("z_id", "z5000001"), ("password", "guess")])
            .to_request();
        statuses.push(test::call_service(&app, req).await.status());
    }

    assert!(statuses[..5].iter().all(|s| *s == StatusCode::SEE_OTHER));
    assert_eq!(statuses[6], StatusCode::TOO_MANY_REQUESTS);
}

#[actix_rt::test]
async fn test_logout_expires_cookies() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;
    let app = init_app!(env);

    let req = as_member(TestRequest::post().uri("/logout"), &env, "z5000001").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    assert_eq!(response_cookie(&resp, SESSION_COOKIE_NAME).as_deref(), Some(""));
    assert_eq!(response_cookie(&resp, CSRF_COOKIE_NAME).as_deref(), Some(""));
}

// =============================================================================
// CSRF 守卫与会员操作
// =============================================================================

#[actix_rt::test]
async fn test_member_post_requires_csrf_token() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;
    let app = init_app!(env);

    let form = [("code", "COMP2041"), ("year", "2017"), ("semester", "S2")];

    let missing = as_member(TestRequest::post().uri("/add_course"), &env, "z5000001")
        .set_form(form)
        .to_request();
    assert_eq!(
        test::call_service(&app, missing).await.status(),
        StatusCode::FORBIDDEN
    );

    let wrong = as_member(
        TestRequest::post().uri("/add_course?csrf_token=something-else"),
        &env,
        "z5000001",
    )
    .set_form(form)
    .to_request();
    assert_eq!(
        test::call_service(&app, wrong).await.status(),
        StatusCode::FORBIDDEN
    );

    let header = as_member(TestRequest::post().uri("/add_course"), &env, "z5000001")
        .insert_header(("X-CSRF-Token", CSRF))
        .set_form(form)
        .to_request();
    let resp = test::call_service(&app, header).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let courses = env.services.profiles.courses("z5000001").await.unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].code, "COMP2041");
}

#[actix_rt::test]
async fn test_new_post_via_multipart() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;
    let app = init_app!(env);

    let (content_type, body) = multipart(&[("message", "Hello <b>world</b>")]);
    let req = as_member(
        TestRequest::post().uri(&format!("/newpost?csrf_token={}", CSRF)),
        &env,
        "z5000001",
    )
    .insert_header((CONTENT_TYPE, content_type))
    .set_payload(body)
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/home");

    let req = as_member(TestRequest::get().uri("/home"), &env, "z5000001").to_request();
    let body = String::from_utf8(
        test::read_body(test::call_service(&app, req).await)
            .await
            .to_vec(),
    )
    .unwrap();
    assert!(body.contains("Hello &lt;b&gt;world&lt;/b&gt;"));
    assert!(!body.contains("<b>world</b>"));
}

#[actix_rt::test]
async fn test_empty_post_flashes_error() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;
    let app = init_app!(env);

    let (content_type, body) = multipart(&[("message", "  ")]);
    let req = as_member(
        TestRequest::post().uri(&format!("/newpost?csrf_token={}", CSRF)),
        &env,
        "z5000001",
    )
    .insert_header((CONTENT_TYPE, content_type))
    .set_payload(body)
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let flash = response_cookie(&resp, FLASH_COOKIE_NAME).unwrap();
    assert_eq!(decode_flashes(&flash), vec!["Message cannot be empty".to_string()]);
}

#[actix_rt::test]
async fn test_oversized_multipart_total_is_rejected() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;
    let app = init_app!(env);

    // 每个分段都低于单段上限，合计远超请求体上限
    let filler = "x".repeat(60 * 1024);
    let names: Vec<String> = (0..12).map(|i| format!("junk{}", i)).collect();
    let mut fields: Vec<(&str, &str)> = names
        .iter()
        .map(|name| (name.as_str(), filler.as_str()))
        .collect();
    fields.push(("message", "hi"));
    let (content_type, body) = multipart(&fields);

    let req = as_member(
        TestRequest::post().uri(&format!("/newpost?csrf_token={}", CSRF)),
        &env,
        "z5000001",
    )
    .insert_header((CONTENT_TYPE, content_type))
    .set_payload(body)
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/home");
    let flash = response_cookie(&resp, FLASH_COOKIE_NAME).unwrap();
    assert_eq!(
        decode_flashes(&flash),
        vec!["Uploads are limited to 64 KB".to_string()]
    );

    let posts = env.storage.posts_by_user("z5000001").await.unwrap();
    assert!(posts.is_empty());
}

#[actix_rt::test]
async fn test_too_many_form_parts_is_rejected() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;
    let app = init_app!(env);

    let names: Vec<String> = (0..20).map(|i| format!("f{}", i)).collect();
    let mut fields: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "1")).collect();
    fields.push(("message", "hi"));
    let (content_type, body) = multipart(&fields);

    let req = as_member(
        TestRequest::post().uri(&format!("/newpost?csrf_token={}", CSRF)),
        &env,
        "z5000001",
    )
    .insert_header((CONTENT_TYPE, content_type))
    .set_payload(body)
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let flash = response_cookie(&resp, FLASH_COOKIE_NAME).unwrap();
    assert_eq!(decode_flashes(&flash), vec!["Too many form fields".to_string()]);
    assert!(
        env.storage
            .posts_by_user("z5000001")
            .await
            .unwrap()
            .is_empty()
    );
}

#[actix_rt::test]
async fn test_delete_post_via_form() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;
    env.member("z5000002", "Jeff Bezos").await;
    let post = env
        .services
        .content
        .create_post("z5000001", NewContent::Text("to be removed".to_string()))
        .await
        .unwrap();
    let app = init_app!(env);

    let uri = format!("/delete_post?csrf_token={}", CSRF);
    let stranger = as_member(TestRequest::post().uri(&uri), &env, "z5000002")
        .set_form([("post_id", post.id.as_str())])
        .to_request();
    assert_eq!(
        test::call_service(&app, stranger).await.status(),
        StatusCode::FORBIDDEN
    );

    let owner = as_member(TestRequest::post().uri(&uri), &env, "z5000001")
        .set_form([("post_id", post.id.as_str())])
        .to_request();
    let resp = test::call_service(&app, owner).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/home");

    let req = as_member(
        TestRequest::get().uri(&format!("/post/{}", post.id)),
        &env,
        "z5000001",
    )
    .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_rt::test]
async fn test_friend_accept_page_is_for_the_recipient_only() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;
    env.member("z5000002", "Jeff Bezos").await;
    env.member("z5000003", "Ada Lovelace").await;
    env.services
        .friends
        .send_request("z5000001", "z5000002")
        .await
        .unwrap();
    let app = init_app!(env);

    let req = as_member(
        TestRequest::get().uri("/addfriend/z5000001/z5000002"),
        &env,
        "z5000003",
    )
    .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = as_member(
        TestRequest::get().uri("/addfriend/z5000001/z5000002"),
        &env,
        "z5000002",
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("Andrew Taylor"));

    let req = as_member(
        TestRequest::post().uri(&format!("/addfriend/z5000001/z5000002?csrf_token={}", CSRF)),
        &env,
        "z5000002",
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/profile/z5000001");

    let friends = env.services.friends.friends("z5000002").await.unwrap();
    assert_eq!(friends.len(), 1);
}

#[actix_rt::test]
async fn test_edit_profile_page_is_owner_only() {
    let env = TestEnv::new().await;
    env.member("z5000001", "Andrew Taylor").await;
    env.member("z5000002", "Jeff Bezos").await;
    let app = init_app!(env);

    let req = as_member(
        TestRequest::get().uri("/edit_profile/z5000001"),
        &env,
        "z5000002",
    )
    .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = as_member(
        TestRequest::get().uri("/edit_profile/z5000001"),
        &env,
        "z5000001",
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains(&format!("csrf_token={}", CSRF)));
}
