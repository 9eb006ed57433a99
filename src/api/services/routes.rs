//! 路由表与登录限流

use actix_governor::{Governor, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError};
use actix_web::dev::ServiceRequest;
use actix_web::{HttpRequest, HttpResponse, web};
use governor::middleware::NoOpMiddleware;
use tracing::debug;

use crate::api::middleware::{CsrfGuard, SessionGuard};
use crate::errors::TalkError;

use super::helpers::error_response;
use super::{accounts, assets, content, feed, friends, health, profile};

/// 限流键：TCP 对端地址，客户端无法伪造
#[derive(Clone, Copy)]
pub struct LoginKeyExtractor;

impl KeyExtractor for LoginKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        req.connection_info()
            .peer_addr()
            .map(str::to_string)
            .ok_or_else(|| SimpleKeyExtractionError::new("Unable to extract peer IP"))
    }
}

/// 每个对端每秒 1 次、突发 5 次，超出返回 429
pub fn login_rate_limiter() -> Governor<LoginKeyExtractor, NoOpMiddleware> {
    let config = GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(5)
        .key_extractor(LoginKeyExtractor)
        .finish()
        .expect("Invalid rate limit config");

    debug!("Login rate limiter created: 1 req/s, burst 5");
    Governor::new(&config)
}

/// 无需登录即可访问的页面与接口
pub fn public_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(accounts::index))
        .service(
            web::resource("/login")
                .route(web::get().to(accounts::login_page))
                .route(
                    web::post()
                        .to(accounts::login)
                        .wrap(login_rate_limiter()),
                ),
        )
        .service(
            web::resource("/signup")
                .route(web::get().to(accounts::signup_page))
                .route(web::post().to(accounts::signup)),
        )
        .route("/verify/{token}", web::get().to(accounts::verify))
        .service(
            web::resource("/forgot")
                .route(web::get().to(accounts::forgot_page))
                .route(web::post().to(accounts::forgot)),
        )
        .service(
            web::resource("/reset/{token}")
                .route(web::get().to(accounts::reset_page))
                .route(web::post().to(accounts::reset)),
        )
        .service(
            web::resource("/logout")
                .route(web::get().to(accounts::logout))
                .route(web::post().to(accounts::logout)),
        )
        .route("/static/{path:.*}", web::get().to(assets::static_file))
        .route("/images/{path:.*}", web::get().to(assets::image))
        .service(
            web::resource("/health")
                .route(web::get().to(health::health_check))
                .route(web::head().to(health::health_check)),
        )
        .route("/health/live", web::get().to(health::liveness_check));
}

/// 会话守卫保护的页面；需在 `public_routes` 之后注册
pub fn member_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            .wrap(CsrfGuard)
            .wrap(SessionGuard)
            .route("/home", web::get().to(feed::home))
            .route("/home/{page}", web::get().to(feed::home))
            .route("/search", web::get().to(feed::search))
            .route("/search/{page}", web::get().to(feed::search))
            .route("/profile/{zid}", web::get().to(profile::view_profile))
            .route("/post/{id}", web::get().to(content::view_post))
            .route("/newpost", web::post().to(content::new_post))
            .route("/newcomment", web::post().to(content::new_comment))
            .route("/newreply", web::post().to(content::new_reply))
            .route("/delete_post", web::post().to(content::delete_post))
            .route("/delete_comment", web::post().to(content::delete_comment))
            .route("/delete_reply", web::post().to(content::delete_reply))
            .route("/friend_request/{zid}", web::post().to(friends::friend_request))
            .route("/removefriend", web::post().to(friends::remove_friend))
            .service(
                web::resource("/addfriend/{reference}/{friend}")
                    .route(web::get().to(friends::addfriend_page))
                    .route(web::post().to(friends::addfriend)),
            )
            .service(
                web::resource("/edit_profile/{zid}")
                    .route(web::get().to(profile::edit_page))
                    .route(web::post().to(profile::edit)),
            )
            .route(
                "/delete_user_image/{zid}/{image}",
                web::post().to(profile::delete_user_image),
            )
            .route("/add_course", web::post().to(profile::add_course))
            .route("/remove_course/{code}", web::post().to(profile::remove_course))
            .route("/recommendations", web::get().to(friends::recommendations))
            .route(
                "/recommendations/{page}",
                web::get().to(friends::recommendations),
            ),
    );
}

/// 按注册顺序配置两组路由
pub fn configure(cfg: &mut web::ServiceConfig) {
    public_routes(cfg);
    member_routes(cfg);
}

/// 未匹配路径的全局兜底
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    error_response(&req, &TalkError::not_found("Page not found"))
}
