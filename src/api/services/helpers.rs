//! 处理函数共用的工具：cookie、提示消息、重定向与错误页

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::http::header::{CONTENT_TYPE, LOCATION, REFERER};
use actix_web::{HttpMessage, HttpRequest, HttpResponse, web};
use base64::Engine;
use tracing::{error, warn};

use crate::api::constants;
use crate::api::middleware::SessionUser;
use crate::config::SameSitePolicy;
use crate::errors::TalkError;
use crate::services::AppServices;
use crate::views::{self, PageFrame};

/// 按配置的策略构造会话、CSRF 与提示消息 cookie
pub struct CookieBuilder {
    same_site: SameSite,
    secure: bool,
    session_hours: u64,
}

impl CookieBuilder {
    pub fn from_config() -> Self {
        let config = crate::config::get_config();

        let same_site = match config.session.cookie_same_site {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::None => SameSite::None,
            SameSitePolicy::Lax => SameSite::Lax,
        };

        Self {
            same_site,
            secure: config.session.cookie_secure,
            session_hours: config.session.session_hours,
        }
    }

    fn build_cookie_base(
        &self,
        name: &'static str,
        value: String,
        http_only: bool,
        max_age: CookieDuration,
    ) -> Cookie<'static> {
        let mut cookie = Cookie::new(name, value);
        cookie.set_path("/");
        cookie.set_http_only(http_only);
        cookie.set_secure(self.secure);
        cookie.set_same_site(self.same_site);
        cookie.set_max_age(max_age);
        cookie
    }

    fn session_age(&self) -> CookieDuration {
        CookieDuration::hours(self.session_hours as i64)
    }

    pub fn build_session_cookie(&self, token: String) -> Cookie<'static> {
        self.build_cookie_base(constants::SESSION_COOKIE_NAME, token, true, self.session_age())
    }

    /// 不设 HttpOnly：页面脚本需要读取它来填写 `X-CSRF-Token`
    pub fn build_csrf_cookie(&self, token: String) -> Cookie<'static> {
        self.build_cookie_base(constants::CSRF_COOKIE_NAME, token, false, self.session_age())
    }

    pub fn build_flash_cookie(&self, encoded: String) -> Cookie<'static> {
        self.build_cookie_base(
            constants::FLASH_COOKIE_NAME,
            encoded,
            true,
            CookieDuration::minutes(5),
        )
    }

    pub fn build_expired_session_cookie(&self) -> Cookie<'static> {
        self.build_cookie_base(
            constants::SESSION_COOKIE_NAME,
            String::new(),
            true,
            CookieDuration::ZERO,
        )
    }

    pub fn build_expired_csrf_cookie(&self) -> Cookie<'static> {
        self.build_cookie_base(
            constants::CSRF_COOKIE_NAME,
            String::new(),
            false,
            CookieDuration::ZERO,
        )
    }

    pub fn build_expired_flash_cookie(&self) -> Cookie<'static> {
        self.build_cookie_base(
            constants::FLASH_COOKIE_NAME,
            String::new(),
            true,
            CookieDuration::ZERO,
        )
    }
}

// ============================================================
// 提示消息
// ============================================================

pub fn encode_flashes(messages: &[String]) -> String {
    let json = serde_json::to_vec(messages).unwrap_or_default();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json)
}

/// 解码提示消息 cookie；格式不对时视为没有消息
pub fn decode_flashes(value: &str) -> Vec<String> {
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

pub fn pending_flashes(req: &HttpRequest) -> Vec<String> {
    req.cookie(constants::FLASH_COOKIE_NAME)
        .map(|c| decode_flashes(c.value()))
        .unwrap_or_default()
}

// ============================================================
// 会员区之外的会话
// ============================================================

/// 公开路由上请求的会话（守卫不在这些路由上运行）
pub fn optional_session(req: &HttpRequest, services: &AppServices) -> Option<SessionUser> {
    if let Some(user) = req.extensions().get::<SessionUser>() {
        return Some(user.clone());
    }

    let token = req.cookie(constants::SESSION_COOKIE_NAME)?;
    let csrf = req.cookie(constants::CSRF_COOKIE_NAME)?;
    let z_id = services.accounts.session_user(token.value())?;
    Some(SessionUser {
        z_id,
        csrf: csrf.value().to_string(),
    })
}

/// 渲染页面所需的当前用户、CSRF 令牌与待显示的提示消息
pub fn frame(req: &HttpRequest, session: Option<&SessionUser>) -> PageFrame {
    PageFrame {
        viewer: session.map(|s| s.z_id.clone()),
        csrf: session.map(|s| s.csrf.clone()).unwrap_or_default(),
        flashes: pending_flashes(req),
    }
}

// ============================================================
// 响应
// ============================================================

/// 200 HTML 页面；待显示的提示消息已渲染，清除其 cookie
pub fn html_page(frame: &PageFrame, body: String) -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    builder.insert_header((CONTENT_TYPE, "text/html; charset=utf-8"));
    if !frame.flashes.is_empty() {
        builder.cookie(CookieBuilder::from_config().build_expired_flash_cookie());
    }
    builder.body(body)
}

pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}

/// 重定向，并把 `message` 追加到尚未显示的提示消息之后
pub fn redirect_with_flash(req: &HttpRequest, location: &str, message: impl Into<String>) -> HttpResponse {
    let mut messages = pending_flashes(req);
    messages.push(message.into());

    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .cookie(CookieBuilder::from_config().build_flash_cookie(encode_flashes(&messages)))
        .finish()
}

/// `Referer` 指向本站时返回它，否则返回 `fallback`
pub fn back_location(req: &HttpRequest, fallback: &str) -> String {
    let host = req.connection_info().host().to_string();

    req.headers()
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| url::Url::parse(value).ok())
        .filter(|referer| {
            let authority = match (referer.host_str(), referer.port()) {
                (Some(h), Some(p)) => format!("{}:{}", h, p),
                (Some(h), None) => h.to_string(),
                _ => return false,
            };
            authority.eq_ignore_ascii_case(&host)
        })
        .map(|referer| match referer.query() {
            Some(q) => format!("{}?{}", referer.path(), q),
            None => referer.path().to_string(),
        })
        .unwrap_or_else(|| fallback.to_string())
}

pub fn redirect_back(req: &HttpRequest, fallback: &str) -> HttpResponse {
    see_other(&back_location(req, fallback))
}

/// 按错误对应的状态码返回错误页
pub fn error_response(req: &HttpRequest, err: &TalkError) -> HttpResponse {
    if err.is_user_facing() {
        warn!("{}", err.format_simple());
    } else {
        error!("{}", err.format_colored());
    }

    let session = req.extensions().get::<SessionUser>().cloned();
    let frame = frame(req, session.as_ref());
    let body = views::error(&frame, err);

    let mut builder = HttpResponse::build(err.http_status());
    builder.insert_header((CONTENT_TYPE, "text/html; charset=utf-8"));
    if !frame.flashes.is_empty() {
        builder.cookie(CookieBuilder::from_config().build_expired_flash_cookie());
    }
    builder.body(body)
}

/// 表单提交失败的处理：用户可修正的错误给出提示并重定向，
/// 其余错误返回错误页
pub fn form_error(req: &HttpRequest, err: TalkError, back: &str) -> HttpResponse {
    match err {
        TalkError::Validation(_)
        | TalkError::Conflict(_)
        | TalkError::Unauthorized(_)
        | TalkError::PayloadTooLarge(_) => {
            warn!("Form rejected: {}", err.format_simple());
            redirect_with_flash(req, back, err.message())
        }
        _ => error_response(req, &err),
    }
}

pub type Services = web::Data<AppServices>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_flash_encoding() {
        let messages = vec!["Saved".to_string(), "<b>and</b> more".to_string()];
        let encoded = encode_flashes(&messages);
        assert!(!encoded.contains('='));
        assert_eq!(decode_flashes(&encoded), messages);
        assert!(decode_flashes("not base64 !!").is_empty());
    }

    #[test]
    fn test_back_location_same_host_only() {
        let req = TestRequest::default()
            .insert_header(("host", "talk.example:8080"))
            .insert_header((REFERER, "http://talk.example:8080/search/2?q=z5000001"))
            .to_http_request();
        assert_eq!(back_location(&req, "/home"), "/search/2?q=z5000001");

        let req = TestRequest::default()
            .insert_header(("host", "talk.example:8080"))
            .insert_header((REFERER, "http://evil.example/phish"))
            .to_http_request();
        assert_eq!(back_location(&req, "/home"), "/home");

        let req = TestRequest::default().to_http_request();
        assert_eq!(back_location(&req, "/"), "/");
    }
}
