//! 会员区的会话守卫
//!
//! 请求需携带有效的会话 JWT cookie 和 CSRF cookie，
//! 通过后守卫把 [`SessionUser`] 写入请求扩展；
//! 否则带提示消息重定向到 `/login`。

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::LOCATION,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, trace};

use crate::api::constants;
use crate::api::services::helpers::{CookieBuilder, encode_flashes};
use crate::services::AppServices;

pub const LOGIN_REQUIRED_MESSAGE: &str = "You must be logged in to access that page";

/// 当前登录用户，会员区处理函数通过 `web::ReqData<SessionUser>` 获取
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub z_id: String,
    /// 页面中每个表单都会带上的 CSRF 令牌
    pub csrf: String,
}

#[derive(Clone, Default)]
pub struct SessionGuard;

impl<S, B> Transform<S, ServiceRequest> for SessionGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct SessionMiddleware<S> {
    service: Rc<S>,
}

impl<S> SessionMiddleware<S> {
    fn session_of(req: &ServiceRequest) -> Option<SessionUser> {
        let services = req.app_data::<web::Data<AppServices>>()?;
        let token = req.cookie(constants::SESSION_COOKIE_NAME)?;
        let csrf = req.cookie(constants::CSRF_COOKIE_NAME)?;
        if csrf.value().is_empty() {
            return None;
        }

        let z_id = services.accounts.session_user(token.value())?;
        Some(SessionUser {
            z_id,
            csrf: csrf.value().to_string(),
        })
    }

    fn redirect_to_login<B>(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        debug!("No session for {}, redirecting to /login", req.path());
        let cookies = CookieBuilder::from_config();
        let flash = encode_flashes(&[LOGIN_REQUIRED_MESSAGE.to_string()]);

        req.into_response(
            HttpResponse::SeeOther()
                .insert_header((LOCATION, "/login"))
                .cookie(cookies.build_flash_cookie(flash))
                .cookie(cookies.build_expired_session_cookie())
                .finish()
                .map_into_right_body(),
        )
    }
}

impl<S, B> Service<ServiceRequest> for SessionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            let Some(user) = Self::session_of(&req) else {
                return Ok(Self::redirect_to_login(req));
            };

            trace!("Session accepted for {}", user.z_id);
            req.extensions_mut().insert(user);
            let response = srv.call(req).await?.map_into_left_body();
            Ok(response)
        })
    }
}
