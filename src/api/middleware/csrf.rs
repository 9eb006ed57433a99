//! 会员区的 CSRF 防护
//!
//! 双重提交：非安全方法的请求中 `unswtalk_csrf` cookie 必须与
//! `csrf_token` 查询参数（HTML 表单放在 `action` 中）
//! 或 `X-CSRF-Token` 请求头之一一致。

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, header::CONTENT_TYPE},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use subtle::ConstantTimeEq;
use tracing::{trace, warn};

use crate::api::constants;
use crate::views;

#[derive(Clone, Default)]
pub struct CsrfGuard;

impl<S, B> Transform<S, ServiceRequest> for CsrfGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = CsrfMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct CsrfMiddleware<S> {
    service: Rc<S>,
}

impl<S> CsrfMiddleware<S> {
    fn handle_csrf_error<B>(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        warn!("CSRF validation failed for {} {}", req.method(), req.path());
        let page = views::error_page(
            "Forbidden",
            "Your session token was missing or did not match. Reload the page and try again.",
        );
        req.into_response(
            HttpResponse::Forbidden()
                .insert_header((CONTENT_TYPE, "text/html; charset=utf-8"))
                .body(page)
                .map_into_right_body(),
        )
    }

    fn is_safe_method(method: &Method) -> bool {
        matches!(method, &Method::GET | &Method::HEAD | &Method::OPTIONS)
    }

    fn constant_time_compare(a: &str, b: &str) -> bool {
        a.as_bytes().ct_eq(b.as_bytes()).into()
    }

    fn submitted_token(req: &ServiceRequest) -> Option<String> {
        let from_query = url::form_urlencoded::parse(req.query_string().as_bytes())
            .find(|(key, _)| key == constants::CSRF_QUERY_PARAM)
            .map(|(_, value)| value.into_owned());

        from_query.or_else(|| {
            req.headers()
                .get(constants::CSRF_HEADER_NAME)
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string())
        })
    }

    fn validate_csrf_token(req: &ServiceRequest) -> bool {
        let cookie_token = req
            .cookie(constants::CSRF_COOKIE_NAME)
            .map(|c| c.value().to_string());

        match (cookie_token, Self::submitted_token(req)) {
            (Some(cookie), Some(submitted)) if !cookie.is_empty() => {
                Self::constant_time_compare(&cookie, &submitted)
            }
            _ => false,
        }
    }
}

impl<S, B> Service<ServiceRequest> for CsrfMiddleware<S>
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
            if Self::is_safe_method(req.method()) {
                trace!("CSRF skipped: safe method {}", req.method());
                let response = srv.call(req).await?.map_into_left_body();
                return Ok(response);
            }

            if !Self::validate_csrf_token(&req) {
                return Ok(Self::handle_csrf_error(req));
            }

            trace!("CSRF validation passed");
            let response = srv.call(req).await?.map_into_left_body();
            Ok(response)
        })
    }
}
