//! 首页、注册、邮箱验证、登录、登出与密码重置

use actix_web::http::header::LOCATION;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::TalkError;
use crate::services::SignupForm;
use crate::utils::generate_secure_token;
use crate::views;

use super::helpers::{
    CookieBuilder, Services, encode_flashes, error_response, form_error, frame, html_page,
    optional_session, redirect_with_flash, see_other,
};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub z_id: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupFields {
    pub z_id: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotForm {
    pub z_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetForm {
    pub password: String,
}

/// 下发会话与 CSRF cookie 并重定向到 `location`
fn start_session(
    req: &HttpRequest,
    services: &Services,
    z_id: &str,
    location: &str,
    flash: Option<&str>,
) -> HttpResponse {
    let token = match services.accounts.session_token(z_id) {
        Ok(token) => token,
        Err(e) => return error_response(req, &e),
    };

    let cookies = CookieBuilder::from_config();
    let mut builder = HttpResponse::SeeOther();
    builder
        .insert_header((LOCATION, location))
        .cookie(cookies.build_session_cookie(token))
        .cookie(cookies.build_csrf_cookie(generate_secure_token()));
    match flash {
        Some(message) => {
            builder.cookie(cookies.build_flash_cookie(encode_flashes(&[message.to_string()])));
        }
        None => {
            builder.cookie(cookies.build_expired_flash_cookie());
        }
    }
    builder.finish()
}

pub async fn index(req: HttpRequest, services: Services) -> HttpResponse {
    if optional_session(&req, &services).is_some() {
        return see_other("/home");
    }
    let frame = frame(&req, None);
    html_page(&frame, views::start(&frame))
}

pub async fn login_page(req: HttpRequest, services: Services) -> HttpResponse {
    if optional_session(&req, &services).is_some() {
        return see_other("/home");
    }
    let frame = frame(&req, None);
    html_page(&frame, views::login(&frame))
}

pub async fn login(req: HttpRequest, services: Services, form: web::Form<LoginForm>) -> HttpResponse {
    match services.accounts.login(&form.z_id, &form.password).await {
        Ok(user) => start_session(&req, &services, &user.z_id, "/home", None),
        Err(e @ (TalkError::Unauthorized(_) | TalkError::Forbidden(_))) => {
            warn!("Failed login for {}: {}", form.z_id.trim(), e.message());
            redirect_with_flash(&req, "/login", e.message())
        }
        Err(e) => error_response(&req, &e),
    }
}

pub async fn signup_page(req: HttpRequest, services: Services) -> HttpResponse {
    if optional_session(&req, &services).is_some() {
        return see_other("/home");
    }
    let frame = frame(&req, None);
    html_page(&frame, views::signup(&frame))
}

pub async fn signup(
    req: HttpRequest,
    services: Services,
    form: web::Form<SignupFields>,
) -> HttpResponse {
    let form = form.into_inner();
    let signup = SignupForm {
        z_id: form.z_id,
        name: form.name,
        email: form.email,
        password: form.password,
    };

    match services.accounts.signup(signup).await {
        Ok(()) => redirect_with_flash(
            &req,
            "/login",
            "Your account has been created. Check your e-mail for a link to verify it.",
        ),
        Err(e) => form_error(&req, e, "/signup"),
    }
}

pub async fn verify(req: HttpRequest, services: Services, token: web::Path<String>) -> HttpResponse {
    match services.accounts.verify(&token).await {
        Ok(z_id) => redirect_with_flash(
            &req,
            "/login",
            format!("Thanks {}, your account is verified. You can log in now.", z_id),
        ),
        Err(e @ (TalkError::Token(_) | TalkError::NotFound(_))) => {
            redirect_with_flash(&req, "/login", e.message())
        }
        Err(e) => error_response(&req, &e),
    }
}

pub async fn forgot_page(req: HttpRequest) -> HttpResponse {
    let frame = frame(&req, None);
    html_page(&frame, views::forgot(&frame))
}

pub async fn forgot(req: HttpRequest, services: Services, form: web::Form<ForgotForm>) -> HttpResponse {
    match services.accounts.request_reset(&form.z_id).await {
        Ok(()) => redirect_with_flash(
            &req,
            "/login",
            "A password reset link has been sent to your e-mail.",
        ),
        Err(e @ TalkError::NotFound(_)) => redirect_with_flash(&req, "/forgot", e.message()),
        Err(e) => form_error(&req, e, "/forgot"),
    }
}

pub async fn reset_page(req: HttpRequest, services: Services, token: web::Path<String>) -> HttpResponse {
    match services.accounts.reset_target(&token).await {
        Ok(z_id) => {
            let frame = frame(&req, None);
            html_page(&frame, views::reset(&frame, &token, &z_id))
        }
        Err(e) => redirect_with_flash(&req, "/forgot", e.message()),
    }
}

pub async fn reset(
    req: HttpRequest,
    services: Services,
    token: web::Path<String>,
    form: web::Form<ResetForm>,
) -> HttpResponse {
    match services.accounts.reset(&token, &form.password).await {
        Ok(user) => {
            info!("Password reset completed for {}", user.z_id);
            start_session(
                &req,
                &services,
                &user.z_id,
                "/home",
                Some("Your password has been changed."),
            )
        }
        Err(e @ TalkError::Validation(_)) => redirect_with_flash(
            &req,
            &format!("/reset/{}", urlencoding::encode(&token)),
            e.message(),
        ),
        Err(e @ TalkError::Token(_)) => redirect_with_flash(&req, "/forgot", e.message()),
        Err(e) => error_response(&req, &e),
    }
}

pub async fn logout(req: HttpRequest, services: Services) -> HttpResponse {
    if let Some(user) = optional_session(&req, &services) {
        info!("User logged out: {}", user.z_id);
    }

    let cookies = CookieBuilder::from_config();
    HttpResponse::SeeOther()
        .insert_header((LOCATION, "/"))
        .cookie(cookies.build_expired_session_cookie())
        .cookie(cookies.build_expired_csrf_cookie())
        .cookie(cookies.build_flash_cookie(encode_flashes(&[
            "You have been logged out.".to_string()
        ])))
        .finish()
}
