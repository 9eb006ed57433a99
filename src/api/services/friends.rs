//! 好友请求、接受、删除与推荐

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use tracing::info;

use crate::api::middleware::SessionUser;
use crate::errors::TalkError;
use crate::views;

use super::feed::page_param;
use super::helpers::{
    Services, error_response, form_error, frame, html_page, redirect_back, redirect_with_flash,
};

#[derive(Debug, Deserialize)]
pub struct RemoveFriendForm {
    pub z_id: String,
}

pub async fn friend_request(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    z_id: web::Path<String>,
) -> HttpResponse {
    let back = format!("/profile/{}", z_id);
    match services.friends.send_request(&user.z_id, &z_id).await {
        Ok(()) => {
            info!("Friend request {} -> {}", user.z_id, z_id);
            redirect_with_flash(&req, &back, format!("Friend request sent to {}.", z_id))
        }
        Err(e) => form_error(&req, e, &back),
    }
}

pub async fn remove_friend(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    form: web::Form<RemoveFriendForm>,
) -> HttpResponse {
    let back = format!("/profile/{}", form.z_id);
    match services.friends.remove(&user.z_id, &form.z_id).await {
        Ok(()) => redirect_back(&req, &back),
        Err(e) => form_error(&req, e, &back),
    }
}

pub async fn addfriend_page(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (reference, friend) = path.into_inner();
    if user.z_id != friend {
        return error_response(
            &req,
            &TalkError::forbidden("This friend request was sent to someone else"),
        );
    }

    match services.profiles.user(&reference).await {
        Ok(requester) => {
            let frame = frame(&req, Some(&*user));
            html_page(&frame, views::add_friend(&frame, &requester, &friend))
        }
        Err(e) => error_response(&req, &e),
    }
}

pub async fn addfriend(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (reference, friend) = path.into_inner();
    match services.friends.accept(&reference, &friend, &user.z_id).await {
        Ok(()) => {
            info!("Friendship accepted: {} <-> {}", reference, friend);
            redirect_with_flash(
                &req,
                &format!("/profile/{}", reference),
                format!("You and {} are now friends.", reference),
            )
        }
        Err(e @ TalkError::NotFound(_)) => redirect_with_flash(&req, "/home", e.message()),
        Err(e) => error_response(&req, &e),
    }
}

pub async fn recommendations(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
) -> HttpResponse {
    match services
        .friends
        .recommendations(&user.z_id, page_param(&req))
        .await
    {
        Ok(page) => {
            let frame = frame(&req, Some(&*user));
            html_page(&frame, views::recommendations(&frame, &page))
        }
        Err(e) => error_response(&req, &e),
    }
}
