//! 帖子详情、发帖/评论/回复与删除

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use tracing::info;

use crate::api::middleware::SessionUser;
use crate::services::NewContent;
use crate::views;

use super::forms::MultipartForm;
use super::helpers::{
    Services, error_response, form_error, frame, html_page, redirect_back, redirect_with_flash,
    see_other,
};

#[derive(Debug, Deserialize)]
pub struct DeletePostForm {
    pub post_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCommentForm {
    pub comment_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteReplyForm {
    pub reply_id: String,
}

/// 同时提交文件和文字时以文件为准
fn submitted_content(form: &mut MultipartForm) -> NewContent {
    match form.take_file("media") {
        Some(file) => NewContent::Media {
            file_name: file.file_name,
            bytes: file.bytes,
        },
        None => NewContent::Text(form.take_text("message")),
    }
}

async fn read_form(services: &Services, payload: Multipart) -> crate::errors::Result<MultipartForm> {
    MultipartForm::collect(payload, services.media.max_upload_bytes()).await
}

pub async fn view_post(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    post_id: web::Path<String>,
) -> HttpResponse {
    match services.content.thread(&post_id).await {
        Ok(thread) => {
            let frame = frame(&req, Some(&*user));
            html_page(&frame, views::post(&frame, &thread))
        }
        Err(e) => error_response(&req, &e),
    }
}

pub async fn new_post(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    payload: Multipart,
) -> HttpResponse {
    let mut form = match read_form(&services, payload).await {
        Ok(form) => form,
        Err(e) => return form_error(&req, e, "/home"),
    };

    match services
        .content
        .create_post(&user.z_id, submitted_content(&mut form))
        .await
    {
        Ok(post) => {
            info!("New post {} by {}", post.id, user.z_id);
            redirect_back(&req, "/home")
        }
        Err(e) => form_error(&req, e, "/home"),
    }
}

pub async fn new_comment(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    payload: Multipart,
) -> HttpResponse {
    let mut form = match read_form(&services, payload).await {
        Ok(form) => form,
        Err(e) => return form_error(&req, e, "/home"),
    };
    let post_id = form.text("post_id").to_string();
    let back = format!("/post/{}", post_id);

    match services
        .content
        .create_comment(&user.z_id, &post_id, submitted_content(&mut form))
        .await
    {
        Ok(comment) => see_other(&format!("/post/{}#{}", post_id, comment.id)),
        Err(e) => form_error(&req, e, &back),
    }
}

pub async fn new_reply(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    payload: Multipart,
) -> HttpResponse {
    let mut form = match read_form(&services, payload).await {
        Ok(form) => form,
        Err(e) => return form_error(&req, e, "/home"),
    };
    let comment_id = form.text("comment_id").to_string();
    let back = match form.text("post_id") {
        "" => "/home".to_string(),
        post_id => format!("/post/{}", post_id),
    };

    match services
        .content
        .create_reply(&user.z_id, &comment_id, submitted_content(&mut form))
        .await
    {
        Ok(reply) => see_other(&format!("/post/{}#{}", reply.post_id, reply.id)),
        Err(e) => form_error(&req, e, &back),
    }
}

pub async fn delete_post(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    form: web::Form<DeletePostForm>,
) -> HttpResponse {
    match services.content.delete_post(&user.z_id, &form.post_id).await {
        Ok(summary) => redirect_with_flash(
            &req,
            "/home",
            format!(
                "Post deleted along with {} comments and {} replies.",
                summary.comments, summary.replies
            ),
        ),
        Err(e) => form_error(&req, e, "/home"),
    }
}

pub async fn delete_comment(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    form: web::Form<DeleteCommentForm>,
) -> HttpResponse {
    match services
        .content
        .delete_comment(&user.z_id, &form.comment_id)
        .await
    {
        Ok(_) => redirect_back(&req, "/home"),
        Err(e) => form_error(&req, e, "/home"),
    }
}

pub async fn delete_reply(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    form: web::Form<DeleteReplyForm>,
) -> HttpResponse {
    match services.content.delete_reply(&user.z_id, &form.reply_id).await {
        Ok(_) => redirect_back(&req, "/home"),
        Err(e) => form_error(&req, e, "/home"),
    }
}
