//! 个人主页、资料编辑与选课

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use crate::api::middleware::SessionUser;
use crate::errors::TalkError;
use crate::services::{ImageUpload, ProfileForm};
use crate::storage::ImageSlot;
use crate::views;

use super::forms::MultipartForm;
use super::helpers::{
    Services, error_response, form_error, frame, html_page, redirect_back, redirect_with_flash,
    see_other,
};

#[derive(Debug, Deserialize)]
pub struct CourseForm {
    pub code: String,
    pub year: String,
    pub semester: String,
}

pub async fn view_profile(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    z_id: web::Path<String>,
) -> HttpResponse {
    match services.profiles.profile(&user.z_id, &z_id).await {
        Ok(page) => {
            let frame = frame(&req, Some(&*user));
            html_page(&frame, views::profile(&frame, &page))
        }
        Err(e) => error_response(&req, &e),
    }
}

pub async fn edit_page(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    z_id: web::Path<String>,
) -> HttpResponse {
    if user.z_id != *z_id {
        return error_response(
            &req,
            &TalkError::forbidden("You cannot edit someone else's profile"),
        );
    }

    let loaded = async {
        let profile = services.profiles.user(&z_id).await?;
        let courses = services.profiles.courses(&z_id).await?;
        Ok::<_, TalkError>((profile, courses))
    }
    .await;

    match loaded {
        Ok((profile, courses)) => {
            let frame = frame(&req, Some(&*user));
            html_page(&frame, views::edit_profile(&frame, &profile, &courses))
        }
        Err(e) => error_response(&req, &e),
    }
}

pub async fn edit(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    z_id: web::Path<String>,
    payload: Multipart,
) -> HttpResponse {
    let back = format!("/edit_profile/{}", z_id);
    let mut form = match MultipartForm::collect(payload, services.media.max_upload_bytes()).await {
        Ok(form) => form,
        Err(e) => return form_error(&req, e, &back),
    };

    let fields = ProfileForm {
        name: form.take_text("name"),
        email: form.take_text("email"),
        program: form.take_text("program"),
        birthday: form.take_text("birthday"),
        suburb: form.take_text("suburb"),
        latitude: form.take_text("latitude"),
        longitude: form.take_text("longitude"),
        bio: form.take_text("bio"),
    };
    let images: Vec<ImageUpload> = [ImageSlot::Profile, ImageSlot::Background]
        .into_iter()
        .filter_map(|slot| {
            form.take_file(&slot.to_string()).map(|file| ImageUpload {
                slot,
                file_name: file.file_name,
                bytes: file.bytes,
            })
        })
        .collect();

    match services
        .profiles
        .update(&user.z_id, &z_id, fields, images)
        .await
    {
        Ok(()) => redirect_with_flash(&req, &format!("/profile/{}", z_id), "Profile updated."),
        Err(e) => form_error(&req, e, &back),
    }
}

pub async fn delete_user_image(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (z_id, slot) = path.into_inner();
    let back = format!("/edit_profile/{}", z_id);

    match services.profiles.delete_image(&user.z_id, &z_id, &slot).await {
        Ok(()) => see_other(&back),
        Err(e) => form_error(&req, e, &back),
    }
}

pub async fn add_course(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    form: web::Form<CourseForm>,
) -> HttpResponse {
    let back = format!("/edit_profile/{}", user.z_id);
    let Ok(year) = form.year.trim().parse::<i32>() else {
        return redirect_with_flash(&req, &back, "Year must be a number");
    };

    match services
        .profiles
        .add_course(&user.z_id, &form.code, year, &form.semester)
        .await
    {
        Ok(true) => redirect_back(&req, &back),
        Ok(false) => redirect_with_flash(
            &req,
            &back,
            format!("You are already enrolled in {}", form.code.trim().to_uppercase()),
        ),
        Err(e) => form_error(&req, e, &back),
    }
}

pub async fn remove_course(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    code: web::Path<String>,
) -> HttpResponse {
    let back = format!("/edit_profile/{}", user.z_id);
    match services.profiles.remove_course(&user.z_id, &code).await {
        Ok(_) => redirect_back(&req, &back),
        Err(e) => form_error(&req, e, &back),
    }
}
