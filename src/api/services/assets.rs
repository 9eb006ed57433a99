//! 内嵌静态资源与用户上传的媒体

use actix_web::http::header::{CACHE_CONTROL, CONTENT_SECURITY_POLICY, X_CONTENT_TYPE_OPTIONS};
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::{debug, trace};

use crate::errors::TalkError;
use crate::views::{StaticAssets, content_type_for};

use super::helpers::{Services, error_response};

/// 上传内容与站点同源，禁止其中的脚本执行
const UPLOAD_CSP: &str = "default-src 'none'; style-src 'unsafe-inline'; sandbox";

fn embedded(path: &str) -> Option<HttpResponse> {
    StaticAssets::get(path).map(|content| {
        HttpResponse::Ok()
            .content_type(content_type_for(path))
            .insert_header((CACHE_CONTROL, "public, max-age=3600"))
            .body(content.data.into_owned())
    })
}

pub async fn static_file(req: HttpRequest) -> HttpResponse {
    let path = req.match_info().query("path");
    trace!("Serving static file: {}", path);

    match embedded(path) {
        Some(response) => response,
        None => {
            debug!("Static file not found: {}", path);
            error_response(&req, &TalkError::not_found("File not found"))
        }
    }
}

/// 先查上传目录，再回退到内置的默认图片（如默认头像）
pub async fn image(req: HttpRequest, services: Services, path: web::Path<String>) -> HttpResponse {
    trace!("Serving media: {}", path);

    match services.media.open(&path).await {
        Ok(media) => HttpResponse::Ok()
            .content_type(content_type_for(&media.file_name))
            .insert_header((CACHE_CONTROL, "private, max-age=3600"))
            .insert_header((CONTENT_SECURITY_POLICY, UPLOAD_CSP))
            .insert_header((X_CONTENT_TYPE_OPTIONS, "nosniff"))
            .body(media.bytes),
        Err(TalkError::NotFound(_)) => embedded(&path).unwrap_or_else(|| {
            error_response(&req, &TalkError::not_found("File not found"))
        }),
        Err(e) => error_response(&req, &e),
    }
}
