//! 首页动态与搜索

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use crate::api::middleware::SessionUser;
use crate::views;

use super::helpers::{Services, error_response, frame, html_page};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// `{page}` 路径参数；缺省或无法解析时为第一页
pub(super) fn page_param(req: &HttpRequest) -> u64 {
    req.match_info()
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1)
}

pub async fn home(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
) -> HttpResponse {
    match services.feed.home(&user.z_id, page_param(&req)).await {
        Ok(feed) => {
            let frame = frame(&req, Some(&*user));
            html_page(&frame, views::home(&frame, &feed))
        }
        Err(e) => error_response(&req, &e),
    }
}

pub async fn search(
    req: HttpRequest,
    services: Services,
    user: web::ReqData<SessionUser>,
    query: web::Query<SearchQuery>,
) -> HttpResponse {
    match services.feed.search(&query.q, page_param(&req)).await {
        Ok(results) => {
            let frame = frame(&req, Some(&*user));
            html_page(&frame, views::search(&frame, &results))
        }
        Err(e) => error_response(&req, &e),
    }
}
