//! cookie 与请求头名称

/// 会话 JWT（HttpOnly）
pub const SESSION_COOKIE_NAME: &str = "unswtalk_session";

/// 双重提交的 CSRF 令牌，页面脚本可读
pub const CSRF_COOKIE_NAME: &str = "unswtalk_csrf";

/// 待显示的提示消息，base64url 编码的 JSON
pub const FLASH_COOKIE_NAME: &str = "unswtalk_flash";

pub const CSRF_HEADER_NAME: &str = "X-CSRF-Token";

pub const CSRF_QUERY_PARAM: &str = "csrf_token";

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";
