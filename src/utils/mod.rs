pub mod markup;
pub mod pagination;
pub mod password;
pub mod upload;

use base64::Engine;

pub use markup::{escape_html, format_timestamp, mentioned_ids, render_message};
pub use pagination::{PageWindow, Paged, paginate};
pub use upload::{MediaType, secure_filename};

/// 256 位熵的 URL 安全随机令牌
pub fn generate_secure_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// 新内容 id：v4 UUID 的 32 位小写十六进制形式
pub fn new_content_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// zID 为小写 `z` 加七位数字
pub fn is_valid_zid(z_id: &str) -> bool {
    z_id.len() == 8
        && z_id.starts_with('z')
        && z_id[1..].chars().all(|c| c.is_ascii_digit())
}
