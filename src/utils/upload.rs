//! 上传文件分类与文件名清理

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// 帖子、评论或回复携带的内容类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Text,
    Image,
    Video,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "svg"];
const VIDEO_EXTENSIONS: &[&str] = &["avi", "mov", "mp4", "flv", "webm"];

impl MediaType {
    /// 按扩展名判断上传文件类型；`None` 表示不接受
    pub fn from_filename(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else {
            None
        }
    }

    pub fn is_media(&self) -> bool {
        !matches!(self, Self::Text)
    }
}

/// 把客户端提供的文件名清理为安全的单级路径。
///
/// 清理后没有可用字符时返回空字符串。
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();

    cleaned.trim_start_matches(['.', '_']).to_string()
}
