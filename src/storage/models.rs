use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::utils::MediaType;

/// 用户没有自己的头像时存储的路径
pub const DEFAULT_PROFILE_IMAGE: &str = "images/defaultprofile.svg";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub z_id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub program: Option<String>,
    pub birthday: Option<String>,
    pub suburb: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub bio: Option<String>,
    pub image_path: Option<String>,
    pub background_path: Option<String>,
    pub verified: bool,
}

impl User {
    pub fn profile_image(&self) -> &str {
        self.image_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PROFILE_IMAGE)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub z_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// 用户可修改的资料字段；`None` 表示不修改该列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub program: Option<String>,
    pub birthday: Option<String>,
    pub suburb: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub bio: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum ImageSlot {
    #[strum(serialize = "image")]
    Profile,
    #[strum(serialize = "background")]
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Post,
    Comment,
    Reply,
}

/// 帖子、评论或回复
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub id: String,
    pub kind: ContentKind,
    /// 所属帖子；帖子本身则为自己的 id
    pub post_id: String,
    /// 所属评论，仅回复有值
    pub comment_id: Option<String>,
    pub user: String,
    pub message: String,
    pub media_type: MediaType,
    pub content_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 尚未分配 id 的新帖子、评论或回复
#[derive(Debug, Clone)]
pub struct NewContentRow {
    pub user: String,
    pub message: String,
    pub media_type: MediaType,
    pub content_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Course {
    pub user: String,
    pub code: String,
    pub year: i32,
    pub semester: String,
}

impl Course {
    /// 两条选课记录须相同的 (code, year, semester) 三元组，相同即为同学
    pub fn offering(&self) -> (&str, i32, &str) {
        (&self.code, self.year, &self.semester)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Friendship {
    pub reference: String,
    pub friend: String,
    pub accepted: bool,
}

/// 级联删除移除的行数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub posts: u64,
    pub comments: u64,
    pub replies: u64,
    /// 被删除内容引用的上传文件，提交后由调用方清理
    #[serde(skip)]
    pub media: Vec<String>,
}
