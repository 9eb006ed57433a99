//! 个人主页、资料编辑与选课

use std::sync::Arc;

use tracing::info;

use crate::errors::{Result, TalkError};
use crate::services::content::{ContentView, present};
use crate::services::media::MediaStore;
use crate::services::names::NameDirectory;
use crate::storage::{
    Course, DEFAULT_PROFILE_IMAGE, Friendship, ImageSlot, ProfileUpdate, SeaOrmStorage, User,
};
use crate::utils::MediaType;

/// 资料表单原始输入；空白字段忽略
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub program: String,
    pub birthday: String,
    pub suburb: String,
    pub latitude: String,
    pub longitude: String,
    pub bio: String,
}

impl ProfileForm {
    pub fn into_update(self) -> Result<ProfileUpdate> {
        fn text(value: String) -> Option<String> {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        fn coordinate(value: &str, field: &str) -> Result<Option<f64>> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| TalkError::validation(format!("{} must be a number", field)))
        }

        let latitude = coordinate(&self.latitude, "Latitude")?;
        let longitude = coordinate(&self.longitude, "Longitude")?;
        let email = text(self.email);
        if email.as_deref().is_some_and(|e| !e.contains('@')) {
            return Err(TalkError::validation("A valid e-mail address is required"));
        }

        Ok(ProfileUpdate {
            name: text(self.name),
            email,
            program: text(self.program),
            birthday: text(self.birthday),
            suburb: text(self.suburb),
            latitude,
            longitude,
            // 简介保留内部格式
            bio: (!self.bio.trim().is_empty()).then_some(self.bio),
        })
    }
}

/// 上传到某个图片位的图片
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub slot: ImageSlot,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub user: User,
    pub posts: Vec<ContentView>,
    pub friends: Vec<User>,
    /// 存在 (viewer, user) 行：访问者已发出请求或已是好友
    pub friendship: Option<Friendship>,
    /// 主页主人已向访问者发出请求，正在等待
    pub pending_from_user: bool,
    pub courses: Vec<Course>,
}

pub struct ProfileService {
    storage: Arc<SeaOrmStorage>,
    media: MediaStore,
    names: NameDirectory,
}

impl ProfileService {
    pub fn new(storage: Arc<SeaOrmStorage>, media: MediaStore, names: NameDirectory) -> Self {
        Self {
            storage,
            media,
            names,
        }
    }

    async fn require_user(&self, z_id: &str) -> Result<User> {
        self.storage
            .get_user(z_id)
            .await?
            .ok_or_else(|| TalkError::not_found(format!("No user {}", z_id)))
    }

    fn require_owner(actor: &str, z_id: &str) -> Result<()> {
        if actor != z_id {
            return Err(TalkError::forbidden("You cannot edit someone else's profile"));
        }
        Ok(())
    }

    pub async fn user(&self, z_id: &str) -> Result<User> {
        self.require_user(z_id).await
    }

    pub async fn profile(&self, viewer: &str, z_id: &str) -> Result<ProfilePage> {
        let user = self.require_user(z_id).await?;
        let posts = present(&self.names, self.storage.posts_by_user(z_id).await?).await?;
        let friend_ids = self.storage.accepted_friends(z_id).await?;
        let friends = self.storage.get_users(&friend_ids).await?;
        let friendship = self.storage.get_friendship(viewer, z_id).await?;
        let pending_from_user = self
            .storage
            .get_friendship(z_id, viewer)
            .await?
            .is_some_and(|f| !f.accepted);
        let courses = self.storage.courses_of(z_id).await?;

        Ok(ProfilePage {
            user,
            posts,
            friends,
            friendship,
            pending_from_user,
            courses,
        })
    }

    pub async fn update(
        &self,
        actor: &str,
        z_id: &str,
        form: ProfileForm,
        images: Vec<ImageUpload>,
    ) -> Result<()> {
        Self::require_owner(actor, z_id)?;
        let update = form.into_update()?;
        let renamed = update.name.is_some();

        for image in &images {
            if MediaType::from_filename(&image.file_name) != Some(MediaType::Image) {
                return Err(TalkError::validation("Profile pictures must be images"));
            }
        }

        if !self.storage.update_profile(z_id, &update).await? {
            return Err(TalkError::not_found(format!("No user {}", z_id)));
        }

        if !images.is_empty() {
            let mut user = self.require_user(z_id).await?;
            for image in images {
                let (_, path) = self.media.save(z_id, &image.file_name, &image.bytes).await?;
                self.storage.set_image(z_id, image.slot, Some(path.clone())).await?;

                // 新图已经生效，旧文件可以删掉
                let current = match image.slot {
                    ImageSlot::Profile => &mut user.image_path,
                    ImageSlot::Background => &mut user.background_path,
                };
                if let Some(old) = current.replace(path).filter(|p| p != DEFAULT_PROFILE_IMAGE) {
                    self.media.remove(&old).await;
                }
            }
        }

        if renamed {
            self.names.invalidate(z_id).await;
        }
        info!("Profile updated: {}", z_id);
        Ok(())
    }

    /// 清空图片：背景图直接移除，头像恢复为默认图片
    pub async fn delete_image(&self, actor: &str, z_id: &str, slot: &str) -> Result<()> {
        Self::require_owner(actor, z_id)?;
        let slot: ImageSlot = slot
            .parse()
            .map_err(|_| TalkError::validation(format!("Unknown image slot: {}", slot)))?;

        let user = self.require_user(z_id).await?;
        let (old, replacement) = match slot {
            ImageSlot::Background => (user.background_path, None),
            ImageSlot::Profile => (user.image_path, Some(DEFAULT_PROFILE_IMAGE.to_string())),
        };

        self.storage.set_image(z_id, slot, replacement).await?;
        if let Some(old) = old.filter(|p| p != DEFAULT_PROFILE_IMAGE) {
            self.media.remove(&old).await;
        }
        Ok(())
    }

    pub async fn courses(&self, z_id: &str) -> Result<Vec<Course>> {
        self.storage.courses_of(z_id).await
    }

    /// 为 `z_id` 选课；同一开课重复选择不会生效
    pub async fn add_course(&self, z_id: &str, code: &str, year: i32, semester: &str) -> Result<bool> {
        let code = code.trim().to_uppercase();
        let semester = semester.trim().to_uppercase();
        if code.is_empty() || semester.is_empty() {
            return Err(TalkError::validation("Course code and semester are required"));
        }
        if !(1900..=2100).contains(&year) {
            return Err(TalkError::validation("Year is out of range"));
        }

        self.storage
            .add_course(&Course {
                user: z_id.to_string(),
                code,
                year,
                semester,
            })
            .await
    }

    pub async fn remove_course(&self, z_id: &str, code: &str) -> Result<u64> {
        self.storage
            .remove_course(z_id, &code.trim().to_uppercase())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_are_ignored() {
        let update = ProfileForm {
            name: "  ".into(),
            program: "3778 Computer Science".into(),
            ..Default::default()
        }
        .into_update()
        .unwrap();
        assert_eq!(update.name, None);
        assert_eq!(update.program.as_deref(), Some("3778 Computer Science"));
    }

    #[test]
    fn test_coordinates_must_parse() {
        let err = ProfileForm {
            latitude: "north".into(),
            ..Default::default()
        }
        .into_update()
        .unwrap_err();
        assert!(matches!(err, TalkError::Validation(_)));

        let update = ProfileForm {
            latitude: "-33.917".into(),
            longitude: "151.231".into(),
            ..Default::default()
        }
        .into_update()
        .unwrap();
        assert_eq!(update.latitude, Some(-33.917));
        assert_eq!(update.longitude, Some(151.231));
    }

    #[test]
    fn test_bio_keeps_formatting() {
        let update = ProfileForm {
            bio: "line one\n  line two".into(),
            ..Default::default()
        }
        .into_update()
        .unwrap();
        assert_eq!(update.bio.as_deref(), Some("line one\n  line two"));
    }
}
