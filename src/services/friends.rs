//! 好友请求、好友关系与推荐

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::info;

use crate::errors::{Result, TalkError};
use crate::services::mail::{MailMessage, Mailer, deliver};
use crate::services::recommend::rank_classmates;
use crate::storage::{SeaOrmStorage, User};
use crate::utils::{Paged, paginate};

#[derive(Debug, Clone)]
pub struct Recommendation {
    pub user: User,
    pub shared_courses: usize,
}

pub struct FriendService {
    storage: Arc<SeaOrmStorage>,
    mailer: Arc<dyn Mailer>,
    public_url: String,
    per_page: u64,
}

impl FriendService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        mailer: Arc<dyn Mailer>,
        public_url: impl Into<String>,
        per_page: u64,
    ) -> Self {
        Self {
            storage,
            mailer,
            public_url: public_url.into().trim_end_matches('/').to_string(),
            per_page: per_page.max(1),
        }
    }

    /// 记录 `from` 向 `to` 的待处理请求，并给 `to` 发送接受链接
    pub async fn send_request(&self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Err(TalkError::validation("You cannot add yourself as a friend"));
        }
        let recipient = self
            .storage
            .get_user(to)
            .await?
            .ok_or_else(|| TalkError::not_found("Unknown user"))?;

        if !self.storage.insert_friend_request(from, to).await? {
            info!("Friend request {} -> {} already exists", from, to);
            return Ok(());
        }

        let url = format!("{}/addfriend/{}/{}", self.public_url, from, to);
        deliver(
            self.mailer.as_ref(),
            MailMessage::friend_request(&recipient.email, from, to, &url),
        )
        .await;
        Ok(())
    }

    /// 接受 `reference -> friend` 请求；只有 `friend` 可以操作
    pub async fn accept(&self, reference: &str, friend: &str, actor: &str) -> Result<()> {
        if actor != friend {
            return Err(TalkError::forbidden(
                "Only the person who received this request can accept it",
            ));
        }
        if !self.storage.accept_friend_request(reference, friend).await? {
            return Err(TalkError::not_found("There is no pending friend request"));
        }
        Ok(())
    }

    pub async fn remove(&self, actor: &str, other: &str) -> Result<()> {
        self.storage.remove_friendship(actor, other).await?;
        Ok(())
    }

    /// 已接受的好友的用户记录
    pub async fn friends(&self, z_id: &str) -> Result<Vec<User>> {
        let ids = self.storage.accepted_friends(z_id).await?;
        self.storage.get_users(&ids).await
    }

    pub async fn recommendations(&self, viewer: &str, page: u64) -> Result<Paged<Recommendation>> {
        let my_courses = self.storage.courses_of(viewer).await?;
        let rows = self.storage.classmate_rows(viewer).await?;
        let excluded: HashSet<String> = self.storage.related_users(viewer).await?.into_iter().collect();

        let ranked = rank_classmates(viewer, &my_courses, &rows, &excluded);
        let paged = paginate(ranked, page, self.per_page);

        let ids: Vec<String> = paged.items.iter().map(|(z, _)| z.clone()).collect();
        let mut users: HashMap<String, User> = self
            .storage
            .get_users(&ids)
            .await?
            .into_iter()
            .map(|u| (u.z_id.clone(), u))
            .collect();

        Ok(Paged {
            items: paged
                .items
                .into_iter()
                .filter_map(|(z_id, shared_courses)| {
                    users.remove(&z_id).map(|user| Recommendation {
                        user,
                        shared_courses,
                    })
                })
                .collect(),
            page: paged.page,
            prev_page: paged.prev_page,
            next_page: paged.next_page,
        })
    }
}
