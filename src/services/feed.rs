//! 首页动态与搜索

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use strum::Display;

use crate::errors::Result;
use crate::services::content::{ContentView, present};
use crate::services::names::NameDirectory;
use crate::storage::{Content, SeaOrmStorage, User};
use crate::utils::{PageWindow, Paged, paginate};

/// 某条内容出现在首页动态中的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FeedSource {
    Own,
    Friend,
    Mention,
}

#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub content: Content,
    pub source: FeedSource,
}

/// 合并三种动态来源，按时间倒序。
///
/// 同一内容来自多个来源时只保留一次，
/// 按 own、friend、mention 的顺序取第一个来源。
pub fn merge_feed(own: Vec<Content>, friends: Vec<Content>, mentions: Vec<Content>) -> Vec<FeedEntry> {
    let mut seen = HashSet::new();
    let mut entries: Vec<FeedEntry> = own
        .into_iter()
        .map(|c| (c, FeedSource::Own))
        .chain(friends.into_iter().map(|c| (c, FeedSource::Friend)))
        .chain(mentions.into_iter().map(|c| (c, FeedSource::Mention)))
        .filter(|(c, _)| seen.insert((c.kind, c.id.clone())))
        .map(|(content, source)| FeedEntry { content, source })
        .collect();

    // sort_by 是稳定排序，时间相同时保持来源顺序
    entries.sort_by(|a, b| b.content.created_at.cmp(&a.content.created_at));
    entries
}

#[derive(Debug, Clone)]
pub struct FeedItem {
    pub view: ContentView,
    pub source: FeedSource,
}

#[derive(Debug, Clone)]
pub struct SearchResults {
    pub query: String,
    pub users: Vec<User>,
    pub content: Vec<ContentView>,
    pub page: u64,
    pub prev_page: Option<u64>,
    pub next_page: Option<u64>,
}

pub struct FeedService {
    storage: Arc<SeaOrmStorage>,
    names: NameDirectory,
    per_page: u64,
}

impl FeedService {
    pub fn new(storage: Arc<SeaOrmStorage>, names: NameDirectory, per_page: u64) -> Self {
        Self {
            storage,
            names,
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub async fn home(&self, viewer: &str, page: u64) -> Result<Paged<FeedItem>> {
        let own = self.storage.posts_by_user(viewer).await?;
        let friend_ids = self.storage.outgoing_friends(viewer).await?;
        let friends = self.storage.posts_by_users(&friend_ids).await?;
        let mentions = self.storage.content_mentioning(viewer).await?;

        let merged = merge_feed(own, friends, mentions);
        let paged = paginate(merged, page, self.per_page);

        let sources: Vec<FeedSource> = paged.items.iter().map(|e| e.source).collect();
        let contents: Vec<Content> = paged.items.iter().map(|e| e.content.clone()).collect();
        let views = present(&self.names, contents).await?;

        Ok(Paged {
            items: views
                .into_iter()
                .zip(sources)
                .map(|(view, source)| FeedItem { view, source })
                .collect(),
            page: paged.page,
            prev_page: paged.prev_page,
            next_page: paged.next_page,
        })
    }

    /// 匹配 `query` 的用户与内容，并排分页
    pub async fn search(&self, query: &str, page: u64) -> Result<SearchResults> {
        let query = query.trim();
        let (users, mut content) = if query.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            (
                self.storage.search_users(query).await?,
                self.storage.content_mentioning(query).await?,
            )
        };
        content.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let (user_range, content_range, nav) =
            PageWindow::dual(page, self.per_page, users.len(), content.len());

        let users = users[user_range].to_vec();
        let content = present(&self.names, content[content_range].to_vec()).await?;

        Ok(SearchResults {
            query: query.to_string(),
            users,
            content,
            page: page.max(1),
            prev_page: nav.prev_page,
            next_page: nav.next_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ContentKind;
    use crate::utils::MediaType;
    use chrono::{TimeZone, Utc};

    fn item(kind: ContentKind, id: &str, user: &str, minute: u32) -> Content {
        Content {
            id: id.to_string(),
            kind,
            post_id: id.to_string(),
            comment_id: None,
            user: user.to_string(),
            message: format!("message {}", id),
            media_type: MediaType::Text,
            content_path: None,
            created_at: Utc.with_ymd_and_hms(2017, 10, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_merge_orders_newest_first() {
        let own = vec![item(ContentKind::Post, "a", "z1", 5)];
        let friends = vec![item(ContentKind::Post, "b", "z2", 10), item(ContentKind::Post, "c", "z2", 1)];
        let mentions = vec![item(ContentKind::Comment, "d", "z3", 7)];

        let ids: Vec<String> = merge_feed(own, friends, mentions)
            .into_iter()
            .map(|e| e.content.id)
            .collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_merge_dedupes_with_precedence() {
        let post = item(ContentKind::Post, "p", "z2", 3);
        let merged = merge_feed(Vec::new(), vec![post.clone()], vec![post]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, FeedSource::Friend);

        let own = item(ContentKind::Post, "q", "z1", 4);
        let merged = merge_feed(vec![own.clone()], Vec::new(), vec![own]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, FeedSource::Own);
    }

    #[test]
    fn test_merge_keeps_same_id_of_different_kinds() {
        let merged = merge_feed(
            vec![item(ContentKind::Post, "x", "z1", 1)],
            Vec::new(),
            vec![item(ContentKind::Reply, "x", "z2", 2)],
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_is_stable_on_equal_timestamps() {
        let merged = merge_feed(
            vec![item(ContentKind::Post, "own", "z1", 0)],
            vec![item(ContentKind::Post, "friend", "z2", 0)],
            vec![item(ContentKind::Comment, "mention", "z3", 0)],
        );
        let sources: Vec<FeedSource> = merged.iter().map(|e| e.source).collect();
        assert_eq!(sources, vec![FeedSource::Own, FeedSource::Friend, FeedSource::Mention]);
    }
}
