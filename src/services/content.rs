//! 帖子、评论与回复的发布、浏览与删除

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{Result, TalkError};
use crate::services::media::MediaStore;
use crate::services::names::NameDirectory;
use crate::storage::{Content, ContentKind, DeleteSummary, NewContentRow, SeaOrmStorage};
use crate::utils::{MediaType, format_timestamp, mentioned_ids, render_message};

/// 作者提交的内容
#[derive(Debug, Clone)]
pub enum NewContent {
    Text(String),
    Media { file_name: String, bytes: Vec<u8> },
}

/// 可直接交给模板的内容
#[derive(Debug, Clone)]
pub struct ContentView {
    pub content: Content,
    pub author_name: String,
    /// 已转义、标签转为链接并处理换行的消息
    pub html: String,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct CommentThread {
    pub comment: ContentView,
    pub replies: Vec<ContentView>,
}

#[derive(Debug, Clone)]
pub struct PostThread {
    pub post: ContentView,
    pub comments: Vec<CommentThread>,
}

/// 一次查询解析 `items` 的作者与标签姓名并渲染
pub async fn present(names: &NameDirectory, items: Vec<Content>) -> Result<Vec<ContentView>> {
    let mut wanted: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for item in &items {
        for z_id in std::iter::once(item.user.clone()).chain(mentioned_ids(&item.message)) {
            if seen.insert(z_id.clone()) {
                wanted.push(z_id);
            }
        }
    }
    let resolved = names.resolve(&wanted).await?;

    Ok(items
        .into_iter()
        .map(|content| ContentView {
            author_name: resolved
                .get(&content.user)
                .cloned()
                .unwrap_or_else(|| content.user.clone()),
            html: render_message(&content.message, &resolved),
            timestamp: format_timestamp(&content.created_at),
            content,
        })
        .collect())
}

pub struct ContentService {
    storage: Arc<SeaOrmStorage>,
    media: MediaStore,
    names: NameDirectory,
}

impl ContentService {
    pub fn new(storage: Arc<SeaOrmStorage>, media: MediaStore, names: NameDirectory) -> Self {
        Self {
            storage,
            media,
            names,
        }
    }

    pub fn names(&self) -> &NameDirectory {
        &self.names
    }

    async fn prepare(&self, author: &str, content: NewContent) -> Result<NewContentRow> {
        match content {
            NewContent::Text(message) => {
                if message.trim().is_empty() {
                    return Err(TalkError::validation("Message cannot be empty"));
                }
                Ok(NewContentRow {
                    user: author.to_string(),
                    message,
                    media_type: MediaType::Text,
                    content_path: None,
                })
            }
            NewContent::Media { file_name, bytes } => {
                let (media_type, path) = self.media.save(author, &file_name, &bytes).await?;
                Ok(NewContentRow {
                    user: author.to_string(),
                    message: String::new(),
                    media_type,
                    content_path: Some(path),
                })
            }
        }
    }

    async fn require(&self, kind: ContentKind, id: &str) -> Result<Content> {
        self.storage
            .get_content(kind, id)
            .await?
            .ok_or_else(|| TalkError::not_found(format!("No such {}", kind)))
    }

    pub async fn create_post(&self, author: &str, content: NewContent) -> Result<Content> {
        let row = self.prepare(author, content).await?;
        self.storage.insert_post(row).await
    }

    pub async fn create_comment(
        &self,
        author: &str,
        post_id: &str,
        content: NewContent,
    ) -> Result<Content> {
        self.require(ContentKind::Post, post_id).await?;
        let row = self.prepare(author, content).await?;
        self.storage.insert_comment(post_id, row).await
    }

    /// 回复评论；所属帖子取自评论本身
    pub async fn create_reply(
        &self,
        author: &str,
        comment_id: &str,
        content: NewContent,
    ) -> Result<Content> {
        let comment = self.require(ContentKind::Comment, comment_id).await?;
        let row = self.prepare(author, content).await?;
        self.storage
            .insert_reply(&comment.post_id, comment_id, row)
            .await
    }

    pub async fn delete_post(&self, actor: &str, post_id: &str) -> Result<DeleteSummary> {
        let post = self.require(ContentKind::Post, post_id).await?;
        if post.user != actor {
            return Err(TalkError::forbidden("You can only delete your own posts"));
        }
        let summary = self.storage.delete_post_cascade(post_id).await?;
        self.discard_media(&summary).await;
        Ok(summary)
    }

    pub async fn delete_comment(&self, actor: &str, comment_id: &str) -> Result<DeleteSummary> {
        let comment = self.require(ContentKind::Comment, comment_id).await?;
        if comment.user != actor && !self.is_author(ContentKind::Post, &comment.post_id, actor).await? {
            return Err(TalkError::forbidden(
                "Only the comment's author or the post's author can delete it",
            ));
        }
        let summary = self.storage.delete_comment_cascade(comment_id).await?;
        self.discard_media(&summary).await;
        Ok(summary)
    }

    pub async fn delete_reply(&self, actor: &str, reply_id: &str) -> Result<DeleteSummary> {
        let reply = self.require(ContentKind::Reply, reply_id).await?;
        let allowed = reply.user == actor
            || match &reply.comment_id {
                Some(comment_id) => self.is_author(ContentKind::Comment, comment_id, actor).await?,
                None => false,
            }
            || self.is_author(ContentKind::Post, &reply.post_id, actor).await?;

        if !allowed {
            return Err(TalkError::forbidden(
                "Only the reply's author, the comment's author or the post's author can delete it",
            ));
        }
        let summary = self.storage.delete_reply(reply_id).await?;
        self.discard_media(&summary).await;
        Ok(summary)
    }

    /// 数据库删除已提交，再清理磁盘上的文件
    async fn discard_media(&self, summary: &DeleteSummary) {
        for path in &summary.media {
            self.media.remove(path).await;
        }
    }

    async fn is_author(&self, kind: ContentKind, id: &str, actor: &str) -> Result<bool> {
        Ok(self
            .storage
            .get_content(kind, id)
            .await?
            .is_some_and(|c| c.user == actor))
    }

    /// 帖子及其评论和回复，均按时间倒序
    pub async fn thread(&self, post_id: &str) -> Result<PostThread> {
        let post = self.require(ContentKind::Post, post_id).await?;
        let comments = self.storage.comments_of_post(post_id).await?;
        let comment_ids: Vec<String> = comments.iter().map(|c| c.id.clone()).collect();
        let replies = self.storage.replies_of_comments(&comment_ids).await?;

        let n_comments = comments.len();
        let mut all = Vec::with_capacity(1 + n_comments + replies.len());
        all.push(post);
        all.extend(comments);
        all.extend(replies);

        let mut views = present(&self.names, all).await?.into_iter();
        let post = views
            .next()
            .ok_or_else(|| TalkError::not_found("No such post"))?;
        let comment_views: Vec<ContentView> = views.by_ref().take(n_comments).collect();
        let reply_views: Vec<ContentView> = views.collect();

        let comments = comment_views
            .into_iter()
            .map(|comment| {
                let replies = reply_views
                    .iter()
                    .filter(|r| r.content.comment_id.as_deref() == Some(comment.content.id.as_str()))
                    .cloned()
                    .collect();
                CommentThread { comment, replies }
            })
            .collect();

        debug!("Thread {} loaded", post_id);
        Ok(PostThread { post, comments })
    }
}
