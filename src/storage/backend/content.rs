//! 帖子、评论与回复

use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    QueryTrait, Select, TransactionTrait,
};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::{comment_to_content, post_to_content, reply_to_content};
use crate::errors::{Result, TalkError};
use crate::storage::models::{Content, ContentKind, DeleteSummary, NewContentRow};
use crate::utils::new_content_id;

use migration::entities::{comment, post, reply};

impl SeaOrmStorage {
    pub async fn insert_post(&self, row: NewContentRow) -> Result<Content> {
        use sea_orm::ActiveValue::Set;

        let model = post::Model {
            id: new_content_id(),
            user: row.user,
            message: row.message,
            media_type: row.media_type.to_string(),
            content_path: row.content_path,
            created_at: Utc::now(),
        };
        post::Entity::insert(post::ActiveModel {
            id: Set(model.id.clone()),
            user: Set(model.user.clone()),
            message: Set(model.message.clone()),
            media_type: Set(model.media_type.clone()),
            content_path: Set(model.content_path.clone()),
            created_at: Set(model.created_at),
        })
        .exec_without_returning(&self.db)
        .await?;

        info!("Post {} created by {}", model.id, model.user);
        Ok(post_to_content(model))
    }

    pub async fn insert_comment(&self, post_id: &str, row: NewContentRow) -> Result<Content> {
        use sea_orm::ActiveValue::Set;

        let model = comment::Model {
            id: new_content_id(),
            post: post_id.to_string(),
            user: row.user,
            message: row.message,
            media_type: row.media_type.to_string(),
            content_path: row.content_path,
            created_at: Utc::now(),
        };
        comment::Entity::insert(comment::ActiveModel {
            id: Set(model.id.clone()),
            post: Set(model.post.clone()),
            user: Set(model.user.clone()),
            message: Set(model.message.clone()),
            media_type: Set(model.media_type.clone()),
            content_path: Set(model.content_path.clone()),
            created_at: Set(model.created_at),
        })
        .exec_without_returning(&self.db)
        .await?;

        info!("Comment {} on post {} by {}", model.id, model.post, model.user);
        Ok(comment_to_content(model))
    }

    pub async fn insert_reply(
        &self,
        post_id: &str,
        comment_id: &str,
        row: NewContentRow,
    ) -> Result<Content> {
        use sea_orm::ActiveValue::Set;

        let model = reply::Model {
            id: new_content_id(),
            comment: comment_id.to_string(),
            post: post_id.to_string(),
            user: row.user,
            message: row.message,
            media_type: row.media_type.to_string(),
            content_path: row.content_path,
            created_at: Utc::now(),
        };
        reply::Entity::insert(reply::ActiveModel {
            id: Set(model.id.clone()),
            comment: Set(model.comment.clone()),
            post: Set(model.post.clone()),
            user: Set(model.user.clone()),
            message: Set(model.message.clone()),
            media_type: Set(model.media_type.clone()),
            content_path: Set(model.content_path.clone()),
            created_at: Set(model.created_at),
        })
        .exec_without_returning(&self.db)
        .await?;

        info!("Reply {} on comment {} by {}", model.id, model.comment, model.user);
        Ok(reply_to_content(model))
    }

    pub async fn get_content(&self, kind: ContentKind, id: &str) -> Result<Option<Content>> {
        let db = &self.db;
        let name = format!("get_{}({})", kind, id);
        let content = match kind {
            ContentKind::Post => self
                .read(&name, || async { post::Entity::find_by_id(id).one(db).await })
                .await?
                .map(post_to_content),
            ContentKind::Comment => self
                .read(&name, || async { comment::Entity::find_by_id(id).one(db).await })
                .await?
                .map(comment_to_content),
            ContentKind::Reply => self
                .read(&name, || async { reply::Entity::find_by_id(id).one(db).await })
                .await?
                .map(reply_to_content),
        };
        Ok(content)
    }

    /// `users` 中任一用户的帖子，按时间倒序
    pub async fn posts_by_users(&self, users: &[String]) -> Result<Vec<Content>> {
        if users.is_empty() {
            return Ok(Vec::new());
        }
        let db = &self.db;
        let models = self
            .read("posts_by_users", || async {
                post::Entity::find()
                    .filter(post::Column::User.is_in(users.iter().cloned()))
                    .order_by_desc(post::Column::CreatedAt)
                    .all(db)
                    .await
            })
            .await?;
        Ok(models.into_iter().map(post_to_content).collect())
    }

    pub async fn posts_by_user(&self, z_id: &str) -> Result<Vec<Content>> {
        self.posts_by_users(&[z_id.to_string()]).await
    }

    /// 帖子的评论，按时间倒序
    pub async fn comments_of_post(&self, post_id: &str) -> Result<Vec<Content>> {
        let db = &self.db;
        let models = self
            .read("comments_of_post", || async {
                comment::Entity::find()
                    .filter(comment::Column::Post.eq(post_id))
                    .order_by_desc(comment::Column::CreatedAt)
                    .all(db)
                    .await
            })
            .await?;
        Ok(models.into_iter().map(comment_to_content).collect())
    }

    /// `comment_ids` 中任一评论的回复，按时间倒序
    pub async fn replies_of_comments(&self, comment_ids: &[String]) -> Result<Vec<Content>> {
        if comment_ids.is_empty() {
            return Ok(Vec::new());
        }
        let db = &self.db;
        let models = self
            .read("replies_of_comments", || async {
                reply::Entity::find()
                    .filter(reply::Column::Comment.is_in(comment_ids.iter().cloned()))
                    .order_by_desc(reply::Column::CreatedAt)
                    .all(db)
                    .await
            })
            .await?;
        Ok(models.into_iter().map(reply_to_content).collect())
    }

    /// 消息包含 `needle` 的所有帖子、评论与回复
    ///
    /// 依次返回帖子、评论、回复；排序由调用方决定。
    pub async fn content_mentioning(&self, needle: &str) -> Result<Vec<Content>> {
        let db = &self.db;

        let posts = self
            .read("posts_mentioning", || async {
                post::Entity::find()
                    .filter(post::Column::Message.contains(needle))
                    .all(db)
                    .await
            })
            .await?;
        let comments = self
            .read("comments_mentioning", || async {
                comment::Entity::find()
                    .filter(comment::Column::Message.contains(needle))
                    .all(db)
                    .await
            })
            .await?;
        let replies = self
            .read("replies_mentioning", || async {
                reply::Entity::find()
                    .filter(reply::Column::Message.contains(needle))
                    .all(db)
                    .await
            })
            .await?;

        let mut found = Vec::with_capacity(posts.len() + comments.len() + replies.len());
        found.extend(posts.into_iter().map(post_to_content));
        found.extend(comments.into_iter().map(comment_to_content));
        found.extend(replies.into_iter().map(reply_to_content));
        Ok(found)
    }

    /// 删除帖子及其全部评论和回复
    ///
    /// 回复按所属评论删除，而不是按回复行上冗余的 post 列
    pub async fn delete_post_cascade(&self, post_id: &str) -> Result<DeleteSummary> {
        let txn = self.db.begin().await.map_err(|e| {
            TalkError::database_operation(format!("Failed to begin transaction: {}", e))
        })?;

        let comment_ids = comment::Entity::find()
            .select_only()
            .column(comment::Column::Id)
            .filter(comment::Column::Post.eq(post_id))
            .into_query();
        let reply_scope = Condition::any()
            .add(reply::Column::Post.eq(post_id))
            .add(reply::Column::Comment.in_subquery(comment_ids));

        let mut media = reply_media(&txn, reply_scope.clone()).await?;
        media.extend(
            media_paths(
                comment::Entity::find()
                    .select_only()
                    .column(comment::Column::ContentPath)
                    .filter(comment::Column::Post.eq(post_id)),
                &txn,
            )
            .await?,
        );
        media.extend(
            media_paths(
                post::Entity::find_by_id(post_id)
                    .select_only()
                    .column(post::Column::ContentPath),
                &txn,
            )
            .await?,
        );

        let replies = reply::Entity::delete_many()
            .filter(reply_scope)
            .exec(&txn)
            .await?
            .rows_affected;
        let comments = comment::Entity::delete_many()
            .filter(comment::Column::Post.eq(post_id))
            .exec(&txn)
            .await?
            .rows_affected;
        let posts = post::Entity::delete_by_id(post_id)
            .exec(&txn)
            .await?
            .rows_affected;

        txn.commit().await.map_err(|e| {
            TalkError::database_operation(format!("Failed to commit transaction: {}", e))
        })?;

        let summary = DeleteSummary {
            posts,
            comments,
            replies,
            media,
        };
        info!("Deleted post {}: {:?}", post_id, summary);
        Ok(summary)
    }

    /// 删除评论及其回复
    pub async fn delete_comment_cascade(&self, comment_id: &str) -> Result<DeleteSummary> {
        let txn = self.db.begin().await.map_err(|e| {
            TalkError::database_operation(format!("Failed to begin transaction: {}", e))
        })?;

        let reply_scope = Condition::all().add(reply::Column::Comment.eq(comment_id));
        let mut media = reply_media(&txn, reply_scope.clone()).await?;
        media.extend(
            media_paths(
                comment::Entity::find_by_id(comment_id)
                    .select_only()
                    .column(comment::Column::ContentPath),
                &txn,
            )
            .await?,
        );

        let replies = reply::Entity::delete_many()
            .filter(reply_scope)
            .exec(&txn)
            .await?
            .rows_affected;
        let comments = comment::Entity::delete_by_id(comment_id)
            .exec(&txn)
            .await?
            .rows_affected;

        txn.commit().await.map_err(|e| {
            TalkError::database_operation(format!("Failed to commit transaction: {}", e))
        })?;

        let summary = DeleteSummary {
            posts: 0,
            comments,
            replies,
            media,
        };
        info!("Deleted comment {}: {:?}", comment_id, summary);
        Ok(summary)
    }

    pub async fn delete_reply(&self, reply_id: &str) -> Result<DeleteSummary> {
        let txn = self.db.begin().await.map_err(|e| {
            TalkError::database_operation(format!("Failed to begin transaction: {}", e))
        })?;

        let media = reply_media(&txn, Condition::all().add(reply::Column::Id.eq(reply_id))).await?;
        let replies = reply::Entity::delete_by_id(reply_id)
            .exec(&txn)
            .await?
            .rows_affected;

        txn.commit().await.map_err(|e| {
            TalkError::database_operation(format!("Failed to commit transaction: {}", e))
        })?;

        info!("Deleted reply {}", reply_id);
        Ok(DeleteSummary {
            replies,
            media,
            ..DeleteSummary::default()
        })
    }
}

async fn reply_media(txn: &DatabaseTransaction, scope: Condition) -> Result<Vec<String>> {
    media_paths(
        reply::Entity::find()
            .select_only()
            .column(reply::Column::ContentPath)
            .filter(scope),
        txn,
    )
    .await
}

/// 只选了 content_path 一列的查询，返回其中非空的路径
async fn media_paths<E>(query: Select<E>, txn: &DatabaseTransaction) -> Result<Vec<String>>
where
    E: EntityTrait,
{
    let paths: Vec<Option<String>> = query.into_tuple().all(txn).await?;
    Ok(paths.into_iter().flatten().collect())
}

