//! 好友关系行
//!
//! `(reference, friend)` 表示 `reference` 向 `friend` 发出请求；
//! 接受时设置 `accepted` 并写入镜像行，使两个方向都有记录。

use sea_orm::{
    ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::model_to_friendship;
use crate::errors::{Result, TalkError};
use crate::storage::models::Friendship;

use migration::entities::friendship;

impl SeaOrmStorage {
    pub async fn get_friendship(&self, reference: &str, friend: &str) -> Result<Option<Friendship>> {
        let db = &self.db;
        let model = self
            .read("get_friendship", || async {
                friendship::Entity::find_by_id((reference.to_string(), friend.to_string()))
                    .one(db)
                    .await
            })
            .await?;
        Ok(model.map(model_to_friendship))
    }

    /// `z_id` 已接受的好友的 zID
    pub async fn accepted_friends(&self, z_id: &str) -> Result<Vec<String>> {
        let db = &self.db;
        self.read("accepted_friends", || async {
            friendship::Entity::find()
                .select_only()
                .column(friendship::Column::Friend)
                .filter(friendship::Column::Reference.eq(z_id))
                .filter(friendship::Column::Accepted.eq(true))
                .order_by_asc(friendship::Column::Friend)
                .into_tuple::<String>()
                .all(db)
                .await
        })
        .await
    }

    /// `z_id` 作为 `reference` 的所有行对应的 zID，含待处理与已接受
    pub async fn outgoing_friends(&self, z_id: &str) -> Result<Vec<String>> {
        let db = &self.db;
        self.read("outgoing_friends", || async {
            friendship::Entity::find()
                .select_only()
                .column(friendship::Column::Friend)
                .filter(friendship::Column::Reference.eq(z_id))
                .into_tuple::<String>()
                .all(db)
                .await
        })
        .await
    }

    /// 与 `z_id` 在任一方向上有记录的所有 zID，含待处理
    pub async fn related_users(&self, z_id: &str) -> Result<Vec<String>> {
        let db = &self.db;
        let rows = self
            .read("related_users", || async {
                friendship::Entity::find()
                    .filter(
                        Condition::any()
                            .add(friendship::Column::Reference.eq(z_id))
                            .add(friendship::Column::Friend.eq(z_id)),
                    )
                    .all(db)
                    .await
            })
            .await?;

        let mut related: Vec<String> = rows
            .into_iter()
            .map(|row| {
                if row.reference == z_id {
                    row.friend
                } else {
                    row.reference
                }
            })
            .collect();
        related.sort();
        related.dedup();
        Ok(related)
    }

    /// 记录待处理请求；该方向已有记录时不变
    pub async fn insert_friend_request(&self, reference: &str, friend: &str) -> Result<bool> {
        use sea_orm::ActiveValue::Set;

        let inserted = friendship::Entity::insert(friendship::ActiveModel {
            reference: Set(reference.to_string()),
            friend: Set(friend.to_string()),
            accepted: Set(false),
        })
        .on_conflict(
            OnConflict::columns([friendship::Column::Reference, friendship::Column::Friend])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await?;

        if inserted > 0 {
            info!("Friend request {} -> {}", reference, friend);
        }
        Ok(inserted > 0)
    }

    /// 接受 `reference -> friend` 的待处理请求；不存在时返回 false
    pub async fn accept_friend_request(&self, reference: &str, friend: &str) -> Result<bool> {
        use sea_orm::ActiveValue::Set;

        let txn = self.db.begin().await.map_err(|e| {
            TalkError::database_operation(format!("Failed to begin transaction: {}", e))
        })?;

        let updated = friendship::Entity::update_many()
            .col_expr(friendship::Column::Accepted, Expr::value(true))
            .filter(friendship::Column::Reference.eq(reference))
            .filter(friendship::Column::Friend.eq(friend))
            .filter(friendship::Column::Accepted.eq(false))
            .exec(&txn)
            .await?
            .rows_affected;

        if updated == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        friendship::Entity::insert(friendship::ActiveModel {
            reference: Set(friend.to_string()),
            friend: Set(reference.to_string()),
            accepted: Set(true),
        })
        .on_conflict(
            OnConflict::columns([friendship::Column::Reference, friendship::Column::Friend])
                .update_column(friendship::Column::Accepted)
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        txn.commit().await.map_err(|e| {
            TalkError::database_operation(format!("Failed to commit transaction: {}", e))
        })?;

        info!("Friendship established: {} <-> {}", reference, friend);
        Ok(true)
    }

    /// 删除双向的好友关系，返回删除行数
    pub async fn remove_friendship(&self, a: &str, b: &str) -> Result<u64> {
        let removed = friendship::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(friendship::Column::Reference.eq(a))
                            .add(friendship::Column::Friend.eq(b)),
                    )
                    .add(
                        Condition::all()
                            .add(friendship::Column::Reference.eq(b))
                            .add(friendship::Column::Friend.eq(a)),
                    ),
            )
            .exec(&self.db)
            .await?
            .rows_affected;

        info!("Friendship removed: {} <-> {} ({} rows)", a, b, removed);
        Ok(removed)
    }
}
