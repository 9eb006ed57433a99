//! 用户行

use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::{model_to_user, new_user_to_active_model};
use crate::errors::{Result, TalkError};
use crate::storage::models::{ImageSlot, NewUser, ProfileUpdate, User};

use migration::entities::user;

impl SeaOrmStorage {
    pub async fn get_user(&self, z_id: &str) -> Result<Option<User>> {
        let db = &self.db;
        let model = self
            .read(&format!("get_user({})", z_id), || async {
                user::Entity::find_by_id(z_id).one(db).await
            })
            .await?;
        Ok(model.map(model_to_user))
    }

    /// 插入未验证的新账号；zID 已存在时返回 `Conflict`。
    pub async fn insert_user(&self, new_user: &NewUser) -> Result<()> {
        if self.get_user(&new_user.z_id).await?.is_some() {
            return Err(TalkError::conflict(
                "A user with this zid has already made an account",
            ));
        }

        user::Entity::insert(new_user_to_active_model(new_user))
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| {
                let msg = e.to_string().to_lowercase();
                if msg.contains("unique") || msg.contains("duplicate") {
                    TalkError::conflict("A user with this zid has already made an account")
                } else {
                    TalkError::database_operation(format!("Failed to insert user: {}", e))
                }
            })?;

        info!("User created: {}", new_user.z_id);
        Ok(())
    }

    /// 写入 `update` 中有值的字段；用户不存在时返回 false
    pub async fn update_profile(&self, z_id: &str, update: &ProfileUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(self.get_user(z_id).await?.is_some());
        }

        let mut query = user::Entity::update_many().filter(user::Column::ZId.eq(z_id));
        let text_fields = [
            (user::Column::Name, &update.name),
            (user::Column::Email, &update.email),
            (user::Column::Program, &update.program),
            (user::Column::Birthday, &update.birthday),
            (user::Column::Suburb, &update.suburb),
            (user::Column::Bio, &update.bio),
        ];
        for (column, value) in text_fields {
            if let Some(value) = value {
                query = query.col_expr(column, Expr::value(value.clone()));
            }
        }
        if let Some(lat) = update.latitude {
            query = query.col_expr(user::Column::Latitude, Expr::value(lat));
        }
        if let Some(lng) = update.longitude {
            query = query.col_expr(user::Column::Longitude, Expr::value(lng));
        }

        let result = query.exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    /// 改密码的同时作废尚未使用的重置链接
    pub async fn set_password(&self, z_id: &str, password_hash: &str) -> Result<bool> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::Password, Expr::value(password_hash))
            .col_expr(user::Column::ResetNonce, Expr::value(Option::<String>::None))
            .filter(user::Column::ZId.eq(z_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// 记录新的重置凭据，旧链接随之失效
    pub async fn set_reset_nonce(&self, z_id: &str, nonce: &str) -> Result<bool> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::ResetNonce, Expr::value(nonce))
            .filter(user::Column::ZId.eq(z_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn reset_nonce_of(&self, z_id: &str) -> Result<Option<String>> {
        let db = &self.db;
        let nonce: Option<Option<String>> = self
            .read(&format!("reset_nonce_of({})", z_id), || async {
                user::Entity::find_by_id(z_id)
                    .select_only()
                    .column(user::Column::ResetNonce)
                    .into_tuple::<Option<String>>()
                    .one(db)
                    .await
            })
            .await?;
        Ok(nonce.flatten())
    }

    /// 原子地消费重置凭据：仅当库中的值与 `nonce` 相同时清空并返回 true
    pub async fn consume_reset_nonce(&self, z_id: &str, nonce: &str) -> Result<bool> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::ResetNonce, Expr::value(Option::<String>::None))
            .filter(user::Column::ZId.eq(z_id))
            .filter(user::Column::ResetNonce.eq(nonce))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn mark_verified(&self, z_id: &str) -> Result<bool> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::Verified, Expr::value(true))
            .filter(user::Column::ZId.eq(z_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn set_image(&self, z_id: &str, slot: ImageSlot, path: Option<String>) -> Result<bool> {
        let column = match slot {
            ImageSlot::Profile => user::Column::ImagePath,
            ImageSlot::Background => user::Column::BackgroundPath,
        };
        let result = user::Entity::update_many()
            .col_expr(column, Expr::value(path))
            .filter(user::Column::ZId.eq(z_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// zID 或姓名包含 `query` 的已验证用户
    pub async fn search_users(&self, query: &str) -> Result<Vec<User>> {
        let db = &self.db;
        let models = self
            .read("search_users", || async {
                user::Entity::find()
                    .filter(
                        Condition::all().add(user::Column::Verified.eq(true)).add(
                            Condition::any()
                                .add(user::Column::ZId.contains(query))
                                .add(user::Column::Name.contains(query)),
                        ),
                    )
                    .order_by_asc(user::Column::ZId)
                    .all(db)
                    .await
            })
            .await?;
        Ok(models.into_iter().map(model_to_user).collect())
    }

    pub async fn get_users(&self, z_ids: &[String]) -> Result<Vec<User>> {
        if z_ids.is_empty() {
            return Ok(Vec::new());
        }
        let db = &self.db;
        let models = self
            .read("get_users", || async {
                user::Entity::find()
                    .filter(user::Column::ZId.is_in(z_ids.iter().cloned()))
                    .order_by_asc(user::Column::ZId)
                    .all(db)
                    .await
            })
            .await?;
        Ok(models.into_iter().map(model_to_user).collect())
    }

    /// `z_ids` 中存在的 zID 到姓名的映射
    pub async fn display_names(&self, z_ids: &[String]) -> Result<HashMap<String, String>> {
        if z_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let db = &self.db;
        let rows: Vec<(String, String)> = self
            .read("display_names", || async {
                user::Entity::find()
                    .select_only()
                    .column(user::Column::ZId)
                    .column(user::Column::Name)
                    .filter(user::Column::ZId.is_in(z_ids.iter().cloned()))
                    .into_tuple()
                    .all(db)
                    .await
            })
            .await?;
        Ok(rows.into_iter().collect())
    }
}
