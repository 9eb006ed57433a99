//! 有向好友关系表
//!
//! A 向 B 发出的请求存为 `(reference = A, friend = B, accepted = false)`。
//! 接受后该行置为已接受并补一条镜像行 `(B, A, true)`，
//! 已建立的好友关系总是双向都有记录。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "friends")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub reference: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub friend: String,
    pub accepted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
