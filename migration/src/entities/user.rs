//! 注册用户表，以 zID 为主键

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub z_id: String,
    pub name: String,
    pub email: String,
    /// Argon2id 哈希；旧数据集导入的行可能仍是明文
    pub password: String,
    pub program: Option<String>,
    pub birthday: Option<String>,
    pub suburb: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,
    pub image_path: Option<String>,
    pub background_path: Option<String>,
    pub verified: bool,
    /// 当前有效的密码重置凭据，用过即清空
    pub reset_nonce: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
