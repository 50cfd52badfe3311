use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 管理员指定的下一次抽奖结果
/// 表中最多一行 (id 固定为 1), 后写覆盖前写, 被下一次抽奖取走后删除
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "forced_outcome")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub prize_id: String,
    pub locked_at: DateTime<Utc>,
}

/// 单行主键
pub const SLOT_ID: i32 = 1;

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
