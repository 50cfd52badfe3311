use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 抽奖日志实体
/// 说明:
/// - 每次抽奖产生一条记录, 写入后不再修改
/// - prize_name 冗余存储, 奖品配置变更后仍可回溯
/// - 重置库存不会清理日志
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "spin_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: String,
    pub prize_id: String,
    pub prize_name: String,
    /// 是否来自管理员指定
    pub was_forced: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
