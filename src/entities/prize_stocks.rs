use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 限量奖品库存计数器
/// 概念说明:
/// - 只有有限库存的奖品才有记录, 无记录 = 无限库存 (不是零库存)
/// - stock: 剩余库存, 并发扣减时可能短暂为负, 由调用方补偿
/// - ceiling: 配置的库存上限, 重置时恢复到此值
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "prize_stocks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub prize_id: String,
    pub stock: i64,
    pub ceiling: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
