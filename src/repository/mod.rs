//! 存储接口
//!
//! 抽奖流程依赖的三个外部存储:
//! - `StockLedger`: 限量奖品库存计数器 (原子扣减 / 补偿)
//! - `ForcedOutcomeSlot`: 管理员指定结果 (单值, 原子取走)
//! - `SpinLogStore`: 只追加的抽奖日志
//!
//! 正确性依赖存储层的单次原子操作, 不使用进程内锁, 多实例共享同一存储时仍然成立。

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::AppResult;
use crate::models::{PrizeCatalog, PrizeCount, SpinLog, SpinRecord};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// 库存计数器读数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    /// 无计数器
    Unlimited,
    Remaining(i64),
}

impl StockLevel {
    /// 扣减后的值是否代表抢占成功
    pub fn is_claimed(&self) -> bool {
        match self {
            StockLevel::Unlimited => true,
            StockLevel::Remaining(n) => *n >= 0,
        }
    }

    pub fn as_option(&self) -> Option<i64> {
        match self {
            StockLevel::Unlimited => None,
            StockLevel::Remaining(n) => Some(*n),
        }
    }
}

#[async_trait]
pub trait StockLedger: Send + Sync {
    /// 原子扣减一个库存并返回扣减后的值。
    /// 无计数器时不做修改, 返回 `Unlimited`。
    /// 返回负值表示库存已耗尽, 调用方必须调用 `release` 补偿。
    async fn try_claim(&self, prize_id: &str) -> AppResult<StockLevel>;

    /// 原子加回一个库存, 必须与 `try_claim` 成对使用
    async fn release(&self, prize_id: &str) -> AppResult<()>;

    /// 当前库存 (仅用于展示, 与并发扣减无原子性保证)
    async fn read(&self, prize_id: &str) -> AppResult<StockLevel>;

    /// 启动时初始化: 补齐缺失的计数器 (已有的保留剩余值), 删除不再限量的奖品计数器
    async fn seed(&self, catalog: &PrizeCatalog) -> AppResult<()>;

    /// 将所有限量奖品恢复到上限, 同时清除指定结果
    async fn reset_all(&self, catalog: &PrizeCatalog) -> AppResult<()>;
}

#[async_trait]
pub trait ForcedOutcomeSlot: Send + Sync {
    /// 覆盖当前指定的奖品 (不检查库存)
    async fn set(&self, prize_id: &str) -> AppResult<()>;

    /// 清除指定, 没有指定时也返回成功
    async fn clear(&self) -> AppResult<()>;

    /// 原子读取并清除
    async fn take(&self) -> AppResult<Option<String>>;

    /// 只读查看, 不清除
    async fn peek(&self) -> AppResult<Option<String>>;
}

#[async_trait]
pub trait SpinLogStore: Send + Sync {
    async fn insert(&self, record: &SpinRecord) -> AppResult<()>;

    /// 最近的记录, 按时间倒序
    async fn recent(&self, limit: u64) -> AppResult<Vec<SpinLog>>;

    /// 各奖品中奖次数, 按次数倒序
    async fn count_by_prize(&self) -> AppResult<Vec<PrizeCount>>;
}

/// 服务共享的存储句柄
#[derive(Clone)]
pub struct Stores {
    pub ledger: Arc<dyn StockLedger>,
    pub slot: Arc<dyn ForcedOutcomeSlot>,
    pub logs: Arc<dyn SpinLogStore>,
}

impl Stores {
    pub fn postgres(pool: crate::database::DbPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            ledger: store.clone(),
            slot: store.clone(),
            logs: store,
        }
    }

    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::default()))
    }

    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            ledger: store.clone(),
            slot: store.clone(),
            logs: store,
        }
    }
}
