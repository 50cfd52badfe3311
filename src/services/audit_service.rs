use std::sync::Arc;

use crate::error::AppResult;
use crate::models::{PrizeCount, SpinLog, SpinRecord};
use crate::repository::SpinLogStore;

/// 抽奖审计日志
///
/// `record` 为每条记录单独派生一个任务写库, 调用方不等待结果;
/// 写入失败只记录错误日志, 不影响抽奖响应。
#[derive(Clone)]
pub struct AuditSink {
    store: Arc<dyn SpinLogStore>,
}

impl AuditSink {
    pub fn new(store: Arc<dyn SpinLogStore>) -> Self {
        Self { store }
    }

    /// 异步写入一条抽奖记录 (需要在 tokio 运行时内调用)
    pub fn record(&self, record: SpinRecord) {
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.insert(&record).await {
                log::error!(
                    "Failed to write spin log (user={}, prize={}, forced={}): {e:?}",
                    record.user_id,
                    record.prize_id,
                    record.was_forced
                );
            }
        });
    }

    pub async fn list_recent(&self, limit: u64) -> AppResult<Vec<SpinLog>> {
        self.store.recent(limit).await
    }

    pub async fn count_by_prize(&self) -> AppResult<Vec<PrizeCount>> {
        self.store.count_by_prize().await
    }
}
