use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::{ForcedOutcomeSlot, SpinLogStore, StockLedger, StockLevel};
use crate::error::{AppError, AppResult};
use crate::models::{PrizeCatalog, PrizeCount, SpinLog, SpinRecord};

/// 进程内存储
///
/// 每个操作在一把互斥锁内完成, 语义与 PostgreSQL 实现一致, 但只在单进程内成立。
#[derive(Debug, Default)]
pub struct MemoryStore {
    stocks: Mutex<HashMap<String, i64>>,
    slot: Mutex<Option<String>>,
    logs: Mutex<Vec<SpinLog>>,
}

fn guard<T>(m: &Mutex<T>) -> AppResult<MutexGuard<'_, T>> {
    m.lock()
        .map_err(|_| AppError::StoreUnavailable("memory store lock poisoned".into()))
}

#[async_trait]
impl StockLedger for MemoryStore {
    async fn try_claim(&self, prize_id: &str) -> AppResult<StockLevel> {
        let mut stocks = guard(&self.stocks)?;
        Ok(match stocks.get_mut(prize_id) {
            Some(n) => {
                *n -= 1;
                StockLevel::Remaining(*n)
            }
            None => StockLevel::Unlimited,
        })
    }

    async fn release(&self, prize_id: &str) -> AppResult<()> {
        let mut stocks = guard(&self.stocks)?;
        match stocks.get_mut(prize_id) {
            Some(n) => *n += 1,
            None => log::warn!("Release on prize {prize_id} without a stock counter"),
        }
        Ok(())
    }

    async fn read(&self, prize_id: &str) -> AppResult<StockLevel> {
        let stocks = guard(&self.stocks)?;
        Ok(match stocks.get(prize_id) {
            Some(n) => StockLevel::Remaining(*n),
            None => StockLevel::Unlimited,
        })
    }

    async fn seed(&self, catalog: &PrizeCatalog) -> AppResult<()> {
        let mut stocks = guard(&self.stocks)?;
        let finite: HashSet<&str> = catalog.finite().map(|(p, _)| p.id.as_str()).collect();
        stocks.retain(|id, _| finite.contains(id.as_str()));
        for (prize, ceiling) in catalog.finite() {
            stocks
                .entry(prize.id.clone())
                .and_modify(|n| *n = (*n).min(ceiling))
                .or_insert(ceiling);
        }
        Ok(())
    }

    async fn reset_all(&self, catalog: &PrizeCatalog) -> AppResult<()> {
        let mut stocks = guard(&self.stocks)?;
        let mut slot = guard(&self.slot)?;
        *slot = None;
        for (prize, ceiling) in catalog.finite() {
            stocks.insert(prize.id.clone(), ceiling);
        }
        Ok(())
    }
}

#[async_trait]
impl ForcedOutcomeSlot for MemoryStore {
    async fn set(&self, prize_id: &str) -> AppResult<()> {
        *guard(&self.slot)? = Some(prize_id.to_string());
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        *guard(&self.slot)? = None;
        Ok(())
    }

    async fn take(&self) -> AppResult<Option<String>> {
        Ok(guard(&self.slot)?.take())
    }

    async fn peek(&self) -> AppResult<Option<String>> {
        Ok(guard(&self.slot)?.clone())
    }
}

#[async_trait]
impl SpinLogStore for MemoryStore {
    async fn insert(&self, record: &SpinRecord) -> AppResult<()> {
        let mut logs = guard(&self.logs)?;
        let id = logs.len() as i64 + 1;
        logs.push(SpinLog {
            id,
            user_id: record.user_id.clone(),
            prize_id: record.prize_id.clone(),
            prize_name: record.prize_name.clone(),
            was_forced: record.was_forced,
            created_at: record.created_at,
        });
        Ok(())
    }

    async fn recent(&self, limit: u64) -> AppResult<Vec<SpinLog>> {
        let logs = guard(&self.logs)?;
        let mut list: Vec<SpinLog> = logs.clone();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        list.truncate(limit as usize);
        Ok(list)
    }

    async fn count_by_prize(&self) -> AppResult<Vec<PrizeCount>> {
        let logs = guard(&self.logs)?;
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for log in logs.iter() {
            *counts.entry(log.prize_id.as_str()).or_default() += 1;
        }
        let mut list: Vec<PrizeCount> = counts
            .into_iter()
            .map(|(prize_id, count)| PrizeCount {
                prize_id: prize_id.to_string(),
                count,
            })
            .collect();
        list.sort_by(|a, b| b.count.cmp(&a.count).then(a.prize_id.cmp(&b.prize_id)));
        Ok(list)
    }
}
