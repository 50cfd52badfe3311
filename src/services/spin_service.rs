use chrono::Utc;
use rand::Rng;
use std::sync::Arc;

use crate::error::AppResult;
use crate::models::{PrizeCatalog, PrizeDefinition, SpinOutcome, SpinRecord};
use crate::repository::{ForcedOutcomeSlot, StockLedger, Stores};
use crate::services::AuditSink;

#[derive(Clone)]
pub struct SpinService {
    catalog: Arc<PrizeCatalog>,
    ledger: Arc<dyn StockLedger>,
    slot: Arc<dyn ForcedOutcomeSlot>,
    audit: AuditSink,
}

impl SpinService {
    pub fn new(catalog: Arc<PrizeCatalog>, stores: &Stores, audit: AuditSink) -> Self {
        Self {
            catalog,
            ledger: stores.ledger.clone(),
            slot: stores.slot.clone(),
            audit,
        }
    }

    /// 抽奖 (Spin)
    ///
    /// 逻辑:
    /// 1. 取走管理员指定的结果 (原子读取并清除)
    /// 2. 有指定时扣减其库存; 成功则直接返回该奖品
    /// 3. 库存不足时补偿扣减, 指定作废, 改为随机抽取
    /// 4. 随机抽取只在非 forced_only 奖品中按权重进行
    /// 5. 异步写入抽奖日志, 不等待写入完成
    ///
    /// 任何存储错误都会使本次抽奖失败, 不会降级为随机结果。
    pub async fn spin(&self, user_id: &str) -> AppResult<SpinOutcome> {
        let outcome = match self.claim_forced().await? {
            Some(outcome) => outcome,
            None => self.draw_random().await?,
        };

        self.audit.record(SpinRecord::new(user_id, &outcome, Utc::now()));

        Ok(outcome)
    }

    // -----------------------------
    // 内部辅助方法
    // -----------------------------

    /// 处理指定结果。指定一旦被取走即作废, 无论库存是否足够。
    async fn claim_forced(&self) -> AppResult<Option<SpinOutcome>> {
        let Some(prize_id) = self.slot.take().await? else {
            return Ok(None);
        };

        let Some(prize) = self.catalog.get(&prize_id) else {
            log::warn!("Forced prize {prize_id} is not in the catalog, ignoring");
            return Ok(None);
        };

        let level = self.ledger.try_claim(&prize.id).await?;
        if level.is_claimed() {
            log::info!("Forced prize {} awarded (stock: {:?})", prize.id, level);
            return Ok(Some(SpinOutcome::new(prize, true)));
        }

        self.ledger.release(&prize.id).await?;
        log::warn!(
            "Forced prize {} is out of stock, falling back to random draw",
            prize.id
        );
        Ok(None)
    }

    /// 按权重随机抽取; 命中限量奖品时扣减库存, 扣减失败则排除该奖品重抽。
    async fn draw_random(&self) -> AppResult<SpinOutcome> {
        let mut excluded: Vec<&str> = Vec::new();

        loop {
            let candidates: Vec<&PrizeDefinition> = self
                .catalog
                .eligible()
                .filter(|p| !excluded.contains(&p.id.as_str()))
                .collect();

            let picked = {
                let mut rng = rand::thread_rng();
                pick_weighted(&candidates, &mut rng)
            };

            let Some(prize) = picked else {
                return Ok(SpinOutcome::new(self.catalog.no_win(), false));
            };

            if !prize.is_limited() {
                return Ok(SpinOutcome::new(prize, false));
            }

            if self.ledger.try_claim(&prize.id).await?.is_claimed() {
                return Ok(SpinOutcome::new(prize, false));
            }

            self.ledger.release(&prize.id).await?;
            log::info!("Prize {} is out of stock, redrawing without it", prize.id);
            excluded.push(prize.id.as_str());
        }
    }
}

/// 按权重抽取一个奖品; 总权重为 0 时返回 None
pub fn pick_weighted<'a, R: Rng + ?Sized>(
    candidates: &[&'a PrizeDefinition],
    rng: &mut R,
) -> Option<&'a PrizeDefinition> {
    let total: u64 = candidates.iter().map(|p| u64::from(p.weight)).sum();
    if total == 0 {
        return None;
    }
    select_by_roll(candidates, rng.gen_range(0..total))
}

/// 累积分布抽取: 返回第一个累积权重严格大于 `roll` 的奖品。
/// 权重为 0 的奖品区间宽度为 0, 永远不会被选中。
pub fn select_by_roll<'a>(
    candidates: &[&'a PrizeDefinition],
    roll: u64,
) -> Option<&'a PrizeDefinition> {
    let mut acc = 0u64;
    for p in candidates {
        acc += u64::from(p.weight);
        if roll < acc {
            return Some(*p);
        }
    }
    None
}
