use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{
    AdminStatusResponse, LockStatusResponse, PrizeCatalog, PrizeResponse, SpinLog,
    SpinStatsResponse, StockStatus,
};
use crate::repository::{ForcedOutcomeSlot, StockLedger, Stores};
use crate::services::AuditSink;

const DEFAULT_LOG_LIMIT: u32 = 50;
const MAX_LOG_LIMIT: u32 = 100;

/// 管理后台操作: 指定结果、重置库存、查询状态与统计
#[derive(Clone)]
pub struct AdminService {
    catalog: Arc<PrizeCatalog>,
    ledger: Arc<dyn StockLedger>,
    slot: Arc<dyn ForcedOutcomeSlot>,
    audit: AuditSink,
    admin_secret: String,
}

impl AdminService {
    pub fn new(
        catalog: Arc<PrizeCatalog>,
        stores: &Stores,
        audit: AuditSink,
        admin_secret: String,
    ) -> Self {
        Self {
            catalog,
            ledger: stores.ledger.clone(),
            slot: stores.slot.clone(),
            audit,
            admin_secret,
        }
    }

    /// 校验管理员密钥 (未配置密钥时拒绝所有请求)
    pub fn verify_secret(&self, secret: &str) -> AppResult<()> {
        if self.admin_secret.is_empty() || secret != self.admin_secret {
            return Err(AppError::AuthError("Invalid admin secret".into()));
        }
        Ok(())
    }

    /// 指定下一次抽奖结果; 未知奖品在写入前拒绝
    pub async fn lock(&self, prize_id: &str) -> AppResult<()> {
        let prize_id = prize_id.trim();
        if prize_id.is_empty() {
            return Err(AppError::ValidationError("Prize ID is required".into()));
        }
        if !self.catalog.contains(prize_id) {
            return Err(AppError::InvalidPrize(prize_id.to_string()));
        }

        self.slot.set(prize_id).await?;
        log::info!("Next spin locked to prize {prize_id}");
        Ok(())
    }

    pub async fn unlock(&self) -> AppResult<()> {
        self.slot.clear().await?;
        log::info!("Prize lock removed");
        Ok(())
    }

    /// 恢复所有限量奖品库存并清除指定; 抽奖日志保留
    pub async fn reset(&self) -> AppResult<()> {
        self.ledger.reset_all(&self.catalog).await?;
        log::info!("All stocks reset to catalog ceilings");
        Ok(())
    }

    pub async fn lock_status(&self) -> AppResult<LockStatusResponse> {
        let locked = self.slot.peek().await?;
        Ok(LockStatusResponse {
            is_locked: locked.is_some(),
            locked_prize_id: locked,
        })
    }

    pub async fn stocks(&self) -> AppResult<Vec<StockStatus>> {
        let mut list = Vec::new();
        for (prize, ceiling) in self.catalog.finite() {
            let level = self.ledger.read(&prize.id).await?;
            list.push(StockStatus {
                prize_id: prize.id.clone(),
                name: prize.display_name.clone(),
                stock: level.as_option(),
                max: ceiling,
            });
        }
        Ok(list)
    }

    pub async fn status(&self) -> AppResult<AdminStatusResponse> {
        Ok(AdminStatusResponse {
            lock: self.lock_status().await?,
            stocks: self.stocks().await?,
        })
    }

    /// 最近抽奖记录 (默认 50 条, 最多 100 条)
    pub async fn recent_logs(&self, limit: Option<u32>) -> AppResult<Vec<SpinLog>> {
        let limit = limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);
        self.audit.list_recent(u64::from(limit)).await
    }

    pub async fn stats(&self) -> AppResult<SpinStatsResponse> {
        let by_prize = self.audit.count_by_prize().await?;
        Ok(SpinStatsResponse {
            total_spins: by_prize.iter().map(|c| c.count).sum(),
            by_prize,
        })
    }

    pub fn prizes(&self) -> Vec<PrizeResponse> {
        self.catalog.iter().map(PrizeResponse::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PrizeDefinition, SpinRecord, StockCeiling};
    use crate::repository::{MemoryStore, SpinLogStore, StockLevel};
    use chrono::Utc;

    fn catalog() -> Arc<PrizeCatalog> {
        let prize = |id: &str, stock, weight, forced_only| PrizeDefinition {
            id: id.to_string(),
            display_name: format!("{id} prize"),
            stock_ceiling: stock,
            weight,
            forced_only,
        };
        Arc::new(
            PrizeCatalog::new(
                vec![
                    prize("CARD", StockCeiling::Finite(5), 0, true),
                    prize("GIFT", StockCeiling::Finite(1), 0, true),
                    prize("NOTHING", StockCeiling::Unlimited, 100, false),
                ],
                "NOTHING",
            )
            .unwrap(),
        )
    }

    async fn setup() -> (AdminService, Arc<MemoryStore>) {
        let catalog = catalog();
        let store = Arc::new(MemoryStore::default());
        store.seed(&catalog).await.unwrap();
        let stores = Stores::from_memory(store.clone());
        let audit = AuditSink::new(stores.logs.clone());
        (
            AdminService::new(catalog, &stores, audit, "s3cret".into()),
            store,
        )
    }

    #[tokio::test]
    async fn test_verify_secret() {
        let (service, _) = setup().await;
        assert!(service.verify_secret("s3cret").is_ok());
        assert!(matches!(
            service.verify_secret("wrong"),
            Err(AppError::AuthError(_))
        ));

        let empty = AdminService {
            admin_secret: String::new(),
            ..service
        };
        assert!(empty.verify_secret("").is_err());
    }

    #[tokio::test]
    async fn test_lock_unknown_prize_leaves_slot_untouched() {
        let (service, store) = setup().await;
        service.lock("CARD").await.unwrap();

        let err = service.lock("NOPE").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidPrize(_)));
        assert_eq!(store.peek().await.unwrap().as_deref(), Some("CARD"));

        assert!(matches!(
            service.lock("  ").await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_lock_status_and_unlock() {
        let (service, _) = setup().await;
        service.lock("GIFT").await.unwrap();
        assert_eq!(
            service.lock_status().await.unwrap(),
            LockStatusResponse {
                is_locked: true,
                locked_prize_id: Some("GIFT".into())
            }
        );

        service.unlock().await.unwrap();
        service.unlock().await.unwrap();
        assert!(!service.lock_status().await.unwrap().is_locked);
    }

    #[tokio::test]
    async fn test_reset_keeps_history() {
        let (service, store) = setup().await;
        store.try_claim("CARD").await.unwrap();
        store.try_claim("GIFT").await.unwrap();
        store
            .insert(&SpinRecord {
                user_id: "alice".into(),
                prize_id: "CARD".into(),
                prize_name: "CARD prize".into(),
                was_forced: true,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        service.lock("CARD").await.unwrap();

        service.reset().await.unwrap();

        assert!(!service.lock_status().await.unwrap().is_locked);
        assert_eq!(store.read("CARD").await.unwrap(), StockLevel::Remaining(5));
        assert_eq!(store.read("GIFT").await.unwrap(), StockLevel::Remaining(1));
        assert_eq!(service.recent_logs(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_status_lists_limited_prizes() {
        let (service, store) = setup().await;
        store.try_claim("CARD").await.unwrap();

        let status = service.status().await.unwrap();
        assert!(!status.lock.is_locked);
        assert_eq!(
            status.stocks,
            vec![
                StockStatus {
                    prize_id: "CARD".into(),
                    name: "CARD prize".into(),
                    stock: Some(4),
                    max: 5
                },
                StockStatus {
                    prize_id: "GIFT".into(),
                    name: "GIFT prize".into(),
                    stock: Some(1),
                    max: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_stats_and_log_limit() {
        let (service, store) = setup().await;
        for (user, prize) in [("a", "NOTHING"), ("b", "NOTHING"), ("c", "CARD")] {
            store
                .insert(&SpinRecord {
                    user_id: user.into(),
                    prize_id: prize.into(),
                    prize_name: prize.into(),
                    was_forced: prize == "CARD",
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_spins, 3);
        assert_eq!(stats.by_prize[0].prize_id, "NOTHING");
        assert_eq!(stats.by_prize[0].count, 2);

        assert_eq!(service.recent_logs(Some(0)).await.unwrap().len(), 1);
        assert_eq!(service.recent_logs(Some(500)).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_prizes_in_catalog_order() {
        let (service, _) = setup().await;
        let ids: Vec<_> = service.prizes().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["CARD", "GIFT", "NOTHING"]);
    }
}
