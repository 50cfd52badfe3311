use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    FromQueryResult, Insert, QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};

use super::{ForcedOutcomeSlot, SpinLogStore, StockLedger, StockLevel};
use crate::entities::{
    forced_outcome_entity as forced, prize_stock_entity as stocks, spin_log_entity as logs,
};
use crate::error::AppResult;
use crate::models::{PrizeCatalog, PrizeCount, SpinLog, SpinRecord};

const ADJUST_STOCK_SQL: &str = "UPDATE prize_stocks SET stock = stock + $1, updated_at = NOW() \
     WHERE prize_id = $2 RETURNING stock";

const TAKE_FORCED_SQL: &str = "DELETE FROM forced_outcome WHERE id = $1 RETURNING prize_id";

/// PostgreSQL 存储
///
/// 扣减 / 补偿 / 取走指定均为单条语句 (`UPDATE .. RETURNING` / `DELETE .. RETURNING`),
/// 由数据库保证原子性。
pub struct PgStore {
    pool: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct PrizeCountRow {
    prize_id: String,
    count: i64,
}

impl PgStore {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    fn stock_model(prize_id: &str, ceiling: i64) -> stocks::ActiveModel {
        stocks::ActiveModel {
            prize_id: Set(prize_id.to_string()),
            stock: Set(ceiling),
            ceiling: Set(ceiling),
            updated_at: Set(Utc::now()),
        }
    }

    /// 已有计数器保留剩余库存, 但不超过新的上限
    fn stock_upsert(finite: &[(String, i64)]) -> Insert<stocks::ActiveModel> {
        stocks::Entity::insert_many(
            finite
                .iter()
                .map(|(id, ceiling)| Self::stock_model(id, *ceiling)),
        )
        .on_conflict(
            OnConflict::column(stocks::Column::PrizeId)
                .update_column(stocks::Column::Ceiling)
                .value(
                    stocks::Column::Stock,
                    Expr::cust("LEAST(prize_stocks.stock, EXCLUDED.ceiling)"),
                )
                .to_owned(),
        )
    }

    /// 对计数器做 +delta, 返回更新后的值 (无计数器返回 None)
    async fn adjust_stock(&self, prize_id: &str, delta: i64) -> AppResult<Option<i64>> {
        let row = self
            .pool
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                ADJUST_STOCK_SQL,
                [delta.into(), prize_id.into()],
            ))
            .await?;

        match row {
            Some(r) => Ok(Some(r.try_get::<i64>("", "stock")?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StockLedger for PgStore {
    async fn try_claim(&self, prize_id: &str) -> AppResult<StockLevel> {
        Ok(match self.adjust_stock(prize_id, -1).await? {
            Some(n) => StockLevel::Remaining(n),
            None => StockLevel::Unlimited,
        })
    }

    async fn release(&self, prize_id: &str) -> AppResult<()> {
        if self.adjust_stock(prize_id, 1).await?.is_none() {
            log::warn!("Release on prize {prize_id} without a stock counter");
        }
        Ok(())
    }

    async fn read(&self, prize_id: &str) -> AppResult<StockLevel> {
        let model = stocks::Entity::find_by_id(prize_id.to_string())
            .one(&self.pool)
            .await?;
        Ok(match model {
            Some(m) => StockLevel::Remaining(m.stock),
            None => StockLevel::Unlimited,
        })
    }

    async fn seed(&self, catalog: &PrizeCatalog) -> AppResult<()> {
        let finite: Vec<(String, i64)> = catalog
            .finite()
            .map(|(p, ceiling)| (p.id.clone(), ceiling))
            .collect();
        let ids: Vec<String> = finite.iter().map(|(id, _)| id.clone()).collect();

        let txn = self.pool.begin().await?;

        // 不再限量的奖品: 删除计数器, 恢复为无限库存
        let removed = stocks::Entity::delete_many()
            .filter(stocks::Column::PrizeId.is_not_in(ids))
            .exec(&txn)
            .await?;
        if removed.rows_affected > 0 {
            log::info!(
                "Removed {} stale stock counters",
                removed.rows_affected
            );
        }

        if !finite.is_empty() {
            Self::stock_upsert(&finite)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(())
    }

    async fn reset_all(&self, catalog: &PrizeCatalog) -> AppResult<()> {
        let txn = self.pool.begin().await?;

        forced::Entity::delete_many().exec(&txn).await?;

        for (prize, ceiling) in catalog.finite() {
            stocks::Entity::insert(Self::stock_model(&prize.id, ceiling))
                .on_conflict(
                    OnConflict::column(stocks::Column::PrizeId)
                        .update_columns([
                            stocks::Column::Stock,
                            stocks::Column::Ceiling,
                            stocks::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ForcedOutcomeSlot for PgStore {
    async fn set(&self, prize_id: &str) -> AppResult<()> {
        forced::Entity::insert(forced::ActiveModel {
            id: Set(forced::SLOT_ID),
            prize_id: Set(prize_id.to_string()),
            locked_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::column(forced::Column::Id)
                .update_columns([forced::Column::PrizeId, forced::Column::LockedAt])
                .to_owned(),
        )
        .exec_without_returning(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        forced::Entity::delete_many().exec(&self.pool).await?;
        Ok(())
    }

    async fn take(&self) -> AppResult<Option<String>> {
        let row = self
            .pool
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                TAKE_FORCED_SQL,
                [forced::SLOT_ID.into()],
            ))
            .await?;

        match row {
            Some(r) => Ok(Some(r.try_get::<String>("", "prize_id")?)),
            None => Ok(None),
        }
    }

    async fn peek(&self) -> AppResult<Option<String>> {
        let model = forced::Entity::find_by_id(forced::SLOT_ID)
            .one(&self.pool)
            .await?;
        Ok(model.map(|m| m.prize_id))
    }
}

#[async_trait]
impl SpinLogStore for PgStore {
    async fn insert(&self, record: &SpinRecord) -> AppResult<()> {
        logs::ActiveModel {
            user_id: Set(record.user_id.clone()),
            prize_id: Set(record.prize_id.clone()),
            prize_name: Set(record.prize_name.clone()),
            was_forced: Set(record.was_forced),
            created_at: Set(record.created_at),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent(&self, limit: u64) -> AppResult<Vec<SpinLog>> {
        let list = logs::Entity::find()
            .order_by_desc(logs::Column::CreatedAt)
            .order_by_desc(logs::Column::Id)
            .limit(limit)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    async fn count_by_prize(&self) -> AppResult<Vec<PrizeCount>> {
        let rows = logs::Entity::find()
            .select_only()
            .column(logs::Column::PrizeId)
            .column_as(Expr::cust("COUNT(*)"), "count")
            .group_by(logs::Column::PrizeId)
            .order_by_desc(Expr::cust("count"))
            .order_by_asc(logs::Column::PrizeId)
            .into_model::<PrizeCountRow>()
            .all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| PrizeCount {
                prize_id: r.prize_id,
                count: r.count,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, QueryTrait, Transaction, Value};
    use std::collections::BTreeMap;

    fn row(column: &str, value: Value) -> BTreeMap<String, Value> {
        BTreeMap::from([(column.to_string(), value)])
    }

    #[tokio::test]
    async fn test_try_claim_decrements_in_one_statement() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row("stock", 4i64.into())]])
            .append_query_results([Vec::<BTreeMap<String, Value>>::new()])
            .into_connection();
        let store = PgStore::new(db);

        assert_eq!(
            store.try_claim("CARD").await.unwrap(),
            StockLevel::Remaining(4)
        );
        assert_eq!(
            store.try_claim("NOTHING").await.unwrap(),
            StockLevel::Unlimited
        );

        assert_eq!(
            store.pool.into_transaction_log(),
            vec![
                Transaction::from_sql_and_values(
                    DatabaseBackend::Postgres,
                    ADJUST_STOCK_SQL,
                    [(-1i64).into(), "CARD".into()],
                ),
                Transaction::from_sql_and_values(
                    DatabaseBackend::Postgres,
                    ADJUST_STOCK_SQL,
                    [(-1i64).into(), "NOTHING".into()],
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_release_increments() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row("stock", 0i64.into())]])
            .into_connection();
        let store = PgStore::new(db);

        store.release("CARD").await.unwrap();

        assert_eq!(
            store.pool.into_transaction_log(),
            vec![Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                ADJUST_STOCK_SQL,
                [1i64.into(), "CARD".into()],
            )]
        );
    }

    #[tokio::test]
    async fn test_take_deletes_slot_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row("prize_id", "CARD".into())]])
            .append_query_results([Vec::<BTreeMap<String, Value>>::new()])
            .into_connection();
        let store = PgStore::new(db);

        assert_eq!(store.take().await.unwrap().as_deref(), Some("CARD"));
        assert_eq!(store.take().await.unwrap(), None);

        let take = Transaction::from_sql_and_values(
            DatabaseBackend::Postgres,
            TAKE_FORCED_SQL,
            [forced::SLOT_ID.into()],
        );
        assert_eq!(store.pool.into_transaction_log(), vec![take.clone(), take]);
    }

    #[test]
    fn test_seed_upsert_clamps_to_ceiling() {
        let sql = PgStore::stock_upsert(&[("CARD".to_string(), 1)])
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.starts_with(r#"INSERT INTO "prize_stocks""#));
        assert!(sql.contains(r#"ON CONFLICT ("prize_id") DO UPDATE"#));
        assert!(sql.contains(r#""ceiling" = "excluded"."ceiling""#));
        assert!(sql.contains(r#""stock" = LEAST(prize_stocks.stock, EXCLUDED.ceiling)"#));
    }
}
