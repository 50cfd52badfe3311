use sea_orm_migration::prelude::*;

/// Spin Logs (抽奖审计日志, 只追加)
#[derive(DeriveIden)]
enum SpinLogs {
    Table,
    Id,
    UserId,
    PrizeId,
    PrizeName,
    WasForced,
    CreatedAt,
}

/// Prize Stocks (限量奖品库存计数器)
#[derive(DeriveIden)]
enum PrizeStocks {
    Table,
    PrizeId,
    Stock,
    Ceiling,
    UpdatedAt,
}

/// Forced Outcome (管理员指定的下一次结果, 单行)
#[derive(DeriveIden)]
enum ForcedOutcome {
    Table,
    Id,
    PrizeId,
    LockedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 库存计数器只为有限库存奖品创建, 没有行即表示无限库存。
/// 计数器的初始值由服务启动时根据奖品配置写入, 迁移中不预置数据。
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 抽奖日志表
        manager
            .create_table(
                Table::create()
                    .table(SpinLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SpinLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SpinLogs::UserId).string_len(255).not_null())
                    .col(ColumnDef::new(SpinLogs::PrizeId).string_len(50).not_null())
                    .col(
                        ColumnDef::new(SpinLogs::PrizeName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SpinLogs::WasForced)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SpinLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_spin_logs_user")
                    .table(SpinLogs::Table)
                    .col(SpinLogs::UserId)
                    .to_owned(),
            )
            .await?;

        // 最近记录查询按时间倒序
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_spin_logs_created_at")
                    .table(SpinLogs::Table)
                    .col((SpinLogs::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        // 库存计数器表
        manager
            .create_table(
                Table::create()
                    .table(PrizeStocks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PrizeStocks::PrizeId)
                            .string_len(50)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PrizeStocks::Stock).big_integer().not_null())
                    .col(
                        ColumnDef::new(PrizeStocks::Ceiling)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PrizeStocks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 指定结果表: 只允许 id = 1 一行
        manager
            .create_table(
                Table::create()
                    .table(ForcedOutcome::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForcedOutcome::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            .check(Expr::col(ForcedOutcome::Id).eq(1)),
                    )
                    .col(
                        ColumnDef::new(ForcedOutcome::PrizeId)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ForcedOutcome::LockedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(ForcedOutcome::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(PrizeStocks::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(SpinLogs::Table).to_owned())
            .await?;

        Ok(())
    }
}
