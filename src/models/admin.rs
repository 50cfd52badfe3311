use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 指定下一次抽奖结果
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LockRequest {
    #[schema(example = "MK_DUCK")]
    pub prize_id: String,
    pub secret: String,
}

/// 仅需管理员密钥的请求 (unlock / reset)
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminSecretRequest {
    pub secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LockStatusResponse {
    pub is_locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_prize_id: Option<String>,
}

/// 限量奖品库存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StockStatus {
    pub prize_id: String,
    pub name: String,
    /// 当前剩余 (计数器缺失时为 None)
    pub stock: Option<i64>,
    pub max: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminStatusResponse {
    pub lock: LockStatusResponse,
    pub stocks: Vec<StockStatus>,
}

/// 日志查询参数
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SpinLogQuery {
    /// 条数 (默认 50, 最多 100)
    pub limit: Option<u32>,
}
