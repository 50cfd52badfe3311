//! 奖品目录（启动时加载，运行期只读）

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// 与 prize_stocks / forced_outcome 的 prize_id 列宽一致
pub const MAX_PRIZE_ID_LEN: usize = 50;

/// 库存上限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockCeiling {
    Unlimited,
    Finite(i64),
}

impl StockCeiling {
    pub fn as_option(&self) -> Option<i64> {
        match self {
            StockCeiling::Unlimited => None,
            StockCeiling::Finite(n) => Some(*n),
        }
    }
}

/// 奖品定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeDefinition {
    /// 奖品ID (重启后保持不变)
    pub id: String,
    pub display_name: String,
    pub stock_ceiling: StockCeiling,
    /// 随机抽取权重
    pub weight: u32,
    /// 只能通过管理员指定获得
    pub forced_only: bool,
}

impl PrizeDefinition {
    /// 是否参与随机抽取
    pub fn is_eligible(&self) -> bool {
        !self.forced_only
    }

    pub fn is_limited(&self) -> bool {
        matches!(self.stock_ceiling, StockCeiling::Finite(_))
    }
}

#[derive(Debug, Clone)]
pub struct PrizeCatalog {
    prizes: Vec<PrizeDefinition>,
    no_win_index: usize,
}

impl PrizeCatalog {
    /// 校验并创建奖品目录:
    /// - 至少一个奖品, ID 唯一、非空且不超过 50 个字符
    /// - 库存上限不能为负
    /// - 未中奖奖品必须存在且为无限库存
    pub fn new(prizes: Vec<PrizeDefinition>, no_win_id: &str) -> AppResult<Self> {
        if prizes.is_empty() {
            return Err(AppError::ConfigError("Prize catalog is empty".into()));
        }

        let mut seen = HashSet::new();
        for p in &prizes {
            if p.id.trim().is_empty() {
                return Err(AppError::ConfigError("Prize ID must not be empty".into()));
            }
            if p.id.chars().count() > MAX_PRIZE_ID_LEN {
                return Err(AppError::ConfigError(format!(
                    "Prize ID {} exceeds {MAX_PRIZE_ID_LEN} characters",
                    p.id
                )));
            }
            if p.display_name.trim().is_empty() {
                return Err(AppError::ConfigError(format!(
                    "Prize {} has an empty name",
                    p.id
                )));
            }
            if !seen.insert(p.id.as_str()) {
                return Err(AppError::ConfigError(format!("Duplicate prize ID: {}", p.id)));
            }
            if let StockCeiling::Finite(n) = p.stock_ceiling
                && n < 0
            {
                return Err(AppError::ConfigError(format!(
                    "Prize {} has negative stock {n}",
                    p.id
                )));
            }
        }

        let no_win_index = prizes
            .iter()
            .position(|p| p.id == no_win_id)
            .ok_or_else(|| {
                AppError::ConfigError(format!("No-win prize {no_win_id} is not in the catalog"))
            })?;
        if prizes[no_win_index].is_limited() {
            return Err(AppError::ConfigError(format!(
                "No-win prize {no_win_id} must have unlimited stock"
            )));
        }

        let catalog = Self {
            prizes,
            no_win_index,
        };

        if catalog.eligible_weight() == 0 {
            log::warn!(
                "Prize catalog has no random-eligible weight; every unforced spin returns {no_win_id}"
            );
        }

        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&PrizeDefinition> {
        self.prizes.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// 按配置顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &PrizeDefinition> {
        self.prizes.iter()
    }

    pub fn len(&self) -> usize {
        self.prizes.len()
    }

    /// 参与随机抽取的奖品（保持配置顺序）
    pub fn eligible(&self) -> impl Iterator<Item = &PrizeDefinition> {
        self.prizes.iter().filter(|p| p.is_eligible())
    }

    pub fn eligible_weight(&self) -> u64 {
        self.eligible().map(|p| u64::from(p.weight)).sum()
    }

    /// 有限库存奖品及其上限
    pub fn finite(&self) -> impl Iterator<Item = (&PrizeDefinition, i64)> {
        self.prizes.iter().filter_map(|p| match p.stock_ceiling {
            StockCeiling::Finite(n) => Some((p, n)),
            StockCeiling::Unlimited => None,
        })
    }

    pub fn no_win(&self) -> &PrizeDefinition {
        &self.prizes[self.no_win_index]
    }
}

/// 奖品信息（管理后台展示）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrizeResponse {
    pub id: String,
    pub name: String,
    /// 库存上限 (None = 无限)
    pub stock: Option<i64>,
    pub weight: u32,
    pub forced_only: bool,
}

impl From<&PrizeDefinition> for PrizeResponse {
    fn from(p: &PrizeDefinition) -> Self {
        PrizeResponse {
            id: p.id.clone(),
            name: p.display_name.clone(),
            stock: p.stock_ceiling.as_option(),
            weight: p.weight,
            forced_only: p.forced_only,
        }
    }
}
