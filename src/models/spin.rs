use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::spin_log_entity;
use crate::error::{AppError, AppResult};

use super::PrizeDefinition;

const MAX_USER_ID_LEN: usize = 255;

/// 抽奖请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SpinRequest {
    /// 用户标识 (兼容旧字段 instagram_id)
    #[serde(alias = "instagram_id")]
    #[schema(example = "lucky.user")]
    pub user_id: String,
}

impl SpinRequest {
    /// 返回去除首尾空白后的用户标识
    pub fn validated_user_id(&self) -> AppResult<&str> {
        let user_id = self.user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::ValidationError("User ID is required".into()));
        }
        if user_id.chars().count() > MAX_USER_ID_LEN {
            return Err(AppError::ValidationError(format!(
                "User ID must be at most {MAX_USER_ID_LEN} characters"
            )));
        }
        Ok(user_id)
    }
}

/// 抽奖结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SpinOutcome {
    pub prize_id: String,
    pub prize_name: String,
    /// 是否来自管理员指定
    pub was_forced: bool,
}

impl SpinOutcome {
    pub fn new(prize: &PrizeDefinition, was_forced: bool) -> Self {
        SpinOutcome {
            prize_id: prize.id.clone(),
            prize_name: prize.display_name.clone(),
            was_forced,
        }
    }
}

/// 待写入的审计记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinRecord {
    pub user_id: String,
    pub prize_id: String,
    pub prize_name: String,
    pub was_forced: bool,
    pub created_at: DateTime<Utc>,
}

impl SpinRecord {
    pub fn new(user_id: &str, outcome: &SpinOutcome, created_at: DateTime<Utc>) -> Self {
        SpinRecord {
            user_id: user_id.to_string(),
            prize_id: outcome.prize_id.clone(),
            prize_name: outcome.prize_name.clone(),
            was_forced: outcome.was_forced,
            created_at,
        }
    }
}

/// 已落库的抽奖日志
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpinLog {
    pub id: i64,
    pub user_id: String,
    pub prize_id: String,
    pub prize_name: String,
    pub was_forced: bool,
    pub created_at: DateTime<Utc>,
}

impl From<spin_log_entity::Model> for SpinLog {
    fn from(m: spin_log_entity::Model) -> Self {
        SpinLog {
            id: m.id,
            user_id: m.user_id,
            prize_id: m.prize_id,
            prize_name: m.prize_name,
            was_forced: m.was_forced,
            created_at: m.created_at,
        }
    }
}

/// 按奖品统计的中奖次数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PrizeCount {
    pub prize_id: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpinStatsResponse {
    pub total_spins: i64,
    /// 按次数倒序
    pub by_prize: Vec<PrizeCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_is_trimmed() {
        let req = SpinRequest {
            user_id: "  someone  ".into(),
        };
        assert_eq!(req.validated_user_id().unwrap(), "someone");
    }

    #[test]
    fn test_blank_user_id_rejected() {
        let req = SpinRequest {
            user_id: "   ".into(),
        };
        assert!(matches!(
            req.validated_user_id(),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_overlong_user_id_rejected() {
        let req = SpinRequest {
            user_id: "x".repeat(MAX_USER_ID_LEN + 1),
        };
        assert!(req.validated_user_id().is_err());
    }

    #[test]
    fn test_instagram_id_alias() {
        let req: SpinRequest = serde_json::from_str(r#"{"instagram_id":"ig_user"}"#).unwrap();
        assert_eq!(req.user_id, "ig_user");
    }
}
