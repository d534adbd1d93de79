// ==========================================
// 口服固体制剂排班优化系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把仓储/引擎/配置错误转换为用户可读的错误消息
// 不可行属于正常业务结果，单独成类，调用方据此提示用户调整参数
// ==========================================

use crate::engine::error::PlanningError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 排班不可行（工序不可行 / 周期上限内无解 / 无可行批次）
    #[error("排班不可行: {0}")]
    Infeasible(#[source] PlanningError),

    // ==========================================
    // 基础设施错误
    // ==========================================
    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("导出失败: {0}")]
    ExportError(String),

    #[error("序列化失败: {0}")]
    SerializationError(String),
}

// ==========================================
// 从 PlanningError 转换
// ==========================================
impl From<PlanningError> for ApiError {
    fn from(err: PlanningError) -> Self {
        match err {
            PlanningError::InvalidParameter(msg) => ApiError::InvalidInput(msg),
            PlanningError::MissingStageCatalog(stage) => {
                ApiError::ConfigError(format!("未配置工序 {} 的产能目录", stage))
            }
            other => ApiError::Infeasible(other),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::SerializationError(e) => ApiError::SerializationError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        ApiError::ExportError(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::ExportError(err.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::DatabaseConnectionError(err.to_string())
    }
}

impl ApiError {
    /// 配置层返回 Box<dyn Error>，统一折算为配置错误
    pub fn config(err: Box<dyn std::error::Error>) -> Self {
        ApiError::ConfigError(err.to_string())
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, ApiError::Infeasible(_))
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::StageKind;

    #[test]
    fn test_planning_error_mapping() {
        let invalid: ApiError = PlanningError::InvalidParameter("排产周期至少为 1 天".into()).into();
        assert!(matches!(invalid, ApiError::InvalidInput(_)));

        let exhausted: ApiError = PlanningError::HorizonExhausted {
            total_batches: 10_000,
            last_workdays: 366,
            ceiling_days: 365,
        }
        .into();
        assert!(exhausted.is_infeasible());

        let missing: ApiError = PlanningError::MissingStageCatalog(StageKind::Coating).into();
        assert!(matches!(missing, ApiError::ConfigError(_)));
    }

    #[test]
    fn test_repository_not_found_mapping() {
        let err: ApiError = RepositoryError::NotFound {
            entity: "PlanningScenario".into(),
            id: "abc".into(),
        }
        .into();
        match err {
            ApiError::NotFound(msg) => assert!(msg.contains("abc")),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
