// ==========================================
// 工作坊席位分配系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 转换Repository错误为调用方可处理的错误
// 说明: 约束拒绝与数据告警是报表中的值, 不在此处出现
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 并发控制错误
    // ==========================================
    /// 该周期已存在有效分配且未指定强制重跑（未做任何写入）
    #[error("并发冲突: period_id={period_id} 已存在 {existing} 条有效分配, 需指定 force 才能重跑")]
    ConcurrencyConflict { period_id: String, existing: i64 },

    // ==========================================
    // 前置条件错误
    // ==========================================
    #[error("报名周期不存在: {0}")]
    PeriodNotFound(String),

    #[error("报名周期不在分配阶段: period_id={period_id}, phase={phase}")]
    InvalidPhase { period_id: String, phase: String },

    #[error("报名周期未激活: period_id={period_id}, status={status}")]
    PeriodInactive { period_id: String, status: String },

    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 基础设施错误（整轮已回滚, 可安全重试）
    // ==========================================
    #[error("分配运行失败并已回滚: period_id={period_id}: {source}")]
    Infrastructure {
        period_id: String,
        #[source]
        source: RepositoryError,
    },

    #[error("配置读取失败: {0}")]
    Config(String),

    #[error("数据访问失败: {0}")]
    Repository(#[from] RepositoryError),

    #[error("报表导出失败: {0}")]
    Export(String),
}

impl ApiError {
    /// 包装为带周期上下文的基础设施错误
    pub fn infrastructure(period_id: &str, source: impl Into<RepositoryError>) -> Self {
        ApiError::Infrastructure {
            period_id: period_id.to_string(),
            source: source.into(),
        }
    }

    /// 是否可原样重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Infrastructure { .. })
    }
}

/// API层Result类型别名
pub type ApiResult<T> = Result<T, ApiError>;
