// ==========================================
// 工作坊席位分配系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 报名周期内的工作坊席位集中分配
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 分配规则（纯计算, 不含 SQL）
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AllocationStatus, AssignmentPass, AssignmentSource, DayOfWeek, EnrollmentPhase,
    RejectionReason, TeacherRole,
};

// 领域实体
pub use domain::{
    Allocation, AllocationSnapshot, EnrollmentPeriod, Request, RequestItem, School,
    TeacherAssignment, WorkshopEdition,
};

// 引擎
pub use engine::{AllocationEngine, AllocationOutcome, AllocationReport};

// 配置
pub use config::{AllocationConfig, AllocationConfigReader, ConfigManager};

// API
pub use api::{AllocationApi, ApiError, ApiResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "工作坊席位分配系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
