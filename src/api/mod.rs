// ==========================================
// 工作坊席位分配系统 - API 层
// ==========================================
// 职责: 提供分配运行与查询接口, 供命令行入口调用
// ==========================================

pub mod allocation_api;
pub mod error;

// 重导出核心类型
pub use allocation_api::AllocationApi;
pub use error::{ApiError, ApiResult};
