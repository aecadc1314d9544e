// ==========================================
// 工作坊席位分配系统 - 配置层
// ==========================================
// 职责: 引擎参数加载, 缺失项回落默认值
// 存储: config_kv 表
// ==========================================

pub mod allocation_config_trait;
pub mod config_manager;

// 重导出核心配置管理器
pub use allocation_config_trait::{AllocationConfig, AllocationConfigReader};
pub use config_manager::{config_keys, ConfigManager};
