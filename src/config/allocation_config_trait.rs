// ==========================================
// 工作坊席位分配系统 - 分配配置读取 Trait
// ==========================================
// 职责: 定义分配引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;

// ==========================================
// AllocationConfig - 引擎参数
// ==========================================
// 默认值即评分公式 / 公平节流的字面常量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationConfig {
    pub first_time_bonus: f64,       // 首次参与加成
    pub absenteeism_weight: f64,     // 缺勤率权重
    pub won_edition_penalty: f64,    // 本轮已获场次惩罚（每场）
    pub tie_break_range: f64,        // 决胜项取值范围 [0, range)
    pub equity_max_editions: i32,    // 公平节流阈值（已获场次数）
    pub rejection_sample_size: usize, // 报表拒绝样本上限
    pub seed: u64,                   // 决胜项种子
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            first_time_bonus: 100.0,
            absenteeism_weight: 10.0,
            won_edition_penalty: 20.0,
            tie_break_range: 10.0,
            equity_max_editions: 2,
            rejection_sample_size: 15,
            seed: 0,
        }
    }
}

// ==========================================
// AllocationConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait AllocationConfigReader: Send + Sync {
    /// 首次参与加成（默认 100）
    async fn get_first_time_bonus(&self) -> Result<f64, Box<dyn Error + Send + Sync>>;

    /// 缺勤率权重（默认 10）
    async fn get_absenteeism_weight(&self) -> Result<f64, Box<dyn Error + Send + Sync>>;

    /// 已获场次惩罚（默认 20）
    async fn get_won_edition_penalty(&self) -> Result<f64, Box<dyn Error + Send + Sync>>;

    /// 决胜项范围（默认 10）
    async fn get_tie_break_range(&self) -> Result<f64, Box<dyn Error + Send + Sync>>;

    /// 公平节流阈值（默认 2）
    async fn get_equity_max_editions(&self) -> Result<i32, Box<dyn Error + Send + Sync>>;

    /// 拒绝样本上限（默认 15）
    async fn get_rejection_sample_size(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// 决胜项种子（默认 0）
    async fn get_seed(&self) -> Result<u64, Box<dyn Error + Send + Sync>>;

    /// 组装完整引擎参数
    async fn load_allocation_config(
        &self,
    ) -> Result<AllocationConfig, Box<dyn Error + Send + Sync>> {
        Ok(AllocationConfig {
            first_time_bonus: self.get_first_time_bonus().await?,
            absenteeism_weight: self.get_absenteeism_weight().await?,
            won_edition_penalty: self.get_won_edition_penalty().await?,
            tie_break_range: self.get_tie_break_range().await?,
            equity_max_editions: self.get_equity_max_editions().await?,
            rejection_sample_size: self.get_rejection_sample_size().await?,
            seed: self.get_seed().await?,
        })
    }
}
