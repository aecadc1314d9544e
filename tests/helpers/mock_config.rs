// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================
#![allow(dead_code)]

use async_trait::async_trait;
use std::error::Error;
use workshop_allocation::config::{AllocationConfig, AllocationConfigReader};

/// Mock 配置结构
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub inner: AllocationConfig,
}

impl MockConfig {
    /// 指定决胜项种子
    pub fn with_seed(seed: u64) -> Self {
        Self {
            inner: AllocationConfig {
                seed,
                ..AllocationConfig::default()
            },
        }
    }

    /// 指定公平节流阈值
    pub fn with_equity_max(equity_max_editions: i32) -> Self {
        Self {
            inner: AllocationConfig {
                equity_max_editions,
                ..AllocationConfig::default()
            },
        }
    }
}

#[async_trait]
impl AllocationConfigReader for MockConfig {
    async fn get_first_time_bonus(&self) -> Result<f64, Box<dyn Error + Send + Sync>> {
        Ok(self.inner.first_time_bonus)
    }

    async fn get_absenteeism_weight(&self) -> Result<f64, Box<dyn Error + Send + Sync>> {
        Ok(self.inner.absenteeism_weight)
    }

    async fn get_won_edition_penalty(&self) -> Result<f64, Box<dyn Error + Send + Sync>> {
        Ok(self.inner.won_edition_penalty)
    }

    async fn get_tie_break_range(&self) -> Result<f64, Box<dyn Error + Send + Sync>> {
        Ok(self.inner.tie_break_range)
    }

    async fn get_equity_max_editions(&self) -> Result<i32, Box<dyn Error + Send + Sync>> {
        Ok(self.inner.equity_max_editions)
    }

    async fn get_rejection_sample_size(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        Ok(self.inner.rejection_sample_size)
    }

    async fn get_seed(&self) -> Result<u64, Box<dyn Error + Send + Sync>> {
        Ok(self.inner.seed)
    }
}

/// 总是失败的配置源
#[derive(Debug, Clone, Default)]
pub struct FailingConfig;

#[async_trait]
impl AllocationConfigReader for FailingConfig {
    async fn get_first_time_bonus(&self) -> Result<f64, Box<dyn Error + Send + Sync>> {
        Err("config store offline".into())
    }

    async fn get_absenteeism_weight(&self) -> Result<f64, Box<dyn Error + Send + Sync>> {
        Err("config store offline".into())
    }

    async fn get_won_edition_penalty(&self) -> Result<f64, Box<dyn Error + Send + Sync>> {
        Err("config store offline".into())
    }

    async fn get_tie_break_range(&self) -> Result<f64, Box<dyn Error + Send + Sync>> {
        Err("config store offline".into())
    }

    async fn get_equity_max_editions(&self) -> Result<i32, Box<dyn Error + Send + Sync>> {
        Err("config store offline".into())
    }

    async fn get_rejection_sample_size(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        Err("config store offline".into())
    }

    async fn get_seed(&self) -> Result<u64, Box<dyn Error + Send + Sync>> {
        Err("config store offline".into())
    }
}
