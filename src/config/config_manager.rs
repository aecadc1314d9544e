// ==========================================
// 工作坊席位分配系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::allocation_config_trait::AllocationConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取并解析配置值，缺失或格式错误时回落默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr + Copy,
    {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }
}

// ==========================================
// AllocationConfigReader Trait 实现
// ==========================================
#[async_trait]
impl AllocationConfigReader for ConfigManager {
    async fn get_first_time_bonus(&self) -> ConfigResult<f64> {
        self.get_parsed_or_default(config_keys::FIRST_TIME_BONUS, 100.0)
    }

    async fn get_absenteeism_weight(&self) -> ConfigResult<f64> {
        self.get_parsed_or_default(config_keys::ABSENTEEISM_WEIGHT, 10.0)
    }

    async fn get_won_edition_penalty(&self) -> ConfigResult<f64> {
        self.get_parsed_or_default(config_keys::WON_EDITION_PENALTY, 20.0)
    }

    async fn get_tie_break_range(&self) -> ConfigResult<f64> {
        let value: f64 = self.get_parsed_or_default(config_keys::TIE_BREAK_RANGE, 10.0)?;
        // 非正数或非有限值会破坏决胜项的取值区间
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Ok(10.0)
        }
    }

    async fn get_equity_max_editions(&self) -> ConfigResult<i32> {
        self.get_parsed_or_default(config_keys::EQUITY_MAX_EDITIONS, 2)
    }

    async fn get_rejection_sample_size(&self) -> ConfigResult<usize> {
        self.get_parsed_or_default(config_keys::REJECTION_SAMPLE_SIZE, 15)
    }

    async fn get_seed(&self) -> ConfigResult<u64> {
        self.get_parsed_or_default(config_keys::SEED, 0)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 评分
    pub const FIRST_TIME_BONUS: &str = "allocation.first_time_bonus";
    pub const ABSENTEEISM_WEIGHT: &str = "allocation.absenteeism_weight";
    pub const WON_EDITION_PENALTY: &str = "allocation.won_edition_penalty";
    pub const TIE_BREAK_RANGE: &str = "allocation.tie_break_range";

    // 公平节流
    pub const EQUITY_MAX_EDITIONS: &str = "allocation.equity_max_editions";

    // 报表
    pub const REJECTION_SAMPLE_SIZE: &str = "allocation.rejection_sample_size";

    // 决胜项种子
    pub const SEED: &str = "allocation.seed";
}
