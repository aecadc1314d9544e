// ==========================================
// 工作坊席位分配系统 - 报名周期 / 学校 / 场次
// ==========================================
// 职责: 分配运行所读取的主数据实体
// 红线: 运行期间只读
// ==========================================

use crate::domain::types::{DayOfWeek, EnrollmentPhase};
use serde::{Deserialize, Serialize};

// ==========================================
// EnrollmentPeriod - 报名周期
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentPeriod {
    pub id: String,
    pub name: String,
    pub phase: EnrollmentPhase, // 当前阶段
    pub status: String,         // ACTIVE / CLOSED ...
}

impl EnrollmentPeriod {
    pub const STATUS_ACTIVE: &'static str = "ACTIVE";

    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case(Self::STATUS_ACTIVE)
    }
}

// ==========================================
// School - 学校
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub id: String,
    pub name: String,
    pub code: String,
    pub is_first_time_participant: bool, // 首次参与（评分加成）
}

// ==========================================
// WorkshopEdition - 工作坊场次
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkshopEdition {
    pub id: String,
    pub workshop_title: String,
    pub day_of_week: DayOfWeek,
    pub total_capacity: i32, // 总容量 (> 0)
    pub max_per_school: i32, // 单校上限（通常 4）
}
