// ==========================================
// 工作坊席位分配系统 - 领域类型定义
// ==========================================
// 职责: 阶段/星期/分配状态/拒绝原因等枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 报名周期阶段 (Enrollment Phase)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentPhase {
    Requests,    // 学校提交申请
    Allocation,  // 中央分配
    Publication, // 结果公示
    Execution,   // 工作坊执行
}

impl fmt::Display for EnrollmentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl EnrollmentPhase {
    /// 从字符串解析阶段（未知值返回 None）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "REQUESTS" => Some(EnrollmentPhase::Requests),
            "ALLOCATION" => Some(EnrollmentPhase::Allocation),
            "PUBLICATION" => Some(EnrollmentPhase::Publication),
            "EXECUTION" => Some(EnrollmentPhase::Execution),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EnrollmentPhase::Requests => "REQUESTS",
            EnrollmentPhase::Allocation => "ALLOCATION",
            EnrollmentPhase::Publication => "PUBLICATION",
            EnrollmentPhase::Execution => "EXECUTION",
        }
    }
}

// ==========================================
// 星期 (Day Of Week)
// ==========================================
// 场次只在周二或周四举行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Tuesday,
    Thursday,
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl DayOfWeek {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "TUESDAY" => Some(DayOfWeek::Tuesday),
            "THURSDAY" => Some(DayOfWeek::Thursday),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            DayOfWeek::Tuesday => "TUESDAY",
            DayOfWeek::Thursday => "THURSDAY",
        }
    }
}

// ==========================================
// 分配状态 (Allocation Status)
// ==========================================
// PROVISIONAL/PUBLISHED/ACCEPTED 视为"有效代"，重跑守卫据此判断
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationStatus {
    Provisional, // 临时（算法刚产出）
    Published,   // 已公示
    Accepted,    // 学校已确认
    Rejected,    // 学校已放弃
}

impl fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl AllocationStatus {
    /// 有效状态集合（用于重跑守卫）
    pub const ACTIVE: [AllocationStatus; 3] = [
        AllocationStatus::Provisional,
        AllocationStatus::Published,
        AllocationStatus::Accepted,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PROVISIONAL" => Some(AllocationStatus::Provisional),
            "PUBLISHED" => Some(AllocationStatus::Published),
            "ACCEPTED" => Some(AllocationStatus::Accepted),
            "REJECTED" => Some(AllocationStatus::Rejected),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AllocationStatus::Provisional => "PROVISIONAL",
            AllocationStatus::Published => "PUBLISHED",
            AllocationStatus::Accepted => "ACCEPTED",
            AllocationStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }
}

// ==========================================
// 约束拒绝原因 (Rejection Reason)
// ==========================================
// 红线: 拒绝只记录, 不抛错, 不中断本轮运行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    DayUnavailable,   // 学校周二不可用
    EditionFull,      // 场次已满
    SchoolCapReached, // 单校上限已满
    AwaitingEquity,   // 公平节流（第一轮）
    NoSeatsAvailable, // 可授予席位为 0
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl RejectionReason {
    /// 报表中使用的原因代码
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::DayUnavailable => "DAY_UNAVAILABLE",
            RejectionReason::EditionFull => "EDITION_FULL",
            RejectionReason::SchoolCapReached => "SCHOOL_CAP_REACHED",
            RejectionReason::AwaitingEquity => "AWAITING_EQUITY",
            RejectionReason::NoSeatsAvailable => "NO_SEATS_AVAILABLE",
        }
    }

    /// 人类可读说明
    pub fn describe(&self) -> &'static str {
        match self {
            RejectionReason::DayUnavailable => "day unavailable",
            RejectionReason::EditionFull => "edition full",
            RejectionReason::SchoolCapReached => "school cap reached",
            RejectionReason::AwaitingEquity => "awaiting equity",
            RejectionReason::NoSeatsAvailable => "no seats available",
        }
    }
}

// ==========================================
// 分配轮次 (Assignment Pass)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentPass {
    First,  // 按优先级分层评分
    Second, // 空缺回填（关闭公平节流）
}

impl AssignmentPass {
    pub fn is_second(&self) -> bool {
        matches!(self, AssignmentPass::Second)
    }
}

// ==========================================
// 教师角色与来源
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeacherRole {
    Accompanying, // 随行教师
}

impl TeacherRole {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ACCOMPANYING" => Some(TeacherRole::Accompanying),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            TeacherRole::Accompanying => "ACCOMPANYING",
        }
    }
}

/// 教师绑定的产生步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentSource {
    Preference,       // 步骤A: 偏好驱动
    DeclaredList,     // 步骤B: 申报名单顺序
    CoverageFallback, // 步骤C: 覆盖兜底
}

impl fmt::Display for AssignmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl AssignmentSource {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PREFERENCE" => Some(AssignmentSource::Preference),
            "DECLARED_LIST" => Some(AssignmentSource::DeclaredList),
            "COVERAGE_FALLBACK" => Some(AssignmentSource::CoverageFallback),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AssignmentSource::Preference => "PREFERENCE",
            AssignmentSource::DeclaredList => "DECLARED_LIST",
            AssignmentSource::CoverageFallback => "COVERAGE_FALLBACK",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_parse_is_case_insensitive() {
        assert_eq!(EnrollmentPhase::parse("allocation"), Some(EnrollmentPhase::Allocation));
        assert_eq!(EnrollmentPhase::parse("CLOSED"), None);
    }

    #[test]
    fn test_active_statuses() {
        assert!(AllocationStatus::Provisional.is_active());
        assert!(AllocationStatus::Accepted.is_active());
        assert!(!AllocationStatus::Rejected.is_active());
    }

    #[test]
    fn test_rejection_codes() {
        assert_eq!(RejectionReason::AwaitingEquity.code(), "AWAITING_EQUITY");
        assert_eq!(RejectionReason::DayUnavailable.describe(), "day unavailable");
    }
}
