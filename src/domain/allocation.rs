// ==========================================
// 工作坊席位分配系统 - 分配结果领域模型
// ==========================================
// 职责: 引擎输出（候选分配 / 拒绝记录 / 教师绑定 / 学生名单 / 数据告警）
//       以及落库后的分配记录
// ==========================================

use crate::domain::types::{
    AllocationStatus, AssignmentPass, AssignmentSource, RejectionReason, TeacherRole,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// SeatGrant - 单次 try_assign 成功授予
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatGrant {
    pub item_id: String,
    pub request_id: String,
    pub edition_id: String,
    pub school_id: String,
    pub seats: i32,
    pub pass: AssignmentPass,
}

// ==========================================
// AllocationCandidate - 候选分配（每个 场次×学校 一条）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationCandidate {
    pub edition_id: String,
    pub school_id: String,
    pub assigned_seats: i32,       // 1..=max_per_school
    pub status: AllocationStatus,  // 初始 PROVISIONAL
    pub item_ids: Vec<String>,     // 贡献席位的申请条目
    pub first_granted_in: AssignmentPass,
}

impl AllocationCandidate {
    /// 由首次授予创建
    pub fn from_grant(grant: &SeatGrant) -> Self {
        Self {
            edition_id: grant.edition_id.clone(),
            school_id: grant.school_id.clone(),
            assigned_seats: grant.seats,
            status: AllocationStatus::Provisional,
            item_ids: vec![grant.item_id.clone()],
            first_granted_in: grant.pass,
        }
    }

    /// 合并同一 场次×学校 的后续授予
    pub fn absorb(&mut self, grant: &SeatGrant) {
        self.assigned_seats += grant.seats;
        if !self.item_ids.contains(&grant.item_id) {
            self.item_ids.push(grant.item_id.clone());
        }
    }
}

// ==========================================
// Rejection - 约束拒绝记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub item_id: String,
    pub request_id: String,
    pub school_id: String,
    pub edition_id: String,
    pub priority: i32,
    pub reason: RejectionReason,
    pub pass: AssignmentPass,
}

// ==========================================
// TeacherAssignment - 教师绑定
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherAssignment {
    pub edition_id: String,
    pub teacher_id: String,
    pub teacher_name: Option<String>,
    pub school_id: String, // 教师所属学校
    pub role: TeacherRole,
    pub source: AssignmentSource,
}

// ==========================================
// StudentLink - 分配 → 学生
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentLink {
    pub edition_id: String,
    pub school_id: String,
    pub student_id: String,
}

// ==========================================
// DataWarning - 数据完整性告警（记录后继续）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataWarningKind {
    MalformedTeacherEntry,
    DanglingEdition,
    UnknownSchool,
    InvalidRequestItem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataWarning {
    pub kind: DataWarningKind,
    pub record_id: String,
    pub message: String,
}

impl DataWarning {
    pub fn new(kind: DataWarningKind, record_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            record_id: record_id.into(),
            message: message.into(),
        }
    }
}

// ==========================================
// Allocation - 已落库分配记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: String,
    pub period_id: String,
    pub edition_id: String,
    pub school_id: String,
    pub assigned_seats: i32,
    pub status: AllocationStatus,
    pub created_at: NaiveDateTime,
}
