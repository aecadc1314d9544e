// ==========================================
// 工作坊席位分配系统 - 学生候选
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 与申请条目关联的学生（用于挑选分配名单）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentCandidate {
    pub id: String,
    pub school_id: String,
    pub request_item_id: String,
    pub absenteeism: f64,
    pub created_at: NaiveDateTime,
}
