// ==========================================
// 工作坊席位分配系统 - 运行输入快照
// ==========================================
// 红线: 快照在评分/变更开始前一次性读全, 运行期间不可变
// ==========================================

use crate::domain::period::{EnrollmentPeriod, School, WorkshopEdition};
use crate::domain::request::{Request, RequestItem, TeacherPreference};
use crate::domain::student::StudentCandidate;
use std::collections::HashMap;

/// 一个报名周期的完整只读输入
#[derive(Debug, Clone)]
pub struct AllocationSnapshot {
    pub period: EnrollmentPeriod,
    pub schools: Vec<School>,
    pub editions: Vec<WorkshopEdition>,
    pub requests: Vec<Request>,
    pub items: Vec<RequestItem>,
    pub preferences: Vec<TeacherPreference>,
    pub students: Vec<StudentCandidate>,
}

impl AllocationSnapshot {
    /// 空快照（没有申请或没有场次）
    pub fn is_trivially_empty(&self) -> bool {
        self.items.is_empty() || self.editions.is_empty()
    }

    pub fn editions_by_id(&self) -> HashMap<&str, &WorkshopEdition> {
        self.editions.iter().map(|e| (e.id.as_str(), e)).collect()
    }

    pub fn schools_by_id(&self) -> HashMap<&str, &School> {
        self.schools.iter().map(|s| (s.id.as_str(), s)).collect()
    }

    pub fn requests_by_id(&self) -> HashMap<&str, &Request> {
        self.requests.iter().map(|r| (r.id.as_str(), r)).collect()
    }
}
