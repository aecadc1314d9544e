// ==========================================
// 分配快照构建器 - 用于引擎测试
// ==========================================
#![allow(dead_code)]

use chrono::NaiveDateTime;
use workshop_allocation::domain::{
    AllocationSnapshot, EnrollmentPeriod, Request, RequestItem, School, StudentCandidate,
    TeacherPreference, WorkshopEdition,
};
use workshop_allocation::{DayOfWeek, EnrollmentPhase};

pub struct SnapshotBuilder {
    snapshot: AllocationSnapshot,
}

impl SnapshotBuilder {
    pub fn new(period_id: &str) -> Self {
        Self {
            snapshot: AllocationSnapshot {
                period: EnrollmentPeriod {
                    id: period_id.to_string(),
                    name: format!("Period {}", period_id),
                    phase: EnrollmentPhase::Allocation,
                    status: EnrollmentPeriod::STATUS_ACTIVE.to_string(),
                },
                schools: Vec::new(),
                editions: Vec::new(),
                requests: Vec::new(),
                items: Vec::new(),
                preferences: Vec::new(),
                students: Vec::new(),
            },
        }
    }

    pub fn school(mut self, id: &str, first_time: bool) -> Self {
        self.snapshot.schools.push(School {
            id: id.to_string(),
            name: format!("School {}", id),
            code: id.to_string(),
            is_first_time_participant: first_time,
        });
        self
    }

    pub fn edition(mut self, id: &str, day: DayOfWeek, capacity: i32, max_per_school: i32) -> Self {
        self.snapshot.editions.push(WorkshopEdition {
            id: id.to_string(),
            workshop_title: format!("Workshop {}", id),
            day_of_week: day,
            total_capacity: capacity,
            max_per_school,
        });
        self
    }

    /// 申请（school 与 request 一一对应, request_id = "R-" + school_id）
    pub fn request(mut self, school_id: &str, tuesdays: bool, teachers_json: Option<&str>) -> Self {
        self.snapshot.requests.push(Request {
            id: format!("R-{}", school_id),
            school_id: school_id.to_string(),
            period_id: self.snapshot.period.id.clone(),
            available_for_tuesdays: tuesdays,
            status: Request::STATUS_SUBMITTED.to_string(),
            teachers_json: teachers_json.map(str::to_string),
        });
        self
    }

    pub fn item(
        mut self,
        item_id: &str,
        school_id: &str,
        edition_id: &str,
        requested: i32,
        priority: i32,
        avg_absenteeism: f64,
    ) -> Self {
        self.snapshot.items.push(RequestItem {
            id: item_id.to_string(),
            request_id: format!("R-{}", school_id),
            edition_id: edition_id.to_string(),
            requested_students: requested,
            priority,
            avg_absenteeism,
        });
        self
    }

    pub fn preference(mut self, school_id: &str, edition_id: &str, teacher_id: &str, order: i32) -> Self {
        self.snapshot.preferences.push(TeacherPreference {
            request_id: format!("R-{}", school_id),
            edition_id: edition_id.to_string(),
            teacher_id: teacher_id.to_string(),
            preference_order: order,
        });
        self
    }

    pub fn student(mut self, id: &str, school_id: &str, item_id: &str, absenteeism: f64) -> Self {
        self.snapshot.students.push(StudentCandidate {
            id: id.to_string(),
            school_id: school_id.to_string(),
            request_item_id: item_id.to_string(),
            absenteeism,
            created_at: NaiveDateTime::default(),
        });
        self
    }

    pub fn build(self) -> AllocationSnapshot {
        self.snapshot
    }
}
