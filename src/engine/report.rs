// ==========================================
// 工作坊席位分配系统 - 分配报表
// ==========================================
// 职责: 汇总一次运行的结果供调用方展示
// 内容: 总量 / 覆盖学校数 / 拒绝计数与样本 / 教师绑定数 /
//       场次占用汇总 / 学校汇总 / 待人工处理场次 / 数据告警
// ==========================================

use crate::domain::{AllocationSnapshot, AssignmentPass, DataWarning, DayOfWeek};
use crate::engine::orchestrator::AllocationOutcome;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io;

/// 场次占用汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditionSummary {
    pub edition_id: String,
    pub workshop_title: String,
    pub day_of_week: DayOfWeek,
    pub total_capacity: i32,
    pub occupied_seats: i32,
    pub remaining_seats: i32,
    pub school_count: usize,
    pub teacher_count: usize,
}

/// 学校汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolSummary {
    pub school_id: String,
    pub school_name: String,
    pub seats: i32,
    pub editions_won: usize,
    pub is_first_time_participant: bool,
}

/// 拒绝样本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionSample {
    pub item_id: String,
    pub school_id: String,
    pub edition_id: String,
    pub priority: i32,
    pub reason: String,
    pub description: String,
    pub pass: AssignmentPass,
}

/// 分配报表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationReport {
    pub period_id: String,
    pub seed: u64,
    pub allocations_created: usize,
    pub students_allocated: i32,
    pub schools_covered: usize,
    pub rejection_count: usize,
    pub rejection_sample: Vec<RejectionSample>,
    pub teacher_assignment_count: usize,
    pub edition_summaries: Vec<EditionSummary>,
    pub school_summaries: Vec<SchoolSummary>,
    pub unresolved_editions: Vec<String>,
    pub data_warning_count: usize,
    pub data_warnings: Vec<DataWarning>,
    pub replaced_allocations: usize, // 写入前删除的旧一代分配数
}

impl AllocationReport {
    /// 零值报表
    pub fn empty(period_id: &str, seed: u64) -> Self {
        Self {
            period_id: period_id.to_string(),
            seed,
            allocations_created: 0,
            students_allocated: 0,
            schools_covered: 0,
            rejection_count: 0,
            rejection_sample: Vec::new(),
            teacher_assignment_count: 0,
            edition_summaries: Vec::new(),
            school_summaries: Vec::new(),
            unresolved_editions: Vec::new(),
            data_warning_count: 0,
            data_warnings: Vec::new(),
            replaced_allocations: 0,
        }
    }

    /// 导出场次占用 CSV
    pub fn write_edition_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record([
            "edition_id",
            "workshop_title",
            "day_of_week",
            "total_capacity",
            "occupied_seats",
            "remaining_seats",
            "school_count",
            "teacher_count",
        ])?;

        for e in &self.edition_summaries {
            wtr.write_record([
                e.edition_id.clone(),
                e.workshop_title.clone(),
                e.day_of_week.to_db_str().to_string(),
                e.total_capacity.to_string(),
                e.occupied_seats.to_string(),
                e.remaining_seats.to_string(),
                e.school_count.to_string(),
                e.teacher_count.to_string(),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }
}

// ==========================================
// ReportGenerator - 报表生成器
// ==========================================
pub struct ReportGenerator {
    sample_size: usize,
}

impl ReportGenerator {
    pub fn new(sample_size: usize) -> Self {
        Self { sample_size }
    }

    pub fn generate(
        &self,
        snapshot: &AllocationSnapshot,
        outcome: &AllocationOutcome,
        seed: u64,
    ) -> AllocationReport {
        let mut report = AllocationReport::empty(&snapshot.period.id, seed);

        report.allocations_created = outcome.allocations.len();
        report.students_allocated = outcome.allocations.iter().map(|a| a.assigned_seats).sum();
        report.schools_covered = outcome
            .allocations
            .iter()
            .map(|a| a.school_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        report.rejection_count = outcome.rejections.len();
        report.rejection_sample = outcome
            .rejections
            .iter()
            .take(self.sample_size)
            .map(|r| RejectionSample {
                item_id: r.item_id.clone(),
                school_id: r.school_id.clone(),
                edition_id: r.edition_id.clone(),
                priority: r.priority,
                reason: r.reason.code().to_string(),
                description: r.reason.describe().to_string(),
                pass: r.pass,
            })
            .collect();

        report.teacher_assignment_count = outcome.teacher_assignments.len();

        // ===== 场次汇总 =====
        let mut teachers_per_edition: HashMap<&str, usize> = HashMap::new();
        for t in &outcome.teacher_assignments {
            *teachers_per_edition.entry(t.edition_id.as_str()).or_insert(0) += 1;
        }

        report.edition_summaries = snapshot
            .editions
            .iter()
            .map(|edition| {
                let held: Vec<_> = outcome
                    .allocations
                    .iter()
                    .filter(|a| a.edition_id == edition.id)
                    .collect();
                let occupied: i32 = held.iter().map(|a| a.assigned_seats).sum();
                EditionSummary {
                    edition_id: edition.id.clone(),
                    workshop_title: edition.workshop_title.clone(),
                    day_of_week: edition.day_of_week,
                    total_capacity: edition.total_capacity,
                    occupied_seats: occupied,
                    remaining_seats: edition.total_capacity - occupied,
                    school_count: held.len(),
                    teacher_count: teachers_per_edition.get(edition.id.as_str()).copied().unwrap_or(0),
                }
            })
            .collect();

        // ===== 学校汇总（提交了申请的学校）=====
        let requesting: HashSet<&str> = snapshot
            .requests
            .iter()
            .filter(|r| r.is_submitted())
            .map(|r| r.school_id.as_str())
            .collect();

        report.school_summaries = snapshot
            .schools
            .iter()
            .filter(|s| requesting.contains(s.id.as_str()))
            .map(|school| {
                let held: Vec<_> = outcome
                    .allocations
                    .iter()
                    .filter(|a| a.school_id == school.id)
                    .collect();
                SchoolSummary {
                    school_id: school.id.clone(),
                    school_name: school.name.clone(),
                    seats: held.iter().map(|a| a.assigned_seats).sum(),
                    editions_won: held.len(),
                    is_first_time_participant: school.is_first_time_participant,
                }
            })
            .collect();

        report.unresolved_editions = outcome.unresolved_editions.clone();
        report.data_warning_count = outcome.warnings.len();
        report.data_warnings = outcome.warnings.clone();

        report
    }
}
