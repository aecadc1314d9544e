// ==========================================
// 工作坊席位分配系统 - 分配运行 API
// ==========================================
// 职责: 在单个 IMMEDIATE 事务内完成
//       前置检查 → 重跑守卫 → (强制时删除旧代) → 读取快照 → 引擎计算 → 写入 → 提交
// 红线: 任一基础设施错误整轮回滚, 不留下部分写入
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{AllocationConfig, AllocationConfigReader};
use crate::domain::allocation::{Allocation, AllocationCandidate, TeacherAssignment};
use crate::domain::snapshot::AllocationSnapshot;
use crate::domain::types::{AllocationStatus, EnrollmentPhase};
use crate::engine::{AllocationEngine, AllocationOutcome, AllocationReport};
use crate::repository::{
    AllocationRepository, DeletedGeneration, DemandSummaryRow, RepositoryError, SnapshotRepository,
};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// AllocationApi - 分配运行 API
// ==========================================
pub struct AllocationApi<C>
where
    C: AllocationConfigReader,
{
    conn: Arc<Mutex<Connection>>,
    config: Arc<C>,
}

/// 一轮写入的行数统计
#[derive(Debug, Clone, Copy, Default)]
struct PersistedCounts {
    allocations: usize,
    allocation_students: usize,
    teacher_assignments: usize,
}

impl<C> AllocationApi<C>
where
    C: AllocationConfigReader,
{
    pub fn new(conn: Arc<Mutex<Connection>>, config: Arc<C>) -> Self {
        Self { conn, config }
    }

    /// 执行一轮分配
    ///
    /// # 参数
    /// - period_id: 报名周期ID
    /// - force: 已存在有效分配时, 先删除旧代再重跑
    ///
    /// # 返回
    /// - Ok(AllocationReport): 本轮报表（空输入时为全零报表）
    /// - Err(ConcurrencyConflict): 已有有效分配且未指定 force, 未做任何写入
    /// - Err(Infrastructure): 存储故障, 整轮已回滚
    #[instrument(skip(self))]
    pub async fn run_allocation(&self, period_id: &str, force: bool) -> ApiResult<AllocationReport> {
        if period_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("period_id 不能为空".to_string()));
        }

        let config = self
            .config
            .load_allocation_config()
            .await
            .map_err(|e| ApiError::Config(e.to_string()))?;

        self.run_in_transaction(period_id, force, config)
    }

    /// 事务内的同步部分（持锁期间不跨越 await）
    fn run_in_transaction(
        &self,
        period_id: &str,
        force: bool,
        config: AllocationConfig,
    ) -> ApiResult<AllocationReport> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| ApiError::infrastructure(period_id, RepositoryError::LockError(e.to_string())))?;

        // IMMEDIATE: 并发的第二轮在此排队, 拿到写锁时已能看到第一轮提交的结果
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| ApiError::infrastructure(period_id, e))?;

        Self::check_period(&tx, period_id)?;

        let existing = AllocationRepository::count_active_with(&tx, period_id)
            .map_err(|e| ApiError::infrastructure(period_id, e))?;

        if existing > 0 && !force {
            warn!(existing, "已存在有效分配, 拒绝重跑");
            return Err(ApiError::ConcurrencyConflict {
                period_id: period_id.to_string(),
                existing,
            });
        }

        // 守卫通过后清掉本周期残留的整代结果（强制重跑的有效行, 或已失效的旧行）,
        // 保证新旧两代不会同时存在
        let deleted = AllocationRepository::delete_generation_with(&tx, period_id)
            .map_err(|e| ApiError::infrastructure(period_id, e))?;
        if deleted != DeletedGeneration::default() {
            info!(
                forced = existing > 0,
                allocations = deleted.allocations,
                allocation_students = deleted.allocation_students,
                teacher_assignments = deleted.teacher_assignments,
                "已删除旧一代分配"
            );
        }

        let snapshot = SnapshotRepository::load_with(&tx, period_id)
            .map_err(|e| ApiError::infrastructure(period_id, e))?;

        let engine = AllocationEngine::new(config);
        let outcome = engine.run(&snapshot);

        let now = Utc::now().naive_utc();
        let counts = Self::persist(&tx, &snapshot, &outcome, now)
            .map_err(|e| ApiError::infrastructure(period_id, e))?;

        tx.commit().map_err(|e| ApiError::infrastructure(period_id, e))?;

        info!(
            allocations = counts.allocations,
            allocation_students = counts.allocation_students,
            teacher_assignments = counts.teacher_assignments,
            "分配结果已提交"
        );

        let mut report = engine.report(&snapshot, &outcome);
        report.replaced_allocations = deleted.allocations;
        Ok(report)
    }

    /// 前置检查: 周期存在、ACTIVE、处于 ALLOCATION 阶段
    fn check_period(conn: &Connection, period_id: &str) -> ApiResult<()> {
        let period = SnapshotRepository::find_period_with(conn, period_id)
            .map_err(|e| ApiError::infrastructure(period_id, e))?
            .ok_or_else(|| ApiError::PeriodNotFound(period_id.to_string()))?;

        if !period.is_active() {
            return Err(ApiError::PeriodInactive {
                period_id: period_id.to_string(),
                status: period.status,
            });
        }

        if period.phase != EnrollmentPhase::Allocation {
            return Err(ApiError::InvalidPhase {
                period_id: period_id.to_string(),
                phase: period.phase.to_string(),
            });
        }

        Ok(())
    }

    /// 写入一轮结果（调用方负责事务）
    fn persist(
        conn: &Connection,
        snapshot: &AllocationSnapshot,
        outcome: &AllocationOutcome,
        now: NaiveDateTime,
    ) -> Result<PersistedCounts, RepositoryError> {
        let mut counts = PersistedCounts::default();
        let mut allocation_ids: HashMap<(&str, &str), String> = HashMap::new();

        for candidate in &outcome.allocations {
            let allocation = Self::to_allocation(&snapshot.period.id, candidate, now);
            AllocationRepository::insert_allocation_with(conn, &allocation)?;
            allocation_ids.insert(
                (candidate.edition_id.as_str(), candidate.school_id.as_str()),
                allocation.id,
            );
            counts.allocations += 1;
        }

        for link in &outcome.student_links {
            let Some(allocation_id) =
                allocation_ids.get(&(link.edition_id.as_str(), link.school_id.as_str()))
            else {
                return Err(RepositoryError::InternalError(format!(
                    "学生关联找不到对应分配: edition={}, school={}",
                    link.edition_id, link.school_id
                )));
            };
            AllocationRepository::insert_allocation_student_with(conn, allocation_id, &link.student_id)?;
            counts.allocation_students += 1;
        }

        for assignment in &outcome.teacher_assignments {
            if AllocationRepository::insert_teacher_assignment_with(conn, assignment, now)? {
                counts.teacher_assignments += 1;
            } else {
                debug!(
                    edition_id = %assignment.edition_id,
                    teacher_id = %assignment.teacher_id,
                    "教师绑定已存在, 跳过"
                );
            }
        }

        Ok(counts)
    }

    fn to_allocation(period_id: &str, candidate: &AllocationCandidate, now: NaiveDateTime) -> Allocation {
        Allocation {
            id: Uuid::new_v4().to_string(),
            period_id: period_id.to_string(),
            edition_id: candidate.edition_id.clone(),
            school_id: candidate.school_id.clone(),
            assigned_seats: candidate.assigned_seats,
            status: AllocationStatus::Provisional,
            created_at: now,
        }
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 分配前的需求汇总
    pub fn demand_summary(&self, period_id: &str) -> ApiResult<Vec<DemandSummaryRow>> {
        let repo = AllocationRepository::from_connection(self.conn.clone());
        Ok(repo.demand_summary(period_id)?)
    }

    /// 查询分配结果
    pub fn list_allocations(
        &self,
        period_id: &str,
        school_id: Option<&str>,
        status: Option<AllocationStatus>,
    ) -> ApiResult<Vec<Allocation>> {
        let repo = AllocationRepository::from_connection(self.conn.clone());
        Ok(repo.list_allocations(period_id, school_id, status)?)
    }

    /// 查询教师绑定
    pub fn list_teacher_assignments(&self, period_id: &str) -> ApiResult<Vec<TeacherAssignment>> {
        let repo = AllocationRepository::from_connection(self.conn.clone());
        Ok(repo.list_teacher_assignments(period_id)?)
    }

    /// 导出场次占用 CSV
    pub fn export_edition_csv(report: &AllocationReport, path: &Path) -> ApiResult<()> {
        let file = File::create(path).map_err(|e| ApiError::Export(e.to_string()))?;
        report
            .write_edition_csv(file)
            .map_err(|e| ApiError::Export(e.to_string()))
    }
}
