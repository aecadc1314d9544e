// ==========================================
// 工作坊席位分配系统 - 分配结果仓储
// ==========================================
// 职责: allocations / allocation_students / teacher_assignments 的读写
// 红线: Repository 不含业务逻辑
// ==========================================
// 说明: 写入函数均为 `*_with(&Connection, ..)` 形式,
//       由调用方放在同一个 IMMEDIATE 事务内执行
// ==========================================

use crate::domain::allocation::{Allocation, TeacherAssignment};
use crate::domain::types::{AllocationStatus, AssignmentSource, TeacherRole};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

const SQLITE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// DemandSummaryRow - 需求汇总行
// ==========================================
/// 学校 × 工作坊 × 星期 维度的申请需求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSummaryRow {
    pub school_code: String,
    pub school_name: String,
    pub workshop_title: String,
    pub day_of_week: String,
    pub total_requested: i64,
    pub item_count: i64,
    pub max_priority: i32,
}

/// 删除一代分配时各表的删除行数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedGeneration {
    pub allocations: usize,
    pub allocation_students: usize,
    pub teacher_assignments: usize,
}

// ==========================================
// AllocationRepository - 分配结果仓储
// ==========================================
pub struct AllocationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AllocationRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 有效代行数（PROVISIONAL / PUBLISHED / ACCEPTED）
    pub fn count_active(&self, period_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::count_active_with(&conn, period_id)
    }

    /// 按周期查询分配（可选按学校、状态过滤）
    pub fn list_allocations(
        &self,
        period_id: &str,
        school_id: Option<&str>,
        status: Option<AllocationStatus>,
    ) -> RepositoryResult<Vec<Allocation>> {
        let conn = self.get_conn()?;
        let status_str = status.map(|s| s.to_db_str());

        let mut stmt = conn.prepare(
            r#"
            SELECT id, enrollment_period_id, workshop_edition_id, school_id,
                   assigned_seats, status, created_at
            FROM allocations
            WHERE enrollment_period_id = ?1
              AND (?2 IS NULL OR school_id = ?2)
              AND (?3 IS NULL OR status = ?3)
            ORDER BY workshop_edition_id, school_id
            "#,
        )?;

        let rows = stmt
            .query_map(params![period_id, school_id, status_str], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i32>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(id, period_id, edition_id, school_id, assigned_seats, status_raw, created_raw)| {
                    let status = AllocationStatus::parse(&status_raw).ok_or_else(|| {
                        RepositoryError::FieldValueError {
                            field: "allocations.status".to_string(),
                            message: format!("未知状态: {}", status_raw),
                        }
                    })?;
                    let created_at = NaiveDateTime::parse_from_str(&created_raw, SQLITE_DATETIME_FORMAT)
                        .map_err(|e| RepositoryError::FieldValueError {
                            field: "allocations.created_at".to_string(),
                            message: format!("时间格式错误: {} ({})", created_raw, e),
                        })?;
                    Ok(Allocation {
                        id,
                        period_id,
                        edition_id,
                        school_id,
                        assigned_seats,
                        status,
                        created_at,
                    })
                },
            )
            .collect()
    }

    /// 某周期场次上的教师绑定
    pub fn list_teacher_assignments(&self, period_id: &str) -> RepositoryResult<Vec<TeacherAssignment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT ta.workshop_edition_id, ta.teacher_id, ta.teacher_name, ta.school_id,
                   ta.role, ta.source
            FROM teacher_assignments ta
            JOIN workshop_editions we ON we.id = ta.workshop_edition_id
            WHERE we.enrollment_period_id = ?1
            ORDER BY ta.workshop_edition_id, ta.teacher_id
            "#,
        )?;

        let rows = stmt
            .query_map(params![period_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(edition_id, teacher_id, teacher_name, school_id, role_raw, source_raw)| {
                let role = TeacherRole::parse(&role_raw).ok_or_else(|| RepositoryError::FieldValueError {
                    field: "teacher_assignments.role".to_string(),
                    message: format!("未知角色: {}", role_raw),
                })?;
                let source =
                    AssignmentSource::parse(&source_raw).ok_or_else(|| RepositoryError::FieldValueError {
                        field: "teacher_assignments.source".to_string(),
                        message: format!("未知来源: {}", source_raw),
                    })?;
                Ok(TeacherAssignment {
                    edition_id,
                    teacher_id,
                    teacher_name,
                    school_id,
                    role,
                    source,
                })
            })
            .collect()
    }

    /// 分配前的需求汇总（学校 × 工作坊 × 星期）
    pub fn demand_summary(&self, period_id: &str) -> RepositoryResult<Vec<DemandSummaryRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                s.code, s.name, we.workshop_title, we.day_of_week,
                SUM(ri.requested_students), COUNT(DISTINCT ri.id), MAX(ri.priority)
            FROM requests r
            JOIN schools s ON s.id = r.school_id
            JOIN request_items ri ON ri.request_id = r.id
            JOIN workshop_editions we ON we.id = ri.workshop_edition_id
            WHERE r.enrollment_period_id = ?1
            GROUP BY s.code, s.name, we.workshop_title, we.day_of_week
            ORDER BY s.name, we.workshop_title, we.day_of_week
            "#,
        )?;

        let rows = stmt
            .query_map(params![period_id], |row| {
                Ok(DemandSummaryRow {
                    school_code: row.get(0)?,
                    school_name: row.get(1)?,
                    workshop_title: row.get(2)?,
                    day_of_week: row.get(3)?,
                    total_requested: row.get(4)?,
                    item_count: row.get(5)?,
                    max_priority: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    // ==========================================
    // 连接级读写（事务内使用）
    // ==========================================

    pub fn count_active_with(conn: &Connection, period_id: &str) -> RepositoryResult<i64> {
        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM allocations
            WHERE enrollment_period_id = ?1
              AND status IN (?2, ?3, ?4)
            "#,
            params![
                period_id,
                AllocationStatus::ACTIVE[0].to_db_str(),
                AllocationStatus::ACTIVE[1].to_db_str(),
                AllocationStatus::ACTIVE[2].to_db_str(),
            ],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 删除某周期的整代分配结果
    ///
    /// 顺序: allocation_students → teacher_assignments → allocations
    pub fn delete_generation_with(
        conn: &Connection,
        period_id: &str,
    ) -> RepositoryResult<DeletedGeneration> {
        let allocation_students = conn.execute(
            r#"
            DELETE FROM allocation_students
            WHERE allocation_id IN (
                SELECT id FROM allocations WHERE enrollment_period_id = ?1
            )
            "#,
            params![period_id],
        )?;

        let teacher_assignments = conn.execute(
            r#"
            DELETE FROM teacher_assignments
            WHERE workshop_edition_id IN (
                SELECT id FROM workshop_editions WHERE enrollment_period_id = ?1
            )
            "#,
            params![period_id],
        )?;

        let allocations = conn.execute(
            "DELETE FROM allocations WHERE enrollment_period_id = ?1",
            params![period_id],
        )?;

        Ok(DeletedGeneration {
            allocations,
            allocation_students,
            teacher_assignments,
        })
    }

    pub fn insert_allocation_with(conn: &Connection, allocation: &Allocation) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO allocations (
                id, enrollment_period_id, workshop_edition_id, school_id,
                assigned_seats, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                allocation.id,
                allocation.period_id,
                allocation.edition_id,
                allocation.school_id,
                allocation.assigned_seats,
                allocation.status.to_db_str(),
                allocation.created_at.format(SQLITE_DATETIME_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn insert_allocation_student_with(
        conn: &Connection,
        allocation_id: &str,
        student_id: &str,
    ) -> RepositoryResult<()> {
        conn.execute(
            "INSERT INTO allocation_students (allocation_id, student_id) VALUES (?1, ?2)",
            params![allocation_id, student_id],
        )?;
        Ok(())
    }

    /// 插入教师绑定（已存在则忽略）
    ///
    /// # 返回
    /// - true: 新插入
    /// - false: (edition, teacher) 已存在
    pub fn insert_teacher_assignment_with(
        conn: &Connection,
        assignment: &TeacherAssignment,
        created_at: NaiveDateTime,
    ) -> RepositoryResult<bool> {
        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO teacher_assignments (
                workshop_edition_id, teacher_id, teacher_name, school_id, role, source, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                assignment.edition_id,
                assignment.teacher_id,
                assignment.teacher_name,
                assignment.school_id,
                assignment.role.to_db_str(),
                assignment.source.to_db_str(),
                created_at.format(SQLITE_DATETIME_FORMAT).to_string(),
            ],
        )?;
        Ok(inserted > 0)
    }
}
