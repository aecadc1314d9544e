// ==========================================
// 工作坊席位分配系统 - 分配快照仓储
// ==========================================
// 职责: 一次性读取某报名周期的分配输入
// 红线: Repository 不含业务逻辑, 只做读取与字段解析
// ==========================================
// 说明: `*_with(&Connection, ..)` 形式的函数供事务内调用
//       (Transaction 可解引用为 Connection)
// ==========================================

use crate::domain::period::{EnrollmentPeriod, School, WorkshopEdition};
use crate::domain::request::{Request, RequestItem, TeacherPreference};
use crate::domain::snapshot::AllocationSnapshot;
use crate::domain::student::StudentCandidate;
use crate::domain::types::{DayOfWeek, EnrollmentPhase};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// SQLite datetime('now') 的文本格式
const SQLITE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// SnapshotRepository - 分配快照仓储
// ==========================================
pub struct SnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SnapshotRepository {
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

    /// 查询报名周期（不存在返回 None）
    pub fn find_period(&self, period_id: &str) -> RepositoryResult<Option<EnrollmentPeriod>> {
        let conn = self.get_conn()?;
        Self::find_period_with(&conn, period_id)
    }

    /// 读取完整分配快照
    pub fn load(&self, period_id: &str) -> RepositoryResult<AllocationSnapshot> {
        let conn = self.get_conn()?;
        Self::load_with(&conn, period_id)
    }

    // ==========================================
    // 连接级读取（事务内使用）
    // ==========================================

    pub fn find_period_with(
        conn: &Connection,
        period_id: &str,
    ) -> RepositoryResult<Option<EnrollmentPeriod>> {
        let row = conn
            .query_row(
                "SELECT id, name, current_phase, status FROM enrollment_periods WHERE id = ?1",
                params![period_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, name, phase_raw, status)) = row else {
            return Ok(None);
        };

        let phase = EnrollmentPhase::parse(&phase_raw).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "enrollment_periods.current_phase".to_string(),
                message: format!("未知阶段: {}", phase_raw),
            }
        })?;

        Ok(Some(EnrollmentPeriod {
            id,
            name,
            phase,
            status,
        }))
    }

    /// 读取快照
    ///
    /// # 返回
    /// - Err(NotFound): 周期不存在
    /// - 各集合按 id 排序，保证同一数据库状态得到同一输入顺序
    pub fn load_with(conn: &Connection, period_id: &str) -> RepositoryResult<AllocationSnapshot> {
        let period = Self::find_period_with(conn, period_id)?.ok_or_else(|| {
            RepositoryError::NotFound {
                entity: "EnrollmentPeriod".to_string(),
                id: period_id.to_string(),
            }
        })?;

        Ok(AllocationSnapshot {
            period,
            schools: Self::load_schools(conn, period_id)?,
            editions: Self::load_editions(conn, period_id)?,
            requests: Self::load_requests(conn, period_id)?,
            items: Self::load_items(conn, period_id)?,
            preferences: Self::load_preferences(conn, period_id)?,
            students: Self::load_students(conn, period_id)?,
        })
    }

    /// 本周期已提交申请涉及的学校
    fn load_schools(conn: &Connection, period_id: &str) -> RepositoryResult<Vec<School>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT s.id, s.name, s.code, s.is_first_time_participant
            FROM schools s
            JOIN requests r ON r.school_id = s.id
            WHERE r.enrollment_period_id = ?1 AND r.status = 'SUBMITTED'
            ORDER BY s.id
            "#,
        )?;

        let schools = stmt
            .query_map(params![period_id], |row| {
                Ok(School {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    code: row.get(2)?,
                    is_first_time_participant: row.get::<_, i64>(3)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(schools)
    }

    fn load_editions(conn: &Connection, period_id: &str) -> RepositoryResult<Vec<WorkshopEdition>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, workshop_title, day_of_week, capacity_total, max_per_school
            FROM workshop_editions
            WHERE enrollment_period_id = ?1
            ORDER BY id
            "#,
        )?;

        let rows = stmt
            .query_map(params![period_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i32>(3)?,
                    row.get::<_, i32>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut editions = Vec::with_capacity(rows.len());
        for (id, workshop_title, day_raw, total_capacity, max_per_school) in rows {
            // 星期无法识别的场次不进入快照，引用它的条目会作为悬空引用告警
            let Some(day_of_week) = DayOfWeek::parse(&day_raw) else {
                warn!(edition_id = %id, day_of_week = %day_raw, "场次星期无法识别，跳过");
                continue;
            };
            editions.push(WorkshopEdition {
                id,
                workshop_title,
                day_of_week,
                total_capacity,
                max_per_school,
            });
        }

        Ok(editions)
    }

    fn load_requests(conn: &Connection, period_id: &str) -> RepositoryResult<Vec<Request>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, school_id, enrollment_period_id, available_for_tuesdays, status, teachers_json
            FROM requests
            WHERE enrollment_period_id = ?1 AND status = 'SUBMITTED'
            ORDER BY id
            "#,
        )?;

        let requests = stmt
            .query_map(params![period_id], |row| {
                Ok(Request {
                    id: row.get(0)?,
                    school_id: row.get(1)?,
                    period_id: row.get(2)?,
                    available_for_tuesdays: row.get::<_, i64>(3)? != 0,
                    status: row.get(4)?,
                    teachers_json: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(requests)
    }

    /// 申请条目，附带关联学生的平均缺勤率（无学生时为 0）
    fn load_items(conn: &Connection, period_id: &str) -> RepositoryResult<Vec<RequestItem>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT
                ri.id, ri.request_id, ri.workshop_edition_id, ri.requested_students, ri.priority,
                COALESCE((
                    SELECT AVG(s.absenteeism)
                    FROM request_item_students ris
                    JOIN students s ON s.id = ris.student_id
                    WHERE ris.request_item_id = ri.id
                ), 0.0)
            FROM request_items ri
            JOIN requests r ON r.id = ri.request_id
            WHERE r.enrollment_period_id = ?1 AND r.status = 'SUBMITTED'
            ORDER BY ri.id
            "#,
        )?;

        let items = stmt
            .query_map(params![period_id], |row| {
                Ok(RequestItem {
                    id: row.get(0)?,
                    request_id: row.get(1)?,
                    edition_id: row.get(2)?,
                    requested_students: row.get(3)?,
                    priority: row.get(4)?,
                    avg_absenteeism: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn load_preferences(
        conn: &Connection,
        period_id: &str,
    ) -> RepositoryResult<Vec<TeacherPreference>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT p.request_id, p.workshop_edition_id, p.teacher_id, p.preference_order
            FROM request_teacher_preferences p
            JOIN requests r ON r.id = p.request_id
            WHERE r.enrollment_period_id = ?1 AND r.status = 'SUBMITTED'
            ORDER BY p.request_id, p.preference_order, p.workshop_edition_id, p.teacher_id
            "#,
        )?;

        let preferences = stmt
            .query_map(params![period_id], |row| {
                Ok(TeacherPreference {
                    request_id: row.get(0)?,
                    edition_id: row.get(1)?,
                    teacher_id: row.get(2)?,
                    preference_order: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(preferences)
    }

    /// 通过 request_item_students 关联到条目的学生
    fn load_students(
        conn: &Connection,
        period_id: &str,
    ) -> RepositoryResult<Vec<StudentCandidate>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT s.id, s.school_id, ris.request_item_id, s.absenteeism, s.created_at
            FROM request_item_students ris
            JOIN students s ON s.id = ris.student_id
            JOIN request_items ri ON ri.id = ris.request_item_id
            JOIN requests r ON r.id = ri.request_id
            WHERE r.enrollment_period_id = ?1 AND r.status = 'SUBMITTED'
            ORDER BY ris.request_item_id, s.id
            "#,
        )?;

        let rows = stmt
            .query_map(params![period_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, school_id, request_item_id, absenteeism, created_at_raw)| {
                let created_at = NaiveDateTime::parse_from_str(&created_at_raw, SQLITE_DATETIME_FORMAT)
                    .map_err(|e| RepositoryError::FieldValueError {
                        field: "students.created_at".to_string(),
                        message: format!("学生 {} 时间格式错误: {} ({})", id, created_at_raw, e),
                    })?;
                Ok(StudentCandidate {
                    id,
                    school_id,
                    request_item_id,
                    absenteeism,
                    created_at,
                })
            })
            .collect()
    }
}
