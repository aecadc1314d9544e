// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================
#![allow(dead_code)]

use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use workshop_allocation::db::{init_schema, open_sqlite_connection};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试连接（统一 PRAGMA）
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(open_sqlite_connection(db_path)?)
}

/// 打开共享测试连接
pub fn open_shared_connection(db_path: &str) -> Result<Arc<Mutex<Connection>>, Box<dyn Error>> {
    Ok(Arc::new(Mutex::new(open_test_connection(db_path)?)))
}

// ==========================================
// 基础数据写入
// ==========================================

pub fn insert_period(conn: &Connection, id: &str, phase: &str, status: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO enrollment_periods (id, name, current_phase, status) VALUES (?1, ?2, ?3, ?4)",
        params![id, format!("Period {}", id), phase, status],
    )?;
    Ok(())
}

pub fn insert_school(conn: &Connection, id: &str, first_time: bool) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO schools (id, name, code, is_first_time_participant) VALUES (?1, ?2, ?3, ?4)",
        params![id, format!("School {}", id), id, first_time as i64],
    )?;
    Ok(())
}

pub fn insert_edition(
    conn: &Connection,
    id: &str,
    period_id: &str,
    title: &str,
    day: &str,
    capacity: i32,
    max_per_school: i32,
) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO workshop_editions
            (id, enrollment_period_id, workshop_title, day_of_week, capacity_total, max_per_school)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![id, period_id, title, day, capacity, max_per_school],
    )?;
    Ok(())
}

pub fn insert_request(
    conn: &Connection,
    id: &str,
    school_id: &str,
    period_id: &str,
    tuesdays: bool,
    teachers_json: Option<&str>,
) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO requests
            (id, school_id, enrollment_period_id, available_for_tuesdays, teachers_json, status)
        VALUES (?1, ?2, ?3, ?4, ?5, 'SUBMITTED')
        "#,
        params![id, school_id, period_id, tuesdays as i64, teachers_json],
    )?;
    Ok(())
}

pub fn insert_item(
    conn: &Connection,
    id: &str,
    request_id: &str,
    edition_id: &str,
    requested: i32,
    priority: i32,
) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO request_items (id, request_id, workshop_edition_id, requested_students, priority)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![id, request_id, edition_id, requested, priority],
    )?;
    Ok(())
}

/// 写入学生并关联到条目
pub fn insert_linked_student(
    conn: &Connection,
    id: &str,
    school_id: &str,
    item_id: &str,
    absenteeism: f64,
    created_at: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT OR IGNORE INTO students (id, school_id, full_name, absenteeism, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![id, school_id, format!("Student {}", id), absenteeism, created_at],
    )?;
    conn.execute(
        "INSERT INTO request_item_students (request_item_id, student_id) VALUES (?1, ?2)",
        params![item_id, id],
    )?;
    Ok(())
}

pub fn insert_preference(
    conn: &Connection,
    request_id: &str,
    edition_id: &str,
    teacher_id: &str,
    order: i32,
) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO request_teacher_preferences
            (request_id, workshop_edition_id, teacher_id, preference_order)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![request_id, edition_id, teacher_id, order],
    )?;
    Ok(())
}

pub fn count_rows(conn: &Connection, table: &str) -> rusqlite::Result<i64> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
}

// ==========================================
// 标准场景
// ==========================================

/// 标准场景（周期 P1, ALLOCATION/ACTIVE）
///
/// - E-TUE: 周二, 容量 16, 单校上限 4
/// - E-THU: 周四, 容量 8, 单校上限 4
/// - S-A: 首次参与, 周二可用, 申请 E-TUE 5 人、E-THU 3 人, 申报两名教师
/// - S-B: 周二不可用, 申请 E-TUE 4 人、E-THU 4 人, 申报一名教师
/// - S-C: 周二可用, 申请 E-THU 4 人, 无教师名单
pub fn seed_standard_scenario(conn: &Connection) -> rusqlite::Result<()> {
    insert_period(conn, "P1", "ALLOCATION", "ACTIVE")?;

    insert_school(conn, "S-A", true)?;
    insert_school(conn, "S-B", false)?;
    insert_school(conn, "S-C", false)?;

    insert_edition(conn, "E-TUE", "P1", "Robotics", "TUESDAY", 16, 4)?;
    insert_edition(conn, "E-THU", "P1", "Ceramics", "THURSDAY", 8, 4)?;

    insert_request(
        conn,
        "R-A",
        "S-A",
        "P1",
        true,
        Some(r#"[{"id":"T-A1","name":"Ana"},{"id":"T-A2","name":"Luis"}]"#),
    )?;
    insert_request(conn, "R-B", "S-B", "P1", false, Some(r#"[{"id":"T-B1","name":"Rosa"}]"#))?;
    insert_request(conn, "R-C", "S-C", "P1", true, None)?;

    insert_item(conn, "I-A1", "R-A", "E-TUE", 5, 1)?;
    insert_item(conn, "I-A2", "R-A", "E-THU", 3, 2)?;
    insert_item(conn, "I-B1", "R-B", "E-TUE", 4, 1)?;
    insert_item(conn, "I-B2", "R-B", "E-THU", 4, 1)?;
    insert_item(conn, "I-C1", "R-C", "E-THU", 4, 1)?;

    for (i, absenteeism) in [0.1, 0.5, 0.3, 0.9, 0.2].iter().enumerate() {
        insert_linked_student(
            conn,
            &format!("ST-A{}", i),
            "S-A",
            "I-A1",
            *absenteeism,
            &format!("2026-01-0{} 08:00:00", i + 1),
        )?;
    }
    for i in 0..4 {
        insert_linked_student(
            conn,
            &format!("ST-B{}", i),
            "S-B",
            "I-B2",
            0.1,
            &format!("2026-02-0{} 08:00:00", i + 1),
        )?;
    }

    insert_preference(conn, "R-A", "E-TUE", "T-A2", 1)?;

    Ok(())
}
