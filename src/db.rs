// ==========================================
// 工作坊席位分配系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，并发运行时第二个写事务排队而不是立刻报 busy
// - 提供分配引擎读写所需的最小 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 分配引擎涉及的表
///
/// 说明：
/// - requests.teachers_json 为自由格式 JSON（申报教师名单），由引擎容错解析
/// - teacher_assignments 以 (edition_id, teacher_id) 唯一，插入幂等
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS enrollment_periods (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    current_phase TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS schools (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    code TEXT NOT NULL,
    is_first_time_participant INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS workshop_editions (
    id TEXT PRIMARY KEY,
    enrollment_period_id TEXT NOT NULL REFERENCES enrollment_periods(id),
    workshop_title TEXT NOT NULL,
    day_of_week TEXT NOT NULL,
    capacity_total INTEGER NOT NULL CHECK (capacity_total > 0),
    max_per_school INTEGER NOT NULL DEFAULT 4
);

CREATE TABLE IF NOT EXISTS requests (
    id TEXT PRIMARY KEY,
    school_id TEXT NOT NULL REFERENCES schools(id),
    enrollment_period_id TEXT NOT NULL REFERENCES enrollment_periods(id),
    available_for_tuesdays INTEGER NOT NULL DEFAULT 1,
    teachers_json TEXT,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS request_items (
    id TEXT PRIMARY KEY,
    request_id TEXT NOT NULL REFERENCES requests(id) ON DELETE CASCADE,
    workshop_edition_id TEXT NOT NULL,
    requested_students INTEGER NOT NULL,
    priority INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS students (
    id TEXT PRIMARY KEY,
    school_id TEXT NOT NULL REFERENCES schools(id),
    full_name TEXT NOT NULL,
    absenteeism REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS request_item_students (
    request_item_id TEXT NOT NULL REFERENCES request_items(id) ON DELETE CASCADE,
    student_id TEXT NOT NULL REFERENCES students(id),
    PRIMARY KEY (request_item_id, student_id)
);

CREATE TABLE IF NOT EXISTS request_teacher_preferences (
    request_id TEXT NOT NULL REFERENCES requests(id) ON DELETE CASCADE,
    workshop_edition_id TEXT NOT NULL,
    teacher_id TEXT NOT NULL,
    preference_order INTEGER NOT NULL,
    PRIMARY KEY (request_id, workshop_edition_id, teacher_id)
);

CREATE TABLE IF NOT EXISTS allocations (
    id TEXT PRIMARY KEY,
    enrollment_period_id TEXT NOT NULL REFERENCES enrollment_periods(id),
    workshop_edition_id TEXT NOT NULL REFERENCES workshop_editions(id),
    school_id TEXT NOT NULL REFERENCES schools(id),
    assigned_seats INTEGER NOT NULL CHECK (assigned_seats >= 1),
    status TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS allocation_students (
    allocation_id TEXT NOT NULL REFERENCES allocations(id) ON DELETE CASCADE,
    student_id TEXT NOT NULL REFERENCES students(id),
    PRIMARY KEY (allocation_id, student_id)
);

CREATE TABLE IF NOT EXISTS teacher_assignments (
    workshop_edition_id TEXT NOT NULL REFERENCES workshop_editions(id),
    teacher_id TEXT NOT NULL,
    teacher_name TEXT,
    school_id TEXT NOT NULL,
    role TEXT NOT NULL,
    source TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (workshop_edition_id, teacher_id)
);

CREATE INDEX IF NOT EXISTS idx_allocations_period ON allocations(enrollment_period_id);
CREATE INDEX IF NOT EXISTS idx_requests_period ON requests(enrollment_period_id);
CREATE INDEX IF NOT EXISTS idx_editions_period ON workshop_editions(enrollment_period_id);
"#;

/// 默认数据库路径
///
/// 优先级: 环境变量 WORKSHOP_ALLOCATION_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("WORKSHOP_ALLOCATION_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./workshop_allocation.db");
    if let Some(data_dir) = dirs::data_dir() {
        path = data_dir.join("workshop-allocation").join("workshop_allocation.db");
    }

    path.to_string_lossy().to_string()
}

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）并登记 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_schema_version_absent_on_empty_db() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }
}
