// ==========================================
// AllocationApi 集成测试
// ==========================================
// 测试目标: 事务边界、重跑守卫、强制重跑、回滚、幂等写入
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[path = "helpers/mock_config.rs"]
mod mock_config;

use mock_config::{FailingConfig, MockConfig};
use rusqlite::Connection;
use std::sync::{Arc, Barrier};
use std::thread;
use test_helpers::*;
use workshop_allocation::api::{AllocationApi, ApiError};
use workshop_allocation::config::AllocationConfigReader;
use workshop_allocation::AllocationStatus;

// ==========================================
// 测试辅助函数
// ==========================================

fn setup_standard() -> (tempfile::NamedTempFile, String) {
    workshop_allocation::logging::init_test();
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).expect("Failed to open db");
    seed_standard_scenario(&conn).expect("Failed to seed scenario");
    (temp_file, db_path)
}

fn api_with<C: AllocationConfigReader>(db_path: &str, config: C) -> AllocationApi<C> {
    let conn = open_shared_connection(db_path).expect("Failed to open db");
    AllocationApi::new(conn, Arc::new(config))
}

fn api(db_path: &str) -> AllocationApi<MockConfig> {
    api_with(db_path, MockConfig::default())
}

fn rows(db_path: &str, table: &str) -> i64 {
    let conn = open_test_connection(db_path).expect("Failed to open db");
    count_rows(&conn, table).expect("count failed")
}

// ==========================================
// 正常运行
// ==========================================

#[tokio::test]
async fn test_run_persists_one_generation() {
    let (_temp_file, db_path) = setup_standard();

    let report = api(&db_path).run_allocation("P1", false).await.unwrap();

    assert_eq!(report.allocations_created, 3);
    assert_eq!(report.students_allocated, 12);
    assert_eq!(report.schools_covered, 3);
    assert_eq!(report.rejection_count, 2);
    assert_eq!(report.teacher_assignment_count, 2);
    assert!(report.unresolved_editions.is_empty());
    assert_eq!(report.replaced_allocations, 0);

    assert_eq!(rows(&db_path, "allocations"), 3);
    assert_eq!(rows(&db_path, "allocation_students"), 8);
    assert_eq!(rows(&db_path, "teacher_assignments"), 2);
}

#[tokio::test]
async fn test_run_selects_most_absent_students() {
    let (_temp_file, db_path) = setup_standard();
    api(&db_path).run_allocation("P1", false).await.unwrap();

    let conn = open_test_connection(&db_path).unwrap();
    let mut stmt = conn
        .prepare(
            r#"
            SELECT s.student_id FROM allocation_students s
            JOIN allocations a ON a.id = s.allocation_id
            WHERE a.school_id = 'S-A'
            ORDER BY s.student_id
            "#,
        )
        .unwrap();
    let chosen: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(chosen, vec!["ST-A1", "ST-A2", "ST-A3", "ST-A4"]);
}

#[tokio::test]
async fn test_rejections_in_report() {
    let (_temp_file, db_path) = setup_standard();
    let report = api(&db_path).run_allocation("P1", false).await.unwrap();

    let reasons: Vec<(&str, &str)> = report
        .rejection_sample
        .iter()
        .map(|r| (r.item_id.as_str(), r.reason.as_str()))
        .collect();
    assert!(reasons.contains(&("I-B1", "DAY_UNAVAILABLE")));
    assert!(reasons.contains(&("I-A2", "EDITION_FULL")));
}

// ==========================================
// 重跑守卫
// ==========================================

#[tokio::test]
async fn test_second_run_without_force_conflicts() {
    let (_temp_file, db_path) = setup_standard();
    let api = api(&db_path);

    api.run_allocation("P1", false).await.unwrap();
    let err = api.run_allocation("P1", false).await.unwrap_err();

    match err {
        ApiError::ConcurrencyConflict { period_id, existing } => {
            assert_eq!(period_id, "P1");
            assert_eq!(existing, 3);
        }
        other => panic!("Expected ConcurrencyConflict, got {:?}", other),
    }

    assert_eq!(rows(&db_path, "allocations"), 3);
    assert_eq!(rows(&db_path, "allocation_students"), 8);
    assert_eq!(rows(&db_path, "teacher_assignments"), 2);
}

#[tokio::test]
async fn test_forced_run_replaces_generation() {
    let (_temp_file, db_path) = setup_standard();
    let api = api(&db_path);

    api.run_allocation("P1", false).await.unwrap();
    let report = api.run_allocation("P1", true).await.unwrap();

    assert_eq!(report.replaced_allocations, 3);
    assert_eq!(rows(&db_path, "allocations"), 3);
    assert_eq!(rows(&db_path, "allocation_students"), 8);
    assert_eq!(rows(&db_path, "teacher_assignments"), 2);
}

#[tokio::test]
async fn test_rejected_rows_do_not_block_rerun() {
    let (_temp_file, db_path) = setup_standard();
    let api = api(&db_path);
    api.run_allocation("P1", false).await.unwrap();

    {
        let conn = open_test_connection(&db_path).unwrap();
        conn.execute("UPDATE allocations SET status = 'REJECTED'", [])
            .unwrap();
    }

    let report = api.run_allocation("P1", false).await.unwrap();
    let active = api
        .list_allocations("P1", None, Some(AllocationStatus::Provisional))
        .unwrap();
    assert_eq!(active.len(), 3);

    // 失效的旧行在同一事务内被清掉
    assert_eq!(report.replaced_allocations, 3);
    assert_eq!(rows(&db_path, "allocations"), 3);
    assert_eq!(rows(&db_path, "allocation_students"), 8);
    assert_eq!(rows(&db_path, "teacher_assignments"), 2);
}

#[tokio::test]
async fn test_rerun_after_rejection_leaves_no_stale_rows() {
    let (_temp_file, db_path) = setup_standard();
    let api = api(&db_path);
    api.run_allocation("P1", false).await.unwrap();

    {
        let conn = open_test_connection(&db_path).unwrap();
        conn.execute("UPDATE allocations SET status = 'REJECTED'", [])
            .unwrap();
        conn.execute("UPDATE requests SET status = 'DRAFT' WHERE id = 'R-A'", [])
            .unwrap();
    }

    let report = api.run_allocation("P1", false).await.unwrap();

    // 只剩 S-B / S-C 在 E-THU 的新一代
    assert_eq!(report.allocations_created, 2);
    assert_eq!(rows(&db_path, "allocations"), 2);
    assert_eq!(rows(&db_path, "allocation_students"), 4);
    assert_eq!(rows(&db_path, "teacher_assignments"), 1);
    assert_eq!(report.teacher_assignment_count, 1);

    let conn = open_test_connection(&db_path).unwrap();
    let stale: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM teacher_assignments WHERE workshop_edition_id = 'E-TUE'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stale, 0);
    let rejected: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM allocations WHERE status = 'REJECTED'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(rejected, 0);
}

#[test]
fn test_concurrent_runs_only_one_succeeds() {
    let (_temp_file, db_path) = setup_standard();
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let db_path = db_path.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .unwrap();
                let api = api(&db_path);
                barrier.wait();
                runtime.block_on(api.run_allocation("P1", false))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let ok = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(ApiError::ConcurrencyConflict { .. })))
        .count();
    assert_eq!(ok, 1);
    assert_eq!(conflicts, 1);
    assert_eq!(rows(&db_path, "allocations"), 3);
}

// ==========================================
// 原子性与幂等
// ==========================================

#[tokio::test]
async fn test_failure_rolls_back_every_write() {
    let (_temp_file, db_path) = setup_standard();
    {
        let conn = open_test_connection(&db_path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TRIGGER fail_student_links BEFORE INSERT ON allocation_students
            BEGIN
                SELECT RAISE(ABORT, 'simulated storage failure');
            END;
            "#,
        )
        .unwrap();
    }

    let api = api(&db_path);
    let err = api.run_allocation("P1", false).await.unwrap_err();

    match &err {
        ApiError::Infrastructure { period_id, .. } => assert_eq!(period_id, "P1"),
        other => panic!("Expected Infrastructure, got {:?}", other),
    }
    assert!(err.is_retryable());
    assert_eq!(rows(&db_path, "allocations"), 0);
    assert_eq!(rows(&db_path, "teacher_assignments"), 0);

    {
        let conn = open_test_connection(&db_path).unwrap();
        conn.execute_batch("DROP TRIGGER fail_student_links;").unwrap();
    }

    let report = api.run_allocation("P1", false).await.unwrap();
    assert_eq!(report.allocations_created, 3);
}

#[tokio::test]
async fn test_leftover_teacher_binding_is_replaced() {
    let (_temp_file, db_path) = setup_standard();
    {
        let conn = open_test_connection(&db_path).unwrap();
        conn.execute(
            r#"
            INSERT INTO teacher_assignments
                (workshop_edition_id, teacher_id, teacher_name, school_id, role, source, created_at)
            VALUES ('E-TUE', 'T-A2', 'Luis', 'S-A', 'ACCOMPANYING', 'PREFERENCE', '2026-01-01 00:00:00')
            "#,
            [],
        )
        .unwrap();
    }

    let report = api(&db_path).run_allocation("P1", false).await.unwrap();

    assert_eq!(report.teacher_assignment_count, 2);
    assert_eq!(rows(&db_path, "teacher_assignments"), 2);

    let conn = open_test_connection(&db_path).unwrap();
    let old: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM teacher_assignments WHERE created_at = '2026-01-01 00:00:00'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(old, 0);
}

// ==========================================
// 前置条件
// ==========================================

#[tokio::test]
async fn test_period_checks() {
    let (_temp_file, db_path) = setup_standard();
    {
        let conn: Connection = open_test_connection(&db_path).unwrap();
        insert_period(&conn, "P-CLOSED", "ALLOCATION", "CLOSED").unwrap();
        insert_period(&conn, "P-EARLY", "REQUESTS", "ACTIVE").unwrap();
    }
    let api = api(&db_path);

    assert!(matches!(
        api.run_allocation("NOPE", false).await,
        Err(ApiError::PeriodNotFound(_))
    ));
    assert!(matches!(
        api.run_allocation("P-CLOSED", false).await,
        Err(ApiError::PeriodInactive { .. })
    ));
    match api.run_allocation("P-EARLY", false).await {
        Err(ApiError::InvalidPhase { phase, .. }) => assert_eq!(phase, "REQUESTS"),
        other => panic!("Expected InvalidPhase, got {:?}", other),
    }
    assert!(matches!(
        api.run_allocation("  ", false).await,
        Err(ApiError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_empty_period_commits_zero_report() {
    workshop_allocation::logging::init_test();
    let (_temp_file, db_path) = create_test_db().unwrap();
    {
        let conn = open_test_connection(&db_path).unwrap();
        insert_period(&conn, "P-EMPTY", "ALLOCATION", "ACTIVE").unwrap();
        insert_edition(&conn, "E1", "P-EMPTY", "Robotics", "THURSDAY", 16, 4).unwrap();
    }
    let api = api(&db_path);

    let report = api.run_allocation("P-EMPTY", false).await.unwrap();
    assert_eq!(report.allocations_created, 0);
    assert_eq!(report.students_allocated, 0);
    assert_eq!(report.rejection_count, 0);

    // 没有有效分配, 再次运行不构成冲突
    assert!(api.run_allocation("P-EMPTY", false).await.is_ok());
}

#[tokio::test]
async fn test_config_failure_aborts_before_writes() {
    let (_temp_file, db_path) = setup_standard();

    let err = api_with(&db_path, FailingConfig)
        .run_allocation("P1", false)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Config(_)));
    assert_eq!(rows(&db_path, "allocations"), 0);
}

#[tokio::test]
async fn test_seed_is_reported() {
    let (_temp_file, db_path) = setup_standard();

    let report = api_with(&db_path, MockConfig::with_seed(42))
        .run_allocation("P1", false)
        .await
        .unwrap();

    assert_eq!(report.seed, 42);
    assert_eq!(report.allocations_created, 3);
}

// ==========================================
// 查询与导出
// ==========================================

#[tokio::test]
async fn test_demand_summary_and_listing() {
    let (_temp_file, db_path) = setup_standard();
    let api = api(&db_path);

    let demand = api.demand_summary("P1").unwrap();
    assert_eq!(demand.len(), 5);
    assert_eq!(demand[0].school_code, "S-A");
    assert_eq!(demand[0].workshop_title, "Ceramics");
    assert_eq!(demand[0].total_requested, 3);

    api.run_allocation("P1", false).await.unwrap();

    let for_a = api.list_allocations("P1", Some("S-A"), None).unwrap();
    assert_eq!(for_a.len(), 1);
    assert_eq!(for_a[0].edition_id, "E-TUE");
    assert_eq!(for_a[0].assigned_seats, 4);
    assert_eq!(for_a[0].status, AllocationStatus::Provisional);

    let teachers = api.list_teacher_assignments("P1").unwrap();
    assert_eq!(teachers.len(), 2);
    assert!(teachers
        .iter()
        .any(|t| t.edition_id == "E-TUE" && t.teacher_id == "T-A2"));
}

#[tokio::test]
async fn test_edition_csv_export() {
    let (_temp_file, db_path) = setup_standard();
    let report = api(&db_path).run_allocation("P1", false).await.unwrap();

    let csv_file = tempfile::NamedTempFile::new().unwrap();
    AllocationApi::<MockConfig>::export_edition_csv(&report, csv_file.path()).unwrap();

    let content = std::fs::read_to_string(csv_file.path()).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("edition_id,workshop_title"));
    assert!(content.contains("E-TUE,Robotics,TUESDAY,16,4,12,1,1"));
}
