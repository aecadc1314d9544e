// ==========================================
// 工作坊席位分配系统 - 命令行入口
// ==========================================
// 用法:
//   workshop-allocation run <period_id> [--force] [--db PATH] [--csv PATH]
//   workshop-allocation demand <period_id> [--db PATH]
//   workshop-allocation list <period_id> [school_id] [--db PATH]
// 输出: JSON（stdout）, 日志走 tracing（stderr）
// ==========================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use workshop_allocation::api::AllocationApi;
use workshop_allocation::config::ConfigManager;
use workshop_allocation::db::{get_default_db_path, init_schema, open_sqlite_connection};

#[derive(Parser, Debug)]
#[command(
    name = "workshop-allocation",
    about = "工作坊席位分配: 运行分配、查看需求汇总与分配结果",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// SQLite 数据库路径（默认位于平台数据目录）
    #[arg(long = "db", global = true)]
    db_path: Option<String>,
    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 对报名周期运行一次分配
    Run {
        period_id: String,
        /// 删除已存在的有效分配后重跑
        #[arg(long)]
        force: bool,
        /// 导出场次占用 CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// 分配前的需求汇总
    Demand { period_id: String },
    /// 列出分配结果与教师绑定
    List {
        period_id: String,
        school_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let db_path = args.db_path.unwrap_or_else(get_default_db_path);

    if args.json_logs {
        workshop_allocation::logging::init_json();
    } else {
        workshop_allocation::logging::init();
    }

    tracing::info!(
        version = workshop_allocation::VERSION,
        db_path = %db_path,
        "{} 启动",
        workshop_allocation::APP_NAME
    );

    if let Some(parent) = Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("无法创建数据目录: {}", parent.display()))?;
        }
    }

    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    init_schema(&conn).context("初始化 schema 失败")?;
    let conn = Arc::new(Mutex::new(conn));

    let config = ConfigManager::from_connection(conn.clone())
        .map_err(|e| anyhow::anyhow!("配置初始化失败: {}", e))?;
    let api = AllocationApi::new(conn, Arc::new(config));

    match args.command {
        Command::Run { period_id, force, csv } => {
            let report = api.run_allocation(&period_id, force).await?;
            if let Some(path) = csv {
                AllocationApi::<ConfigManager>::export_edition_csv(&report, &path)?;
                tracing::info!(path = %path.display(), "场次占用 CSV 已导出");
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Demand { period_id } => {
            let rows = api.demand_summary(&period_id)?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Command::List { period_id, school_id } => {
            let allocations = api.list_allocations(&period_id, school_id.as_deref(), None)?;
            let teachers = api.list_teacher_assignments(&period_id)?;
            let listing = serde_json::json!({
                "allocations": allocations,
                "teacher_assignments": teachers,
            });
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
    }

    Ok(())
}
