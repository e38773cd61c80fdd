// ==========================================
// 子组划分系统 - 命令行入口
// ==========================================
// 输出: 命令结果写 stdout (JSON/CSV), 日志写 stderr
// ==========================================

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use subgroup_planner::app::{get_default_db_path, AppState};
use subgroup_planner::config::DivisionConfig;
use subgroup_planner::db::{init_schema, open_sqlite_connection, read_schema_version};
use subgroup_planner::logging;

#[derive(Parser)]
#[command(name = "subgroup-planner", version, about = "子组划分系统")]
struct Cli {
    /// 数据库文件路径 (默认读取 SUBGROUP_PLANNER_DB_PATH 或用户数据目录)
    #[arg(long, global = true)]
    db: Option<String>,

    /// 以 JSON 行格式输出日志
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 生成划分预览 (创建 pending 任务)
    Generate {
        #[arg(long)]
        group: i64,
        /// 划分配置 JSON 文件
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        created_by: Option<i64>,
    },
    /// 确认预览并落库子组
    Confirm {
        #[arg(long)]
        group: i64,
        #[arg(long)]
        job: i64,
    },
    /// 撤销最近一次确认
    Undo {
        #[arg(long)]
        group: i64,
    },
    /// 导出 CSV (指定 --job 时导出该任务的预览)
    Export {
        #[arg(long)]
        group: i64,
        #[arg(long)]
        job: Option<i64>,
    },
    /// 列出父组的子组
    Subgroups {
        #[arg(long)]
        group: i64,
    },
    /// 列出父组的划分任务
    Jobs {
        #[arg(long)]
        group: i64,
    },
    /// 初始化数据库
    InitDb,
}

fn main() {
    let cli = Cli::parse();

    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("{} v{}", subgroup_planner::APP_NAME, subgroup_planner::VERSION);

    if let Err(e) = run(cli) {
        tracing::error!("命令执行失败: {:#}", e);
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    if let Commands::InitDb = cli.command {
        let conn = open_sqlite_connection(&db_path)
            .with_context(|| format!("无法打开数据库: {}", db_path))?;
        init_schema(&conn)?;
        let version = read_schema_version(&conn)?;
        return print_json(&serde_json::json!({
            "db_path": db_path,
            "schema_version": version,
        }));
    }

    let state = AppState::new(db_path)?;
    let api = &state.subgroup_api;

    match cli.command {
        Commands::Generate {
            group,
            config,
            created_by,
        } => {
            let raw = std::fs::read_to_string(&config)
                .with_context(|| format!("无法读取配置文件: {}", config.display()))?;
            let division_config = DivisionConfig::from_json(&raw)?;
            print_json(&api.generate(group, created_by, division_config)?)
        }
        Commands::Confirm { group, job } => print_json(&api.confirm(group, job)?),
        Commands::Undo { group } => print_json(&api.undo(group)?),
        Commands::Export { group, job } => {
            let csv = match job {
                Some(job_id) => api.export_preview_csv(group, job_id)?,
                None => api.export_subgroups_csv(group)?,
            };
            print!("{}", csv);
            Ok(())
        }
        Commands::Subgroups { group } => print_json(&api.list_subgroups(group)?),
        Commands::Jobs { group } => print_json(&api.list_jobs(group)?),
        Commands::InitDb => Ok(()),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
