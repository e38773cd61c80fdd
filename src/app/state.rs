// ==========================================
// 子组划分系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接与API实例
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use rusqlite::Connection;

use crate::api::SubgroupApi;
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::{DivisionJobRepository, MemberRepository, SubGroupRepository};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "SUBGROUP_PLANNER_DB_PATH";

/// 应用状态
///
/// 所有仓储共享同一个连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 子组划分API
    pub subgroup_api: Arc<SubgroupApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 打开数据库 (必要时建表) 并创建AppState
    pub fn new(db_path: String) -> anyhow::Result<Self> {
        tracing::info!("初始化AppState, 数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .with_context(|| format!("无法打开数据库: {}", db_path))?;
        init_schema(&conn).context("数据库建表失败")?;

        Self::from_connection(db_path, Arc::new(Mutex::new(conn)))
    }

    /// 基于已有连接装配各层实例
    pub fn from_connection(db_path: String, conn: Arc<Mutex<Connection>>) -> anyhow::Result<Self> {
        // ==========================================
        // 初始化Repository层
        // ==========================================
        let member_repo = Arc::new(MemberRepository::new(conn.clone()));
        let job_repo = Arc::new(DivisionJobRepository::new(conn.clone()));
        let subgroup_repo = Arc::new(SubGroupRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn).context("无法创建ConfigManager")?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let subgroup_api = Arc::new(SubgroupApi::new(
            member_repo,
            job_repo,
            subgroup_repo,
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            subgroup_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先读取环境变量 SUBGROUP_PLANNER_DB_PATH, 否则使用用户数据目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./subgroup_planner.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("subgroup-planner");
        // 目录创建失败时由打开数据库报错
        std::fs::create_dir_all(&dir).ok();
        path = dir.join("subgroup_planner.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_on_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("planner.db").to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).unwrap();

        assert_eq!(state.db_path, db_path);
        assert!(state.subgroup_api.list_jobs(1).unwrap().is_empty());
        // 重复打开同一库 (建表幂等)
        assert!(AppState::new(db_path).is_ok());
    }
}
