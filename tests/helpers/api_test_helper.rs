// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用测试环境
// ==========================================

#[path = "../test_helpers.rs"]
pub mod test_helpers;

use rusqlite::Connection;
use std::error::Error;
use std::sync::Arc;
use tempfile::NamedTempFile;

use subgroup_planner::api::SubgroupApi;
use subgroup_planner::app::AppState;

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 持有临时数据库文件 + 装配好的 AppState
pub struct ApiTestEnv {
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub state: AppState,
}

impl ApiTestEnv {
    /// 创建测试环境 (空库, 已建表)
    pub fn new() -> Result<Self, Box<dyn Error>> {
        subgroup_planner::logging::init_test();

        let (temp_file, db_path) = test_helpers::create_test_db()?;
        let state = AppState::new(db_path.clone())?;

        Ok(Self {
            _temp_file: temp_file,
            db_path,
            state,
        })
    }

    pub fn api(&self) -> Arc<SubgroupApi> {
        self.state.subgroup_api.clone()
    }

    /// 额外的连接, 用于写入测试数据和直接查询
    pub fn conn(&self) -> Result<Connection, Box<dyn Error>> {
        test_helpers::open_conn(&self.db_path)
    }

    /// 查询表行数
    pub fn count_rows(&self, table: &str) -> Result<i64, Box<dyn Error>> {
        let conn = self.conn()?;
        let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }
}
