// ==========================================
// 子组划分系统 - 配置管理器
// ==========================================
// 职责: 引擎参数的加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// 修复阶段默认迭代上限
pub const DEFAULT_REPAIR_MAX_ITERATIONS: usize = 50;

/// 预览子组默认名称前缀
pub const DEFAULT_GROUP_NAME_PREFIX: &str = "Subgroup";

/// 兼容度均值默认保留小数位
pub const DEFAULT_COMPAT_PRECISION: u32 = 3;

/// 兼容度均值最大保留小数位 (f64 有效位数)
pub const MAX_COMPAT_PRECISION: u32 = 15;

// ==========================================
// EngineSettings - 引擎参数快照
// ==========================================
// 每次请求读取一次, 按值传入引擎
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub repair_max_iterations: usize,
    pub group_name_prefix: String,
    pub compat_precision: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            repair_max_iterations: DEFAULT_REPAIR_MAX_ITERATIONS,
            group_name_prefix: DEFAULT_GROUP_NAME_PREFIX.to_string(),
            compat_precision: DEFAULT_COMPAT_PRECISION,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值 (存在则覆盖)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        debug!(key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照
    pub fn get_config_snapshot(&self) -> RepositoryResult<HashMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut snapshot = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    /// 读取数值配置, 缺失或无法解析时回退到默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: std::str::FromStr + Copy + std::fmt::Debug,
    {
        match self.get_global_config_value(key)? {
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    warn!(key = key, raw = %raw, default = ?default, "配置值无法解析, 使用默认值");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    /// 加载引擎参数快照
    pub fn get_engine_settings(&self) -> RepositoryResult<EngineSettings> {
        let repair_max_iterations = self
            .get_parsed_or_default(config_keys::REPAIR_MAX_ITERATIONS, DEFAULT_REPAIR_MAX_ITERATIONS)?;
        let mut compat_precision =
            self.get_parsed_or_default(config_keys::COMPAT_PRECISION, DEFAULT_COMPAT_PRECISION)?;
        if compat_precision > MAX_COMPAT_PRECISION {
            warn!(
                key = config_keys::COMPAT_PRECISION,
                value = compat_precision,
                max = MAX_COMPAT_PRECISION,
                default = DEFAULT_COMPAT_PRECISION,
                "小数位超出上限, 使用默认值"
            );
            compat_precision = DEFAULT_COMPAT_PRECISION;
        }
        let group_name_prefix = self
            .get_global_config_value(config_keys::GROUP_NAME_PREFIX)?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_GROUP_NAME_PREFIX.to_string());

        Ok(EngineSettings {
            repair_max_iterations,
            group_name_prefix,
            compat_precision,
        })
    }
}

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    // 修复阶段
    pub const REPAIR_MAX_ITERATIONS: &str = "division/repair_max_iterations";

    // 预览
    pub const GROUP_NAME_PREFIX: &str = "division/group_name_prefix";
    pub const COMPAT_PRECISION: &str = "division/compat_precision";
}
