// ==========================================
// 子组划分系统 - 配置层
// ==========================================
// 职责: 划分请求配置 + 引擎参数管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod division_config;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager, EngineSettings};
pub use division_config::{ConfigError, DivisionConfig};
