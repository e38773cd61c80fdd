// ==========================================
// 子组划分系统 - 核心库
// ==========================================
// 按时间兼容度与类别规则, 将父组成员拆分为若干子组
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 划分规则
pub mod engine;

// 配置层 - 划分配置与系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{JobStatus, Operator};

// 领域实体
pub use domain::{
    Condition, ConditionStatus, DivisionJob, Member, Preview, PreviewGroup, PreviewMember, Rule,
    SlotId, SubGroup, SubGroupMember,
};

// 配置
pub use config::{ConfigError, DivisionConfig, EngineSettings};

// 引擎
pub use engine::{EngineError, SubgroupDivider};

// API
pub use api::{ApiError, SubgroupApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "子组划分系统";
