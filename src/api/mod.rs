// ==========================================
// 子组划分系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供命令行入口调用
// ==========================================

pub mod error;
pub mod export;
pub mod subgroup_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use subgroup_api::{ConfirmResponse, GenerateResponse, SubgroupApi, UndoResponse};
