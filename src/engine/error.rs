// ==========================================
// 子组划分系统 - 引擎层错误类型
// ==========================================

use crate::config::ConfigError;
use thiserror::Error;

/// 引擎层错误
///
/// 规则无法满足不属于错误, 通过预览中的 unfulfilled_rules 报告
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    #[error("划分计算失败: {0}")]
    Internal(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
