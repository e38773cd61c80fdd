// ==========================================
// 子组划分系统 - 引擎层
// ==========================================
// 职责: 实现划分规则引擎, 不拼 SQL
// 红线: Engine 不做 I/O, 规则无法满足时报告而非失败
// ==========================================

pub mod compatibility;
pub mod divider;
pub mod error;
pub mod partition;
pub mod preview_builder;
pub mod roster;
pub mod rule_evaluator;

// 重导出核心引擎
pub use compatibility::CompatibilityMatrix;
pub use divider::{DivisionOutcome, SubgroupDivider};
pub use error::{EngineError, EngineResult};
pub use partition::{GreedyAssigner, GroupRepairer, Partition, RepairOutcome};
pub use preview_builder::PreviewBuilder;
pub use roster::RosterBuilder;
pub use rule_evaluator::{
    count_condition_matches, member_matches_condition, member_matches_rule, RuleEvaluator,
};
