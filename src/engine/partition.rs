// ==========================================
// 子组划分系统 - 划分引擎
// ==========================================
// 职责: 贪心分配 + 有界修复
// 输入: 成员名单 + 兼容度矩阵 + 划分配置
// 输出: Partition (N 个子组, 记录名单下标)
// ==========================================
// 注: 启发式算法, 不保证全局最优;
//     处理顺序 (可用时段数降序, 只处理一次) 决定结果, 不可随意调整
// ==========================================

mod greedy;
mod model;
mod repair;

#[cfg(test)]
mod tests;

pub use greedy::GreedyAssigner;
pub use model::Partition;
pub use repair::{GroupRepairer, RepairOutcome};
