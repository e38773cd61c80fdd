use crate::config::config_manager::DEFAULT_REPAIR_MAX_ITERATIONS;
use crate::domain::member::Member;
use crate::engine::rule_evaluator::{count_condition_matches, member_matches_condition, RuleEvaluator};
use tracing::{debug, info, instrument};

use super::model::Partition;

/// 修复阶段结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairOutcome {
    pub iterations: usize,
    pub relocations: usize,
    /// 最后一轮扫描无迁移 (提前结束)
    pub converged: bool,
}

/// 一次迁移: 名单下标 + 源组 + 目标组
#[derive(Debug, Clone, Copy)]
struct Relocation {
    roster_idx: usize,
    from: usize,
    to: usize,
    position: usize,
}

// ==========================================
// GroupRepairer - 有界修复
// ==========================================
// 每轮: 按展开顺序扫描条件 -> 子组, 找到低于下限的子组后,
//       在其他子组中找第一个满足该条件的成员, 目标组有空位则迁移 (移动, 非复制)
// 每轮最多迁移一次, 迁移后从第一个条件重新扫描
// 终止: 一轮无迁移, 或迭代上限耗尽; 迭代上限是唯一的终止保证
pub struct GroupRepairer {
    max_iterations: usize,
}

impl GroupRepairer {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    #[instrument(skip_all, fields(max_iterations = self.max_iterations))]
    pub fn repair(
        &self,
        partition: &mut Partition,
        roster: &[Member],
        evaluator: &RuleEvaluator,
        max_group_size: Option<usize>,
    ) -> RepairOutcome {
        let mut outcome = RepairOutcome::default();

        while outcome.iterations < self.max_iterations {
            outcome.iterations += 1;

            match self.find_relocation(partition, roster, evaluator, max_group_size) {
                Some(relocation) => {
                    partition.groups[relocation.from].remove(relocation.position);
                    partition.groups[relocation.to].push(relocation.roster_idx);
                    outcome.relocations += 1;
                    debug!(
                        member_id = roster[relocation.roster_idx].id,
                        from = relocation.from,
                        to = relocation.to,
                        iteration = outcome.iterations,
                        "修复迁移成员"
                    );
                }
                None => {
                    outcome.converged = true;
                    break;
                }
            }
        }

        info!(
            iterations = outcome.iterations,
            relocations = outcome.relocations,
            converged = outcome.converged,
            "修复阶段完成"
        );
        outcome
    }

    /// 单轮扫描, 返回第一个可执行的迁移
    fn find_relocation(
        &self,
        partition: &Partition,
        roster: &[Member],
        evaluator: &RuleEvaluator,
        max_group_size: Option<usize>,
    ) -> Option<Relocation> {
        for condition in evaluator.conditions() {
            let min_required = condition.min as usize;

            for (group_idx, group) in partition.groups.iter().enumerate() {
                let members: Vec<&Member> = group.iter().map(|&i| &roster[i]).collect();
                if count_condition_matches(&members, condition) >= min_required {
                    continue;
                }

                // 目标组已满员, 无法迁入
                if matches!(max_group_size, Some(max) if group.len() >= max) {
                    continue;
                }

                for (other_idx, other) in partition.groups.iter().enumerate() {
                    if other_idx == group_idx {
                        continue;
                    }
                    let found = other
                        .iter()
                        .position(|&i| member_matches_condition(&roster[i].categories, condition));
                    if let Some(position) = found {
                        return Some(Relocation {
                            roster_idx: other[position],
                            from: other_idx,
                            to: group_idx,
                            position,
                        });
                    }
                }
            }
        }
        None
    }
}

impl Default for GroupRepairer {
    fn default() -> Self {
        Self::new(DEFAULT_REPAIR_MAX_ITERATIONS)
    }
}
