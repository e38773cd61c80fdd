use crate::config::DivisionConfig;
use crate::domain::member::Member;
use crate::engine::compatibility::CompatibilityMatrix;
use crate::engine::rule_evaluator::RuleEvaluator;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, instrument, trace};

use super::model::Partition;

/// 某成员的候选子组
#[derive(Debug, Clone, Copy)]
struct GroupCandidate {
    group_idx: usize,
    helps_min: bool,
    score: f64,
}

impl GroupCandidate {
    /// 排序键: 先 helps_min, 再 score
    fn rank(&self, other: &Self) -> Ordering {
        self.helps_min
            .cmp(&other.helps_min)
            .then_with(|| self.score.total_cmp(&other.score))
    }
}

// ==========================================
// GreedyAssigner - 贪心分配
// ==========================================
// 规则:
// 1) 按 availability_count 降序处理成员 (稳定排序, 同值保持名单顺序)
// 2) 候选子组: 未满员 + 加入后不超过任何条件上限 + 平均兼容度 >= 阈值
// 3) 按 (helps_min, score) 选最优; 完全相同时取序号较大的子组
// 4) 无候选时: require_all_members 则放入剩余容量最多的子组, 否则不分配
pub struct GreedyAssigner<'a> {
    roster: &'a [Member],
    matrix: &'a CompatibilityMatrix,
    evaluator: &'a RuleEvaluator,
    config: &'a DivisionConfig,
}

impl<'a> GreedyAssigner<'a> {
    pub fn new(
        roster: &'a [Member],
        matrix: &'a CompatibilityMatrix,
        evaluator: &'a RuleEvaluator,
        config: &'a DivisionConfig,
    ) -> Self {
        Self {
            roster,
            matrix,
            evaluator,
            config,
        }
    }

    /// 处理顺序: 名单下标按可用时段数降序
    pub fn processing_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.roster.len()).collect();
        order.sort_by(|&a, &b| {
            self.roster[b]
                .availability_count
                .cmp(&self.roster[a].availability_count)
        });
        order
    }

    #[instrument(skip(self), fields(
        members = self.roster.len(),
        num_groups = self.config.num_groups,
        conditions = self.evaluator.conditions().len()
    ))]
    pub fn assign(&self) -> Partition {
        let mut partition = Partition::with_groups(self.config.num_groups);
        let mut assigned_users: HashSet<i64> = HashSet::new();
        let allow_multiple = self.config.allow_multiple_membership;

        for roster_idx in self.processing_order() {
            let member = &self.roster[roster_idx];
            if !allow_multiple && assigned_users.contains(&member.id) {
                continue;
            }

            let best = self
                .candidates(&partition, member)
                .into_iter()
                .max_by(|a, b| a.rank(b));

            let target = match best {
                Some(candidate) => {
                    trace!(
                        member_id = member.id,
                        group = candidate.group_idx,
                        helps_min = candidate.helps_min,
                        score = candidate.score,
                        "成员分配到候选子组"
                    );
                    Some(candidate.group_idx)
                }
                None if self.config.require_all_members => {
                    let fallback = self.fallback_group(&partition);
                    debug!(
                        member_id = member.id,
                        group = fallback,
                        "无候选子组, 强制分配到剩余容量最多的子组"
                    );
                    Some(fallback)
                }
                None => {
                    debug!(member_id = member.id, "无候选子组, 成员保持未分配");
                    None
                }
            };

            match target {
                Some(group_idx) => {
                    partition.groups[group_idx].push(roster_idx);
                    if !allow_multiple {
                        assigned_users.insert(member.id);
                    }
                }
                None => partition.unassigned.push(roster_idx),
            }
        }

        debug!(
            assigned = partition.assigned_count(),
            unassigned = partition.unassigned.len(),
            "贪心分配完成"
        );
        partition
    }

    /// 计算成员的候选子组列表 (按子组序号顺序)
    fn candidates(&self, partition: &Partition, member: &Member) -> Vec<GroupCandidate> {
        let mut candidates = Vec::new();

        for (group_idx, group) in partition.groups.iter().enumerate() {
            if let Some(max_size) = self.config.max_group_size {
                if group.len() >= max_size {
                    continue;
                }
            }

            let current: Vec<&Member> = group.iter().map(|&i| &self.roster[i]).collect();
            let mut with_member = current.clone();
            with_member.push(member);

            let status = self.evaluator.validate_group_rules(&with_member);
            let conditions = self.evaluator.conditions();

            // 加入后不得超过任何条件上限
            let exceeds_max = status
                .iter()
                .zip(conditions)
                .any(|(s, c)| c.exceeds_max(s.count));
            if exceeds_max {
                continue;
            }

            // 加入后仍未超过下限的条件, 说明该组仍需要此类成员
            let helps_min = status.iter().any(|s| s.min > 0 && s.count <= s.min as usize);

            let score = self.matrix.average_with(member.id, &current);
            if score < self.config.compatibility_threshold {
                continue;
            }

            candidates.push(GroupCandidate {
                group_idx,
                helps_min,
                score,
            });
        }

        candidates
    }

    /// 兜底子组: 未满员子组中人数最少者 (同值取序号小者); 全部满员时为 0
    fn fallback_group(&self, partition: &Partition) -> usize {
        partition
            .groups
            .iter()
            .enumerate()
            .min_by_key(|(_, group)| match self.config.max_group_size {
                Some(max_size) if group.len() >= max_size => usize::MAX,
                _ => group.len(),
            })
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }
}
