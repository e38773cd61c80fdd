// ==========================================
// 子组划分系统 - 划分编排器
// ==========================================
// 流程: 配置校验 -> 兼容度矩阵 -> 贪心分配 -> 有界修复 -> 预览
// ==========================================
// 纯同步计算, 无 I/O; 每次请求新建实例, 不跨请求持有可变状态
// ==========================================

use crate::config::{DivisionConfig, EngineSettings};
use crate::domain::member::Member;
use crate::domain::preview::Preview;
use crate::engine::compatibility::CompatibilityMatrix;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::partition::{GreedyAssigner, GroupRepairer, Partition, RepairOutcome};
use crate::engine::preview_builder::PreviewBuilder;
use crate::engine::rule_evaluator::RuleEvaluator;
use std::collections::HashSet;
use tracing::{info, instrument};

/// 一次划分运行的完整结果
#[derive(Debug, Clone)]
pub struct DivisionOutcome {
    pub preview: Preview,
    pub partition: Partition,
    pub repair: RepairOutcome,
}

// ==========================================
// SubgroupDivider - 划分编排器
// ==========================================
pub struct SubgroupDivider {
    settings: EngineSettings,
}

impl SubgroupDivider {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    /// 执行一次划分
    ///
    /// # 错误
    /// - 配置无效: 在任何计算前返回
    /// - 内部一致性检查失败: 返回 Internal
    ///
    /// 规则无法满足不会失败, 只体现在 preview.unfulfilled_rules 中
    #[instrument(skip_all, fields(
        members = roster.len(),
        num_groups = config.num_groups,
        threshold = config.compatibility_threshold
    ))]
    pub fn divide(&self, roster: &[Member], config: &DivisionConfig) -> EngineResult<DivisionOutcome> {
        config.validate()?;

        let evaluator = RuleEvaluator::new(&config.category_rules);
        let matrix = CompatibilityMatrix::build(roster);

        let mut partition = GreedyAssigner::new(roster, &matrix, &evaluator, config).assign();

        let repair = GroupRepairer::new(self.settings.repair_max_iterations).repair(
            &mut partition,
            roster,
            &evaluator,
            config.max_group_size,
        );

        self.check_partition(&partition, roster, config)?;

        let preview = PreviewBuilder::new(&self.settings).build(&partition, roster, &matrix, &evaluator);

        info!(
            groups = preview.groups.len(),
            assigned = preview.total_members_assigned,
            available = preview.total_members_available,
            unfulfilled = preview.unfulfilled_rules.len(),
            repair_relocations = repair.relocations,
            "划分完成"
        );

        Ok(DivisionOutcome {
            preview,
            partition,
            repair,
        })
    }

    /// 结果一致性检查
    fn check_partition(
        &self,
        partition: &Partition,
        roster: &[Member],
        config: &DivisionConfig,
    ) -> EngineResult<()> {
        if partition.num_groups() != config.num_groups {
            return Err(EngineError::Internal(format!(
                "子组数量不一致: expected={}, actual={}",
                config.num_groups,
                partition.num_groups()
            )));
        }

        if partition.groups.iter().flatten().any(|&i| i >= roster.len()) {
            return Err(EngineError::Internal("子组包含越界的成员下标".to_string()));
        }

        if !config.allow_multiple_membership {
            let mut seen = HashSet::new();
            for &idx in partition.groups.iter().flatten() {
                if !seen.insert(roster[idx].id) {
                    return Err(EngineError::Internal(format!(
                        "成员 {} 出现在多个子组中",
                        roster[idx].id
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for SubgroupDivider {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}
