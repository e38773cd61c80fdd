// ==========================================
// 子组划分系统 - 预览构建
// ==========================================
// 职责: 将最终划分汇总为预览结构
// 输出: 各子组兼容度均值 + 条件满足情况 + 未满足条件序号 + 覆盖统计
// ==========================================

use crate::config::EngineSettings;
use crate::domain::member::{Member, PreviewMember};
use crate::domain::preview::{Preview, PreviewGroup};
use crate::engine::compatibility::CompatibilityMatrix;
use crate::engine::partition::Partition;
use crate::engine::rule_evaluator::RuleEvaluator;
use std::collections::BTreeSet;
use tracing::debug;

/// 按小数位四舍五入
///
/// 小数位过大导致缩放溢出时原样返回, 保证结果为有限数
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let exponent = match i32::try_from(decimals) {
        Ok(e) => e,
        Err(_) => return value,
    };
    let factor = 10f64.powi(exponent);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

pub struct PreviewBuilder {
    name_prefix: String,
    precision: u32,
}

impl PreviewBuilder {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            name_prefix: settings.group_name_prefix.clone(),
            precision: settings.compat_precision,
        }
    }

    /// 构建预览
    ///
    /// 空子组不输出; 子组 id/name 使用其在划分中的序号 (从 1 开始), 因此跳过空组后序号可能不连续
    pub fn build(
        &self,
        partition: &Partition,
        roster: &[Member],
        matrix: &CompatibilityMatrix,
        evaluator: &RuleEvaluator,
    ) -> Preview {
        let mut groups = Vec::new();
        let mut unfulfilled: BTreeSet<usize> = BTreeSet::new();

        for idx in 0..partition.num_groups() {
            let members = partition.members(roster, idx);
            if members.is_empty() {
                continue;
            }

            let compatibility_avg = matrix.group_average(&members);
            let rules_status = evaluator.validate_group_rules(&members);

            unfulfilled.extend(rules_status.iter().filter(|s| !s.fulfilled).map(|s| s.rule));

            groups.push(PreviewGroup {
                id: format!("preview-{}", idx + 1),
                name: format!("{} {}", self.name_prefix, idx + 1),
                members: members.iter().map(|m| PreviewMember::from(*m)).collect(),
                compatibility_avg: round_to(compatibility_avg, self.precision),
                rules_status,
            });
        }

        let total_members_assigned = groups.iter().map(|g| g.members.len()).sum();
        let preview = Preview {
            groups,
            unfulfilled_rules: unfulfilled.into_iter().collect(),
            total_members_assigned,
            total_members_available: roster.len(),
        };

        debug!(
            groups = preview.groups.len(),
            assigned = preview.total_members_assigned,
            available = preview.total_members_available,
            unfulfilled = ?preview.unfulfilled_rules,
            "预览构建完成"
        );
        preview
    }
}
