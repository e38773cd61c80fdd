// ==========================================
// 子组划分系统 - 类别规则评估引擎
// ==========================================
// 职责: 判断成员是否满足条件, 统计组内满足条件的人数
// 红线: 规则在报告/修复时按"展开后的单个条件"粒度处理
// ==========================================

use crate::domain::member::Member;
use crate::domain::rule::{Condition, ConditionStatus, Rule};
use crate::domain::types::Operator;
use std::collections::BTreeSet;

/// 成员类别是否满足单个条件
///
/// - AND: 条件类别 ⊆ 成员类别
/// - OR:  条件类别 ∩ 成员类别 非空
/// - 未识别运算符: 不匹配
pub fn member_matches_condition(member_categories: &BTreeSet<String>, condition: &Condition) -> bool {
    match condition.operator {
        Operator::And => condition
            .categories
            .iter()
            .all(|c| member_categories.contains(c)),
        Operator::Or => condition
            .categories
            .iter()
            .any(|c| member_categories.contains(c)),
        Operator::Unknown(_) => false,
    }
}

/// 成员是否满足规则内的全部条件
pub fn member_matches_rule(member_categories: &BTreeSet<String>, rule: &Rule) -> bool {
    rule.conditions
        .iter()
        .all(|condition| member_matches_condition(member_categories, condition))
}

/// 组内满足条件的成员数
pub fn count_condition_matches(group: &[&Member], condition: &Condition) -> usize {
    group
        .iter()
        .filter(|m| member_matches_condition(&m.categories, condition))
        .count()
}

// ==========================================
// RuleEvaluator - 规则评估器
// ==========================================
// 构造时将所有规则的条件按顺序展开为单一列表
#[derive(Debug, Clone, Default)]
pub struct RuleEvaluator {
    conditions: Vec<Condition>,
}

impl RuleEvaluator {
    pub fn new(rules: &[Rule]) -> Self {
        let conditions = rules
            .iter()
            .flat_map(|rule| rule.conditions.iter().cloned())
            .collect();
        Self { conditions }
    }

    /// 展开后的条件列表
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// 校验组的规则满足情况, 每个展开后的条件一条记录, 顺序与展开顺序一致
    pub fn validate_group_rules(&self, group: &[&Member]) -> Vec<ConditionStatus> {
        self.conditions
            .iter()
            .enumerate()
            .map(|(idx, condition)| {
                let count = count_condition_matches(group, condition);
                ConditionStatus {
                    rule: idx + 1,
                    fulfilled: condition.is_within_bounds(count),
                    count,
                    min: condition.min,
                    max: condition.max,
                    categories: condition.categories.clone(),
                    operator: condition.operator.clone(),
                }
            })
            .collect()
    }
}
