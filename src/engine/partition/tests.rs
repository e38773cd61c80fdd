use super::*;
use crate::config::DivisionConfig;
use crate::domain::member::{Member, SlotId};
use crate::domain::rule::{Condition, Rule};
use crate::domain::types::Operator;
use crate::engine::compatibility::CompatibilityMatrix;
use crate::engine::rule_evaluator::RuleEvaluator;
use std::collections::BTreeSet;

// ==========================================
// 测试辅助函数
// ==========================================

/// 创建测试成员; 时段用 (weekday, hour) 表示
fn create_test_member(id: i64, categories: &[&str], slots: &[(u8, f64)]) -> Member {
    let availability_slots: BTreeSet<SlotId> =
        slots.iter().map(|(d, h)| SlotId::from_hour(*d, *h)).collect();
    Member {
        id,
        member_id: 100 + id,
        name: format!("member-{}", id),
        email: format!("member{}@example.com", id),
        categories: categories.iter().map(|c| c.to_string()).collect(),
        availability_count: slots.len(),
        availability_slots,
    }
}

/// 运行贪心分配, 返回以成员ID表示的子组
fn run_greedy(roster: &[Member], config: &DivisionConfig) -> (Partition, Vec<Vec<i64>>) {
    let evaluator = RuleEvaluator::new(&config.category_rules);
    let matrix = CompatibilityMatrix::build(roster);
    let partition = GreedyAssigner::new(roster, &matrix, &evaluator, config).assign();
    let ids = ids_of(&partition, roster);
    (partition, ids)
}

fn ids_of(partition: &Partition, roster: &[Member]) -> Vec<Vec<i64>> {
    partition
        .groups
        .iter()
        .map(|g| g.iter().map(|&i| roster[i].id).collect())
        .collect()
}

fn rule_a(min: u32, max: Option<u32>) -> Vec<Rule> {
    let mut condition = Condition::new(&["A"], Operator::And).with_min(min);
    condition.max = max;
    vec![Rule::new(vec![condition])]
}

// ==========================================
// 贪心分配
// ==========================================

#[test]
fn test_processing_order_by_availability_desc_stable() {
    let roster = vec![
        create_test_member(1, &[], &[(0, 9.0)]),
        create_test_member(2, &[], &[(0, 9.0), (0, 10.0), (0, 11.0)]),
        create_test_member(3, &[], &[(1, 9.0)]),
        create_test_member(4, &[], &[(1, 9.0), (1, 10.0)]),
    ];
    let config = DivisionConfig::new(2);
    let evaluator = RuleEvaluator::new(&[]);
    let matrix = CompatibilityMatrix::build(&roster);
    let assigner = GreedyAssigner::new(&roster, &matrix, &evaluator, &config);

    // 同为 1 个时段的成员 1 与 3 保持名单顺序
    assert_eq!(assigner.processing_order(), vec![1, 3, 0, 2]);
}

#[test]
fn test_four_members_two_groups_no_rules() {
    let roster: Vec<Member> = (1..=4).map(|id| create_test_member(id, &[], &[])).collect();
    let config = DivisionConfig::new(2);

    let (partition, ids) = run_greedy(&roster, &config);

    assert_eq!(partition.num_groups(), 2);
    assert_eq!(partition.assigned_count(), 4);
    assert!(partition.unassigned.is_empty());
    // 得分完全相同时取序号较大的子组
    assert_eq!(ids, vec![vec![2], vec![1, 3, 4]]);
}

#[test]
fn test_similar_schedules_grouped_together() {
    let roster = vec![
        create_test_member(1, &[], &[(0, 9.0), (0, 10.0)]),
        create_test_member(2, &[], &[(0, 9.0), (0, 10.0)]),
        create_test_member(3, &[], &[(5, 20.0)]),
    ];
    let (_, ids) = run_greedy(&roster, &DivisionConfig::new(2));
    assert_eq!(ids, vec![vec![3], vec![1, 2]]);
}

#[test]
fn test_helps_min_preferred_over_compatibility() {
    let roster = vec![
        create_test_member(1, &["A"], &[(0, 9.0), (0, 10.0), (0, 11.0)]),
        create_test_member(2, &[], &[(3, 9.0), (3, 10.0)]),
        create_test_member(3, &["A"], &[(0, 9.0)]),
    ];
    let config = DivisionConfig::new(2).with_rules(rule_a(1, None));

    let (_, ids) = run_greedy(&roster, &config);

    // 成员 3 与成员 1 时间更兼容, 但子组 0 仍缺少 A 类成员
    assert_eq!(ids, vec![vec![2, 3], vec![1]]);
}

#[test]
fn test_rule_max_is_never_exceeded_when_alternative_exists() {
    let roster = vec![
        create_test_member(1, &["A"], &[]),
        create_test_member(2, &["A"], &[]),
        create_test_member(3, &[], &[]),
    ];
    let config = DivisionConfig::new(2).with_rules(rule_a(0, Some(1)));

    let (_, ids) = run_greedy(&roster, &config);
    assert_eq!(ids, vec![vec![2], vec![1, 3]]);
}

#[test]
fn test_max_group_size_one_member_per_group() {
    let roster: Vec<Member> = (1..=3)
        .map(|id| create_test_member(id, &[], &[(0, 9.0)]))
        .collect();
    let config = DivisionConfig::new(3).with_max_group_size(1);

    let (partition, ids) = run_greedy(&roster, &config);

    assert!(partition.groups.iter().all(|g| g.len() == 1));
    assert_eq!(ids, vec![vec![3], vec![2], vec![1]]);
}

#[test]
fn test_threshold_leaves_member_unassigned() {
    let roster = vec![
        create_test_member(1, &[], &[(0, 9.0), (0, 10.0)]),
        create_test_member(2, &[], &[(4, 9.0)]),
    ];
    let config = DivisionConfig::new(1)
        .with_threshold(0.5)
        .with_require_all_members(false);

    let (partition, ids) = run_greedy(&roster, &config);

    assert_eq!(ids, vec![vec![1]]);
    assert_eq!(partition.unassigned, vec![1]);
}

#[test]
fn test_require_all_members_forces_assignment() {
    let roster = vec![
        create_test_member(1, &[], &[(0, 9.0), (0, 10.0)]),
        create_test_member(2, &[], &[(4, 9.0)]),
    ];
    let config = DivisionConfig::new(1).with_threshold(0.5);

    let (partition, ids) = run_greedy(&roster, &config);

    assert_eq!(ids, vec![vec![1, 2]]);
    assert!(partition.unassigned.is_empty());
}

#[test]
fn test_fallback_ignores_rule_ceiling() {
    let roster = vec![
        create_test_member(1, &["A"], &[]),
        create_test_member(2, &[], &[]),
    ];
    let config = DivisionConfig::new(2).with_rules(rule_a(0, Some(0)));

    let (_, ids) = run_greedy(&roster, &config);

    // 成员 1 无候选, 兜底进入第一个最小子组; 成员 2 不能进入含 A 的子组
    assert_eq!(ids, vec![vec![1], vec![2]]);
}

#[test]
fn test_fallback_all_groups_full_uses_first_group() {
    let roster = vec![
        create_test_member(1, &[], &[]),
        create_test_member(2, &[], &[]),
        create_test_member(3, &[], &[]),
    ];
    let config = DivisionConfig::new(2).with_max_group_size(1);

    let (partition, ids) = run_greedy(&roster, &config);

    // 超出人数上限也要保证全员覆盖
    assert_eq!(ids, vec![vec![2, 3], vec![1]]);
    assert_eq!(partition.assigned_count(), 3);
}

#[test]
fn test_fallback_picks_smallest_group() {
    let roster = vec![
        create_test_member(1, &[], &[(0, 9.0)]),
        create_test_member(2, &[], &[(1, 9.0)]),
        create_test_member(3, &[], &[(2, 9.0)]),
    ];
    let config = DivisionConfig::new(2)
        .with_max_group_size(2)
        .with_threshold(0.9);

    let (_, ids) = run_greedy(&roster, &config);

    // 1 -> 组1 (空组并列取大序号); 2 -> 组0 (唯一空组);
    // 3 无候选, 兜底到人数最少且未满的组 (组0, 并列取小序号)
    assert_eq!(ids, vec![vec![2, 3], vec![1]]);
}

#[test]
fn test_duplicate_user_only_assigned_once() {
    let mut duplicate = create_test_member(1, &[], &[]);
    duplicate.member_id = 999;
    let roster = vec![create_test_member(1, &[], &[]), duplicate];

    let (partition, _) = run_greedy(&roster, &DivisionConfig::new(2));
    assert_eq!(partition.assigned_count(), 1);

    let config = DivisionConfig::new(2).with_multiple_membership(true);
    let (partition, _) = run_greedy(&roster, &config);
    assert_eq!(partition.assigned_count(), 2);
}

// ==========================================
// 有界修复
// ==========================================

#[test]
fn test_repair_relocates_to_deficient_group() {
    let roster = vec![
        create_test_member(1, &["A"], &[]),
        create_test_member(2, &["A"], &[]),
        create_test_member(3, &[], &[]),
    ];
    let evaluator = RuleEvaluator::new(&rule_a(1, None));
    let mut partition = Partition {
        groups: vec![vec![0, 1], vec![2]],
        unassigned: Vec::new(),
    };

    let outcome = GroupRepairer::default().repair(&mut partition, &roster, &evaluator, None);

    assert_eq!(ids_of(&partition, &roster), vec![vec![2], vec![3, 1]]);
    assert_eq!(outcome.relocations, 1);
    assert_eq!(outcome.iterations, 2);
    assert!(outcome.converged);
}

#[test]
fn test_repair_respects_target_capacity() {
    let roster = vec![
        create_test_member(1, &["A"], &[]),
        create_test_member(2, &["A"], &[]),
        create_test_member(3, &[], &[]),
    ];
    let evaluator = RuleEvaluator::new(&rule_a(1, None));
    let mut partition = Partition {
        groups: vec![vec![0, 1], vec![2]],
        unassigned: Vec::new(),
    };

    let outcome = GroupRepairer::default().repair(&mut partition, &roster, &evaluator, Some(1));

    assert_eq!(ids_of(&partition, &roster), vec![vec![1, 2], vec![3]]);
    assert_eq!(outcome.relocations, 0);
    assert!(outcome.converged);
}

#[test]
fn test_repair_oscillation_stops_at_iteration_cap() {
    // 唯一的 A 类成员在两个都需要它的子组之间来回迁移, 只能由迭代上限终止
    let roster = vec![
        create_test_member(1, &["A"], &[]),
        create_test_member(2, &[], &[]),
        create_test_member(3, &[], &[]),
    ];
    let evaluator = RuleEvaluator::new(&rule_a(1, None));
    let mut partition = Partition {
        groups: vec![vec![1], vec![0, 2]],
        unassigned: Vec::new(),
    };

    let outcome = GroupRepairer::new(3).repair(&mut partition, &roster, &evaluator, None);

    assert_eq!(outcome.iterations, 3);
    assert_eq!(outcome.relocations, 3);
    assert!(!outcome.converged);
    // 奇数次迁移后停在子组 0
    assert_eq!(ids_of(&partition, &roster), vec![vec![2, 1], vec![3]]);
}

#[test]
fn test_repair_without_rules_is_noop() {
    let roster = vec![create_test_member(1, &[], &[])];
    let evaluator = RuleEvaluator::new(&[]);
    let mut partition = Partition {
        groups: vec![vec![0], vec![]],
        unassigned: Vec::new(),
    };

    let outcome = GroupRepairer::default().repair(&mut partition, &roster, &evaluator, None);

    assert_eq!(outcome.relocations, 0);
    assert!(outcome.converged);
    assert_eq!(partition.groups, vec![vec![0], vec![]]);
}

#[test]
fn test_partition_helpers() {
    let roster = vec![create_test_member(1, &[], &[]), create_test_member(2, &[], &[])];
    let partition = Partition {
        groups: vec![vec![1], vec![0, 1]],
        unassigned: Vec::new(),
    };
    assert_eq!(partition.assigned_count(), 3);
    assert_eq!(partition.groups_of(1), vec![0, 1]);
    assert_eq!(partition.members(&roster, 1).len(), 2);
    assert!(partition.members(&roster, 5).is_empty());
}
