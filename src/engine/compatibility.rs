// ==========================================
// 子组划分系统 - 兼容度计算引擎
// ==========================================
// 职责: 基于可用时段重叠 (Jaccard) 计算成员两两兼容度
// 输入: 成员名单 (含 availability_slots)
// 输出: 对称兼容度矩阵, 只读
// ==========================================
// 复杂度 O(M²), 名单规模为界面级 (数十至数百)
// ==========================================

use crate::domain::member::{Member, SlotId};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// 两个时段集合的 Jaccard 指数, 任一为空时为 0.0
pub fn jaccard(a: &BTreeSet<SlotId>, b: &BTreeSet<SlotId>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

// ==========================================
// CompatibilityMatrix - 兼容度矩阵
// ==========================================
// 键为无序对 (小ID, 大ID); 自身恒为 1.0; 缺失对为 0.0
#[derive(Debug, Clone, Default)]
pub struct CompatibilityMatrix {
    scores: HashMap<(i64, i64), f64>,
}

impl CompatibilityMatrix {
    fn key(a: i64, b: i64) -> (i64, i64) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// 计算名单内所有无序对的兼容度
    pub fn build(roster: &[Member]) -> Self {
        let mut scores = HashMap::new();

        for (i, u) in roster.iter().enumerate() {
            for v in &roster[i + 1..] {
                if u.id == v.id {
                    continue;
                }
                let score = jaccard(&u.availability_slots, &v.availability_slots);
                scores.insert(Self::key(u.id, v.id), score);
            }
        }

        debug!(members = roster.len(), pairs = scores.len(), "兼容度矩阵计算完成");
        Self { scores }
    }

    /// 查询两成员的兼容度
    pub fn get(&self, a: i64, b: i64) -> f64 {
        if a == b {
            return 1.0;
        }
        self.scores.get(&Self::key(a, b)).copied().unwrap_or(0.0)
    }

    /// 成员与组内现有成员的平均兼容度, 空组为 1.0
    pub fn average_with(&self, member_id: i64, group: &[&Member]) -> f64 {
        if group.is_empty() {
            return 1.0;
        }
        let total: f64 = group.iter().map(|m| self.get(member_id, m.id)).sum();
        total / group.len() as f64
    }

    /// 组内两两平均兼容度, 成员数 <= 1 时为 1.0
    pub fn group_average(&self, group: &[&Member]) -> f64 {
        if group.len() <= 1 {
            return 1.0;
        }

        let mut total = 0.0;
        let mut pairs = 0usize;
        for (i, a) in group.iter().enumerate() {
            for b in &group[i + 1..] {
                total += self.get(a.id, b.id);
                pairs += 1;
            }
        }

        if pairs == 0 {
            0.0
        } else {
            total / pairs as f64
        }
    }

    pub fn pair_count(&self) -> usize {
        self.scores.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: i64, slots: &[(u8, f64)]) -> Member {
        let availability_slots: BTreeSet<SlotId> =
            slots.iter().map(|(d, h)| SlotId::from_hour(*d, *h)).collect();
        Member {
            id,
            member_id: id,
            name: format!("user{}", id),
            email: format!("user{}@example.com", id),
            categories: BTreeSet::new(),
            availability_count: availability_slots.len(),
            availability_slots,
        }
    }

    #[test]
    fn test_jaccard_overlap() {
        let a = member(1, &[(0, 9.0), (0, 10.0), (1, 9.0)]);
        let b = member(2, &[(0, 10.0), (1, 9.0), (2, 9.0), (3, 9.0)]);
        // 交集 2, 并集 5
        assert!((jaccard(&a.availability_slots, &b.availability_slots) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_matrix_symmetric_and_self_one() {
        let roster = vec![
            member(1, &[(0, 9.0), (0, 10.0)]),
            member(2, &[(0, 10.0)]),
            member(3, &[(4, 18.0)]),
        ];
        let matrix = CompatibilityMatrix::build(&roster);

        assert_eq!(matrix.pair_count(), 3);
        for a in &roster {
            assert_eq!(matrix.get(a.id, a.id), 1.0);
            for b in &roster {
                assert_eq!(matrix.get(a.id, b.id), matrix.get(b.id, a.id));
            }
        }
        assert!((matrix.get(1, 2) - 0.5).abs() < 1e-9);
        assert_eq!(matrix.get(1, 3), 0.0);
    }

    #[test]
    fn test_empty_availability_is_zero() {
        let roster = vec![member(1, &[]), member(2, &[(0, 9.0)]), member(3, &[])];
        let matrix = CompatibilityMatrix::build(&roster);
        assert_eq!(matrix.get(1, 2), 0.0);
        assert_eq!(matrix.get(1, 3), 0.0);
        // 自身仍为 1.0
        assert_eq!(matrix.get(1, 1), 1.0);
    }

    #[test]
    fn test_unknown_pair_is_zero() {
        let matrix = CompatibilityMatrix::build(&[member(1, &[(0, 9.0)])]);
        assert_eq!(matrix.get(1, 99), 0.0);
    }

    #[test]
    fn test_group_average() {
        let roster = vec![
            member(1, &[(0, 9.0)]),
            member(2, &[(0, 9.0)]),
            member(3, &[(1, 9.0)]),
        ];
        let matrix = CompatibilityMatrix::build(&roster);
        let refs: Vec<&Member> = roster.iter().collect();

        // 三对: 1.0, 0.0, 0.0
        assert!((matrix.group_average(&refs) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(matrix.group_average(&refs[..1]), 1.0);
        assert_eq!(matrix.group_average(&[]), 1.0);

        assert_eq!(matrix.average_with(1, &[]), 1.0);
        assert!((matrix.average_with(1, &refs[1..]) - 0.5).abs() < 1e-9);
    }
}
