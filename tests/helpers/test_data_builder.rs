// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use std::collections::BTreeSet;
use subgroup_planner::domain::member::{Member, SlotId};
use subgroup_planner::domain::rule::{Condition, Rule};
use subgroup_planner::domain::types::Operator;

// ==========================================
// Member 构建器
// ==========================================

pub struct MemberBuilder {
    id: i64,
    name: Option<String>,
    categories: Vec<String>,
    slots: Vec<(u8, f64)>,
}

impl MemberBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            name: None,
            categories: Vec::new(),
            slots: Vec::new(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.categories.push(category.to_string());
        self
    }

    pub fn slot(mut self, weekday: u8, hour: f64) -> Self {
        self.slots.push((weekday, hour));
        self
    }

    pub fn slots(mut self, slots: &[(u8, f64)]) -> Self {
        self.slots.extend_from_slice(slots);
        self
    }

    pub fn build(self) -> Member {
        let name = self.name.unwrap_or_else(|| format!("member-{}", self.id));
        let availability_slots: BTreeSet<SlotId> = self
            .slots
            .iter()
            .map(|(d, h)| SlotId::from_hour(*d, *h))
            .collect();
        Member {
            id: self.id,
            member_id: 1000 + self.id,
            email: format!("{}@example.com", name),
            name,
            categories: self.categories.into_iter().collect(),
            availability_count: self.slots.len(),
            availability_slots,
        }
    }
}

// ==========================================
// 规则构建
// ==========================================

/// 单条件规则
pub fn single_condition_rule(categories: &[&str], operator: Operator, min: u32, max: Option<u32>) -> Rule {
    let mut condition = Condition::new(categories, operator).with_min(min);
    condition.max = max;
    Rule::new(vec![condition])
}

// ==========================================
// 伪随机名单 (确定性)
// ==========================================

/// 线性同余生成器, 用于生成可复现的测试名单
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    pub fn below(&mut self, bound: u32) -> u32 {
        self.next_u32() % bound
    }
}

/// 生成随机名单: 类别从 A/B/C 中抽取, 时段在一周内的 9-17 点抽取
pub fn random_roster(rng: &mut Lcg, size: usize) -> Vec<Member> {
    const CATEGORIES: [&str; 3] = ["A", "B", "C"];

    (0..size)
        .map(|i| {
            let mut builder = MemberBuilder::new(i as i64 + 1);
            for category in CATEGORIES {
                if rng.below(3) == 0 {
                    builder = builder.category(category);
                }
            }
            for _ in 0..rng.below(6) {
                builder = builder.slot(rng.below(7) as u8, 9.0 + rng.below(9) as f64);
            }
            builder.build()
        })
        .collect()
}
