// ==========================================
// 子组划分系统 - 类别规则模型
// ==========================================
// Rule = 有序 Condition 列表
// 匹配按规则整体判断, 上下限约束与报告按展开后的单个条件进行
// ==========================================

use crate::domain::types::Operator;
use serde::{Deserialize, Serialize};

// ==========================================
// Condition - 类别条件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub categories: Vec<String>,

    #[serde(default)]
    pub operator: Operator,

    #[serde(default)]
    pub min: u32,

    /// None 表示无上限
    #[serde(default)]
    pub max: Option<u32>,
}

impl Condition {
    pub fn new(categories: &[&str], operator: Operator) -> Self {
        Self {
            categories: categories.iter().map(|c| c.to_string()).collect(),
            operator,
            min: 0,
            max: None,
        }
    }

    pub fn with_min(mut self, min: u32) -> Self {
        self.min = min;
        self
    }

    pub fn with_max(mut self, max: u32) -> Self {
        self.max = Some(max);
        self
    }

    /// count 是否在 [min, max] 内
    pub fn is_within_bounds(&self, count: usize) -> bool {
        count >= self.min as usize && !self.exceeds_max(count)
    }

    /// count 是否超过上限 (无上限时恒为 false)
    pub fn exceeds_max(&self, count: usize) -> bool {
        matches!(self.max, Some(max) if count > max as usize)
    }
}

// ==========================================
// Rule - 类别规则
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Rule {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }
}

// ==========================================
// ConditionStatus - 单个条件在某组内的满足情况
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionStatus {
    /// 展开后的条件序号 (从 1 开始)
    pub rule: usize,
    pub fulfilled: bool,
    pub count: usize,
    pub min: u32,
    pub max: Option<u32>,
    pub categories: Vec<String>,
    pub operator: Operator,
}
