// ==========================================
// 子组划分系统 - 划分配置
// ==========================================
// 职责: 划分请求的声明式配置 + 计算前校验
// 红线: 配置错误必须在任何计算开始前拒绝
// ==========================================

use crate::domain::rule::Rule;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("配置格式错误: {0}")]
    Malformed(String),

    #[error("子组数量无效: num_groups={0}, 必须 >= 1")]
    InvalidNumGroups(usize),

    #[error("子组人数上限无效: max_group_size={0}, 必须 >= 1")]
    InvalidMaxGroupSize(usize),

    #[error("兼容度阈值无效: {0}, 必须在 [0.0, 1.0] 范围内")]
    InvalidThreshold(f64),

    #[error("规则 {rule} 的条件 {condition} 无效: {reason}")]
    InvalidCondition {
        rule: usize,
        condition: usize,
        reason: String,
    },
}

fn default_require_all_members() -> bool {
    true
}

// ==========================================
// DivisionConfig - 划分配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionConfig {
    pub num_groups: usize,

    #[serde(default)]
    pub max_group_size: Option<usize>,

    #[serde(default)]
    pub allow_multiple_membership: bool,

    #[serde(default = "default_require_all_members")]
    pub require_all_members: bool,

    #[serde(default)]
    pub compatibility_threshold: f64,

    #[serde(default)]
    pub category_rules: Vec<Rule>,
}

impl DivisionConfig {
    /// 以默认选项创建配置
    pub fn new(num_groups: usize) -> Self {
        Self {
            num_groups,
            max_group_size: None,
            allow_multiple_membership: false,
            require_all_members: true,
            compatibility_threshold: 0.0,
            category_rules: Vec::new(),
        }
    }

    pub fn with_max_group_size(mut self, max_group_size: usize) -> Self {
        self.max_group_size = Some(max_group_size);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.compatibility_threshold = threshold;
        self
    }

    pub fn with_require_all_members(mut self, require_all: bool) -> Self {
        self.require_all_members = require_all;
        self
    }

    pub fn with_multiple_membership(mut self, allow: bool) -> Self {
        self.allow_multiple_membership = allow;
        self
    }

    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.category_rules = rules;
        self
    }

    /// 从 JSON 解析并校验
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: DivisionConfig =
            serde_json::from_str(raw).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    ///
    /// # 校验规则
    /// 1. num_groups >= 1
    /// 2. max_group_size (若配置) >= 1
    /// 3. compatibility_threshold 在 [0.0, 1.0] 内且为有限数
    /// 4. 每个条件至少有一个非空类别
    ///
    /// 未识别的运算符不算配置错误, 评估时视为不匹配;
    /// min > max 的条件无法满足, 由划分结果的 unfulfilled_rules 报告
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_groups < 1 {
            warn!(num_groups = self.num_groups, "子组数量无效");
            return Err(ConfigError::InvalidNumGroups(self.num_groups));
        }

        if let Some(size) = self.max_group_size {
            if size < 1 {
                warn!(max_group_size = size, "子组人数上限无效");
                return Err(ConfigError::InvalidMaxGroupSize(size));
            }
        }

        let threshold = self.compatibility_threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            warn!(threshold = threshold, "兼容度阈值超出有效范围");
            return Err(ConfigError::InvalidThreshold(threshold));
        }

        for (rule_idx, rule) in self.category_rules.iter().enumerate() {
            for (cond_idx, condition) in rule.conditions.iter().enumerate() {
                let invalid = |reason: &str| ConfigError::InvalidCondition {
                    rule: rule_idx + 1,
                    condition: cond_idx + 1,
                    reason: reason.to_string(),
                };

                if condition.categories.is_empty() {
                    return Err(invalid("类别列表不能为空"));
                }
                if condition.categories.iter().any(|c| c.trim().is_empty()) {
                    return Err(invalid("类别名称不能为空"));
                }
            }
        }

        Ok(())
    }

    /// 展开后的条件总数
    pub fn condition_count(&self) -> usize {
        self.category_rules.iter().map(|r| r.conditions.len()).sum()
    }
}
