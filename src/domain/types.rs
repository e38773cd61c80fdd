// ==========================================
// 子组划分系统 - 领域类型定义
// ==========================================
// 条件运算符 / 划分任务状态
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 条件运算符 (Condition Operator)
// ==========================================
// AND: 成员必须拥有条件中的全部类别
// OR:  成员至少拥有条件中的一个类别
// 未识别的运算符保留原始文本, 评估时一律视为不匹配
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    And,
    Or,
    Unknown(String),
}

impl Default for Operator {
    fn default() -> Self {
        Operator::And
    }
}

impl From<String> for Operator {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "AND" => Operator::And,
            "OR" => Operator::Or,
            _ => Operator::Unknown(raw),
        }
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::And => write!(f, "AND"),
            Operator::Or => write!(f, "OR"),
            Operator::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

// ==========================================
// 划分任务状态 (Division Job Status)
// ==========================================
// 状态机: PENDING -> CONFIRMED -> UNDONE
// UNDONE 为终态; PENDING 不能直接转为 UNDONE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,   // 已生成预览, 未确认
    Confirmed, // 已落库子组
    Undone,    // 已撤销
}

impl JobStatus {
    /// 判断状态转换是否合法
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Confirmed) | (JobStatus::Confirmed, JobStatus::Undone)
        )
    }

    /// 是否为终态
    pub fn is_terminal(self) -> bool {
        self == JobStatus::Undone
    }

    /// 数据库存储值
    pub fn to_db_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Confirmed => "confirmed",
            JobStatus::Undone => "undone",
        }
    }

    /// 从数据库值解析
    pub fn from_db_str(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(JobStatus::Pending),
            "confirmed" => Some(JobStatus::Confirmed),
            "undone" => Some(JobStatus::Undone),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
