// ==========================================
// 子组划分系统 - 划分任务与子组实体
// ==========================================
// 对齐: division_jobs / subgroups / subgroup_members 表
// ==========================================

use crate::config::DivisionConfig;
use crate::domain::preview::Preview;
use crate::domain::rule::ConditionStatus;
use crate::domain::types::JobStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// DivisionJob - 划分任务
// ==========================================
// 生成预览时以 pending 创建, 确认后 confirmed, 撤销后 undone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivisionJob {
    pub id: i64,
    pub parent_group_id: i64,
    pub created_by: Option<i64>,
    pub config: DivisionConfig,
    pub result: Option<Preview>,
    pub status: JobStatus,
    pub timestamp: DateTime<Utc>,
}

// ==========================================
// SubGroupMeta - 子组元数据 (JSON 存储)
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubGroupMeta {
    pub compatibility_avg: f64,
    #[serde(default)]
    pub rules_status: Vec<ConditionStatus>,
}

// ==========================================
// SubGroup - 已确认的子组
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubGroup {
    pub id: i64,
    pub parent_group_id: i64,
    pub name: String,
    pub auto_generated: bool,
    pub meta: SubGroupMeta,
    pub created_at: DateTime<Utc>,
    pub member_count: usize,
}

// ==========================================
// SubGroupMember - 子组成员关系
// ==========================================
// 允许多重归属时, 同一用户可出现在多个子组
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubGroupMember {
    pub id: i64,
    pub subgroup_id: i64,
    pub user_id: i64,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub added_at: DateTime<Utc>,
}
