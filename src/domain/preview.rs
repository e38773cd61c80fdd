// ==========================================
// 子组划分系统 - 划分预览模型
// ==========================================
// 一次划分运行的未落库结果, 可供后续确认
// ==========================================

use crate::domain::member::PreviewMember;
use crate::domain::rule::ConditionStatus;
use serde::{Deserialize, Serialize};

// ==========================================
// PreviewGroup - 预览子组
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewGroup {
    pub id: String,
    pub name: String,
    pub members: Vec<PreviewMember>,
    pub compatibility_avg: f64,
    pub rules_status: Vec<ConditionStatus>,
}

impl PreviewGroup {
    pub fn contains(&self, user_id: i64) -> bool {
        self.members.iter().any(|m| m.id == user_id)
    }
}

// ==========================================
// Preview - 划分预览
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    pub groups: Vec<PreviewGroup>,

    /// 任一子组中未满足的条件序号 (升序, 从 1 开始)
    pub unfulfilled_rules: Vec<usize>,

    pub total_members_assigned: usize,
    pub total_members_available: usize,
}

impl Preview {
    /// 覆盖率 (已分配 / 可用), 空名单时为 1.0
    pub fn coverage(&self) -> f64 {
        if self.total_members_available == 0 {
            return 1.0;
        }
        self.total_members_assigned as f64 / self.total_members_available as f64
    }
}
