// ==========================================
// 子组划分系统 - 成员领域模型
// ==========================================
// 成员在一次划分运行内构建一次, 运行期间不可变
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ==========================================
// SlotId - 可预约时间块 (星期 + 时刻)
// ==========================================
// 存储中的 hour 允许小数 (如 9.5 = 09:30),
// 这里换算为当日分钟数, 保证可比较/可哈希
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId {
    pub weekday: u8,
    pub minute_of_day: u16,
}

impl SlotId {
    pub fn new(weekday: u8, minute_of_day: u16) -> Self {
        Self {
            weekday,
            minute_of_day,
        }
    }

    /// 由 (weekday, hour) 构造, hour 为小时数 (可带小数)
    pub fn from_hour(weekday: u8, hour: f64) -> Self {
        let minutes = (hour * 60.0).round().clamp(0.0, u16::MAX as f64) as u16;
        Self::new(weekday, minutes)
    }

    pub fn hour(&self) -> f64 {
        self.minute_of_day as f64 / 60.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.weekday, self.hour())
    }
}

// ==========================================
// Member - 参与划分的成员
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,        // 用户ID (划分中的身份标识)
    pub member_id: i64, // 组成员关系ID
    pub name: String,
    pub email: String,
    pub categories: BTreeSet<String>,
    pub availability_slots: BTreeSet<SlotId>,
    pub availability_count: usize,
}

// ==========================================
// MemberRecord - 成员原始记录
// ==========================================
// 由仓储层从存储中物化, 交给 RosterBuilder 组装
#[derive(Debug, Clone, Default)]
pub struct MemberRecord {
    pub member_id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub category_names: Vec<String>,
    pub availability: Vec<(u8, f64)>, // (weekday, hour)
}

// ==========================================
// PreviewMember - 预览中的成员视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewMember {
    pub id: i64,
    pub member_id: i64,
    pub name: String,
    pub email: String,
    pub categories: Vec<String>,
    pub availability_count: usize,
}

impl From<&Member> for PreviewMember {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id,
            member_id: member.member_id,
            name: member.name.clone(),
            email: member.email.clone(),
            categories: member.categories.iter().cloned().collect(),
            availability_count: member.availability_count,
        }
    }
}
