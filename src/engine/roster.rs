// ==========================================
// 子组划分系统 - 成员名单构建
// ==========================================
// 职责: 将仓储层物化的原始记录组装为不可变的成员名单
// 输入: MemberRecord 列表 (身份 + 类别名称 + 时段)
// 输出: Member 列表, 顺序与输入一致
// ==========================================

use crate::domain::member::{Member, MemberRecord, SlotId};
use std::collections::BTreeSet;
use tracing::debug;

pub struct RosterBuilder {
    // 无状态
}

impl RosterBuilder {
    pub fn new() -> Self {
        Self {}
    }

    /// 组装成员名单
    ///
    /// - 空白类别名称被忽略
    /// - 时段去重后作为 availability_slots
    /// - availability_count 为原始时段记录数
    pub fn build(&self, records: Vec<MemberRecord>) -> Vec<Member> {
        let roster: Vec<Member> = records.into_iter().map(|r| self.build_member(r)).collect();
        debug!(members = roster.len(), "成员名单构建完成");
        roster
    }

    fn build_member(&self, record: MemberRecord) -> Member {
        let categories: BTreeSet<String> = record
            .category_names
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        let availability_count = record.availability.len();
        let availability_slots: BTreeSet<SlotId> = record
            .availability
            .iter()
            .map(|(weekday, hour)| SlotId::from_hour(*weekday, *hour))
            .collect();

        Member {
            id: record.user_id,
            member_id: record.member_id,
            name: record.name,
            email: record.email.unwrap_or_default(),
            categories,
            availability_slots,
            availability_count,
        }
    }
}

impl Default for RosterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
