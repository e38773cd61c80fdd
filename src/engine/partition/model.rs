use crate::domain::member::Member;

// ==========================================
// Partition - 划分结果
// ==========================================
// groups[i] 为第 i 个子组的成员在名单中的下标, 按插入顺序排列;
// 顺序只反映贪心/修复阶段的插入次序, 不具有业务含义
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub groups: Vec<Vec<usize>>,

    /// 未分配成员的名单下标 (仅 require_all_members=false 时可能非空)
    pub unassigned: Vec<usize>,
}

impl Partition {
    /// 创建 n 个空子组
    pub fn with_groups(n: usize) -> Self {
        Self {
            groups: vec![Vec::new(); n],
            unassigned: Vec::new(),
        }
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// 所有子组成员总数 (允许多重归属时按出现次数计)
    pub fn assigned_count(&self) -> usize {
        self.groups.iter().map(|g| g.len()).sum()
    }

    /// 取第 idx 个子组的成员引用
    pub fn members<'a>(&self, roster: &'a [Member], idx: usize) -> Vec<&'a Member> {
        self.groups
            .get(idx)
            .map(|g| g.iter().map(|&i| &roster[i]).collect())
            .unwrap_or_default()
    }

    /// 成员 (名单下标) 所在的子组序号列表
    pub fn groups_of(&self, roster_idx: usize) -> Vec<usize> {
        self.groups
            .iter()
            .enumerate()
            .filter(|(_, g)| g.contains(&roster_idx))
            .map(|(i, _)| i)
            .collect()
    }
}
