// ==========================================
// 子组划分系统 - 领域模型层
// ==========================================
// 职责: 定义成员、规则、预览、划分任务等实体
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod division;
pub mod member;
pub mod preview;
pub mod rule;
pub mod types;

// 重导出核心类型
pub use division::{DivisionJob, SubGroup, SubGroupMember, SubGroupMeta};
pub use member::{Member, MemberRecord, PreviewMember, SlotId};
pub use preview::{Preview, PreviewGroup};
pub use rule::{Condition, ConditionStatus, Rule};
pub use types::{JobStatus, Operator};
