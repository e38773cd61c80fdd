// ==========================================
// 子组划分系统 - 子组划分 API
// ==========================================
// 职责: 生成预览、确认落库、撤销、查询与导出
// 流程: 仓储加载名单 -> 引擎划分 -> 仓储持久化
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::export;
use crate::config::{ConfigManager, DivisionConfig};
use crate::domain::division::{DivisionJob, SubGroup, SubGroupMember, SubGroupMeta};
use crate::domain::preview::Preview;
use crate::domain::types::JobStatus;
use crate::engine::{RosterBuilder, SubgroupDivider};
use crate::repository::{
    DivisionJobRepository, MemberRepository, NewSubGroup, SubGroupRepository,
};

// ==========================================
// 响应类型
// ==========================================

/// 生成预览的响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub job_id: i64,
    pub preview: Preview,
}

/// 确认划分的响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmResponse {
    pub job_id: i64,
    pub subgroups: Vec<SubGroup>,
}

/// 撤销划分的响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoResponse {
    pub job_id: i64,
    pub deleted_subgroups: usize,
}

// ==========================================
// SubgroupApi - 子组划分 API
// ==========================================

/// 子组划分API
///
/// 职责：
/// 1. 加载父组名单并调用引擎生成预览 (pending 任务)
/// 2. 确认预览, 落库子组
/// 3. 撤销最近一次确认
/// 4. 查询与 CSV 导出
pub struct SubgroupApi {
    member_repo: Arc<MemberRepository>,
    job_repo: Arc<DivisionJobRepository>,
    subgroup_repo: Arc<SubGroupRepository>,
    config_manager: Arc<ConfigManager>,
}

impl SubgroupApi {
    /// 创建新的SubgroupApi实例
    pub fn new(
        member_repo: Arc<MemberRepository>,
        job_repo: Arc<DivisionJobRepository>,
        subgroup_repo: Arc<SubGroupRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            member_repo,
            job_repo,
            subgroup_repo,
            config_manager,
        }
    }

    /// 生成划分预览
    ///
    /// # 参数
    /// - parent_group_id: 父组ID
    /// - created_by: 发起人用户ID (可选)
    /// - config: 划分配置
    ///
    /// # 返回
    /// - Ok(GenerateResponse): 新建 pending 任务ID + 预览
    /// - Err(ApiError::InvalidInput): 配置无效 (不会创建任务)
    /// - Err(ApiError::NotFound): 父组不存在
    #[instrument(skip(self, config), fields(num_groups = config.num_groups))]
    pub fn generate(
        &self,
        parent_group_id: i64,
        created_by: Option<i64>,
        config: DivisionConfig,
    ) -> ApiResult<GenerateResponse> {
        config
            .validate()
            .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        self.ensure_group(parent_group_id)?;

        let records = self.member_repo.load_roster_records(parent_group_id)?;
        let roster = RosterBuilder::new().build(records);
        if roster.is_empty() {
            warn!(parent_group_id, "父组没有成员, 预览为空");
        }

        let settings = self.config_manager.get_engine_settings()?;
        let outcome = SubgroupDivider::new(settings).divide(&roster, &config)?;

        let job_id = self
            .job_repo
            .create(parent_group_id, created_by, &config, &outcome.preview)?;

        info!(
            job_id,
            parent_group_id,
            groups = outcome.preview.groups.len(),
            unfulfilled = ?outcome.preview.unfulfilled_rules,
            "划分预览已生成"
        );

        Ok(GenerateResponse {
            job_id,
            preview: outcome.preview,
        })
    }

    /// 确认划分预览, 将其落库为自动生成的子组
    ///
    /// # 错误
    /// - 任务不属于该父组: InvalidInput
    /// - 任务非 pending: InvalidStateTransition
    #[instrument(skip(self))]
    pub fn confirm(&self, parent_group_id: i64, job_id: i64) -> ApiResult<ConfirmResponse> {
        let job = self.job_for_group(parent_group_id, job_id)?;

        if job.status != JobStatus::Pending {
            return Err(ApiError::InvalidStateTransition {
                from: job.status.to_string(),
                to: JobStatus::Confirmed.to_string(),
            });
        }

        let preview = job.result.ok_or_else(|| {
            ApiError::ValidationError(format!("任务{}缺少预览结果", job_id))
        })?;

        let new_subgroups: Vec<NewSubGroup> = preview
            .groups
            .iter()
            .map(|group| NewSubGroup {
                name: group.name.clone(),
                meta: SubGroupMeta {
                    compatibility_avg: group.compatibility_avg,
                    rules_status: group.rules_status.clone(),
                },
                user_ids: group.members.iter().map(|m| m.id).collect(),
            })
            .collect();

        let ids = self
            .job_repo
            .confirm_with_subgroups(job_id, parent_group_id, &new_subgroups)?;

        let subgroups = self
            .subgroup_repo
            .list_by_group(parent_group_id)?
            .into_iter()
            .filter(|s| ids.contains(&s.id))
            .collect();

        Ok(ConfirmResponse { job_id, subgroups })
    }

    /// 撤销父组最近一次已确认的划分
    ///
    /// 删除该父组下所有自动生成的子组, 任务状态置为 undone
    #[instrument(skip(self))]
    pub fn undo(&self, parent_group_id: i64) -> ApiResult<UndoResponse> {
        self.ensure_group(parent_group_id)?;

        let job = self
            .job_repo
            .find_last_confirmed(parent_group_id)?
            .ok_or_else(|| {
                ApiError::BusinessRuleViolation(format!(
                    "父组{}没有可撤销的已确认划分",
                    parent_group_id
                ))
            })?;

        let deleted_subgroups = self.job_repo.undo_with_subgroups(job.id, parent_group_id)?;

        Ok(UndoResponse {
            job_id: job.id,
            deleted_subgroups,
        })
    }

    /// 查询父组的子组
    pub fn list_subgroups(&self, parent_group_id: i64) -> ApiResult<Vec<SubGroup>> {
        Ok(self.subgroup_repo.list_by_group(parent_group_id)?)
    }

    /// 查询子组成员
    pub fn list_subgroup_members(&self, subgroup_id: i64) -> ApiResult<Vec<SubGroupMember>> {
        Ok(self.subgroup_repo.list_members(subgroup_id)?)
    }

    /// 查询父组的划分任务 (新任务在前)
    pub fn list_jobs(&self, parent_group_id: i64) -> ApiResult<Vec<DivisionJob>> {
        Ok(self.job_repo.list_by_group(parent_group_id)?)
    }

    /// 导出指定任务的预览
    pub fn export_preview_csv(&self, parent_group_id: i64, job_id: i64) -> ApiResult<String> {
        let job = self.job_for_group(parent_group_id, job_id)?;
        let preview = job.result.ok_or_else(|| {
            ApiError::ValidationError(format!("任务{}缺少预览结果", job_id))
        })?;
        export::preview_to_csv(&preview)
    }

    /// 导出父组当前的子组
    pub fn export_subgroups_csv(&self, parent_group_id: i64) -> ApiResult<String> {
        let subgroups = self.subgroup_repo.list_by_group(parent_group_id)?;
        if subgroups.is_empty() {
            return Err(ApiError::BusinessRuleViolation(format!(
                "父组{}没有可导出的子组",
                parent_group_id
            )));
        }

        let mut rows = Vec::with_capacity(subgroups.len());
        for subgroup in subgroups {
            let members = self.subgroup_repo.list_members(subgroup.id)?;
            rows.push((subgroup, members));
        }
        export::subgroups_to_csv(&rows)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn ensure_group(&self, parent_group_id: i64) -> ApiResult<()> {
        if !self.member_repo.group_exists(parent_group_id)? {
            return Err(ApiError::NotFound(format!("Group(id={})不存在", parent_group_id)));
        }
        Ok(())
    }

    /// 读取任务并校验其属于该父组
    fn job_for_group(&self, parent_group_id: i64, job_id: i64) -> ApiResult<DivisionJob> {
        let job = self
            .job_repo
            .find_by_id(job_id)?
            .ok_or_else(|| ApiError::NotFound(format!("DivisionJob(id={})不存在", job_id)))?;

        if job.parent_group_id != parent_group_id {
            return Err(ApiError::InvalidInput(format!(
                "任务{}不属于父组{}",
                job_id, parent_group_id
            )));
        }
        Ok(job)
    }
}
