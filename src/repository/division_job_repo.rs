// ==========================================
// 子组划分系统 - 划分任务仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 状态变更走 JobStatus 状态机, 更新带状态条件 (乐观并发)
// ==========================================

use crate::config::DivisionConfig;
use crate::domain::division::DivisionJob;
use crate::domain::preview::Preview;
use crate::domain::types::JobStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::subgroup_repo::{
    delete_auto_generated_tx, insert_subgroup_tx, parse_timestamp, NewSubGroup,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

const JOB_COLUMNS: &str =
    "id, parent_group_id, created_by, config_json, result_json, status, timestamp";

/// division_jobs 行的原始值
type JobRow = (i64, i64, Option<i64>, String, Option<String>, String, String);

fn read_job_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<JobRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn job_from_row(raw: JobRow) -> RepositoryResult<DivisionJob> {
    let (id, parent_group_id, created_by, config_json, result_json, status, timestamp) = raw;

    let config: DivisionConfig = serde_json::from_str(&config_json)?;
    let result: Option<Preview> = match result_json {
        Some(json) => Some(serde_json::from_str(&json)?),
        None => None,
    };
    let status = JobStatus::from_db_str(&status).ok_or_else(|| RepositoryError::FieldValueError {
        field: "division_jobs.status".to_string(),
        message: format!("未知状态: {}", status),
    })?;

    Ok(DivisionJob {
        id,
        parent_group_id,
        created_by,
        config,
        result,
        status,
        timestamp: parse_timestamp("division_jobs.timestamp", &timestamp)?,
    })
}

/// 在事务内执行带状态检查的状态变更
fn transition_tx(
    tx: &Transaction<'_>,
    job_id: i64,
    from: JobStatus,
    to: JobStatus,
) -> RepositoryResult<()> {
    if !from.can_transition_to(to) {
        return Err(RepositoryError::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    let updated = tx.execute(
        "UPDATE division_jobs SET status = ?1 WHERE id = ?2 AND status = ?3",
        params![to.to_db_str(), job_id, from.to_db_str()],
    )?;

    if updated == 0 {
        // 读取与更新之间状态已被其他请求修改
        warn!(job_id = job_id, from = %from, to = %to, "任务状态已被并发修改");
        return Err(RepositoryError::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    Ok(())
}

// ==========================================
// DivisionJobRepository - 划分任务仓储
// ==========================================
pub struct DivisionJobRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DivisionJobRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 创建 pending 状态的划分任务
    ///
    /// # 返回
    /// 新任务ID
    pub fn create(
        &self,
        parent_group_id: i64,
        created_by: Option<i64>,
        config: &DivisionConfig,
        result: &Preview,
    ) -> RepositoryResult<i64> {
        let config_json = serde_json::to_string(config)?;
        let result_json = serde_json::to_string(result)?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO division_jobs (parent_group_id, created_by, config_json, result_json, status, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                parent_group_id,
                created_by,
                config_json,
                result_json,
                JobStatus::Pending.to_db_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 变更任务状态 (校验状态机)
    pub fn update_status(&self, job_id: i64, next: JobStatus) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let current = Self::status_tx(&tx, job_id)?;
        transition_tx(&tx, job_id, current, next)?;
        tx.commit()?;
        Ok(())
    }

    /// 确认任务: 写入子组 + 状态置为 confirmed (单事务)
    ///
    /// # 返回
    /// 新建子组ID列表
    pub fn confirm_with_subgroups(
        &self,
        job_id: i64,
        parent_group_id: i64,
        subgroups: &[NewSubGroup],
    ) -> RepositoryResult<Vec<i64>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let current = Self::status_tx(&tx, job_id)?;
        transition_tx(&tx, job_id, current, JobStatus::Confirmed)?;

        let now = Utc::now();
        let mut ids = Vec::with_capacity(subgroups.len());
        for subgroup in subgroups {
            ids.push(insert_subgroup_tx(&tx, parent_group_id, subgroup, now)?);
        }

        tx.commit()?;
        info!(
            job_id = job_id,
            parent_group_id = parent_group_id,
            subgroups = ids.len(),
            "划分任务已确认"
        );
        Ok(ids)
    }

    /// 撤销任务: 删除自动生成的子组 + 状态置为 undone (单事务)
    ///
    /// # 返回
    /// 删除的子组数量
    pub fn undo_with_subgroups(&self, job_id: i64, parent_group_id: i64) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let current = Self::status_tx(&tx, job_id)?;
        transition_tx(&tx, job_id, current, JobStatus::Undone)?;
        let deleted = delete_auto_generated_tx(&tx, parent_group_id)?;

        tx.commit()?;
        info!(
            job_id = job_id,
            parent_group_id = parent_group_id,
            deleted = deleted,
            "划分任务已撤销"
        );
        Ok(deleted)
    }

    fn status_tx(tx: &Transaction<'_>, job_id: i64) -> RepositoryResult<JobStatus> {
        let raw: Option<String> = tx
            .query_row(
                "SELECT status FROM division_jobs WHERE id = ?1",
                params![job_id],
                |row| row.get(0),
            )
            .optional()?;

        let raw = raw.ok_or_else(|| RepositoryError::NotFound {
            entity: "DivisionJob".to_string(),
            id: job_id.to_string(),
        })?;

        JobStatus::from_db_str(&raw).ok_or_else(|| RepositoryError::FieldValueError {
            field: "division_jobs.status".to_string(),
            message: format!("未知状态: {}", raw),
        })
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询
    pub fn find_by_id(&self, job_id: i64) -> RepositoryResult<Option<DivisionJob>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM division_jobs WHERE id = ?1", JOB_COLUMNS);
        let raw = conn
            .query_row(&sql, params![job_id], read_job_row)
            .optional()?;
        raw.map(job_from_row).transpose()
    }

    /// 查询父组最近一次已确认的任务
    pub fn find_last_confirmed(&self, parent_group_id: i64) -> RepositoryResult<Option<DivisionJob>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM division_jobs
             WHERE parent_group_id = ?1 AND status = ?2
             ORDER BY timestamp DESC, id DESC
             LIMIT 1",
            JOB_COLUMNS
        );
        let raw = conn
            .query_row(
                &sql,
                params![parent_group_id, JobStatus::Confirmed.to_db_str()],
                read_job_row,
            )
            .optional()?;
        raw.map(job_from_row).transpose()
    }

    /// 查询父组的全部任务 (新任务在前)
    pub fn list_by_group(&self, parent_group_id: i64) -> RepositoryResult<Vec<DivisionJob>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM division_jobs WHERE parent_group_id = ?1 ORDER BY timestamp DESC, id DESC",
            JOB_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![parent_group_id], read_job_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(job_from_row).collect()
    }
}
